use thiserror::Error;

/// Failures a submission or a running task can surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    /// The bounded queue stayed full for the whole submission wait window;
    /// the task was dropped without running.
    #[error("task queue stayed full, submission dropped")]
    QueueTimeout,
    /// The task body panicked. The payload is captured here and delivered
    /// through the handle instead of unwinding a worker.
    #[error("task panicked: {0}")]
    Panicked(String),
    /// A configuration setter was refused because the pool is running.
    #[error("configuration rejected: {0}")]
    ConfigRejected(&'static str),
    /// The task was dropped before it could deliver a result, e.g. the
    /// pool was torn down with the task still queued.
    #[error("result channel closed before a result was delivered")]
    ChannelClosed,
}

/// Result alias carried by [`crate::TaskHandle`].
pub type TaskResult<T> = Result<T, PoolError>;
