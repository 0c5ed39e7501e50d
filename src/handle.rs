use crossbeam::channel::{Receiver, RecvTimeoutError, TryRecvError};
use std::time::Duration;

use crate::errors::{PoolError, TaskResult};

/// Handle to the eventual result of one submitted task.
///
/// The first value received is cached, so the handle can be read any
/// number of times after completion. A task dropped without ever running
/// resolves to [`PoolError::ChannelClosed`].
pub struct TaskHandle<T> {
    rx: Receiver<TaskResult<T>>,
    result: Option<TaskResult<T>>,
}

impl<T> TaskHandle<T> {
    pub(crate) fn new(rx: Receiver<TaskResult<T>>) -> Self {
        Self { rx, result: None }
    }

    /// Block until the task has delivered a value or a failure.
    pub fn wait(&mut self) -> &TaskResult<T> {
        let rx = &self.rx;
        self.result
            .get_or_insert_with(|| rx.recv().unwrap_or(Err(PoolError::ChannelClosed)))
    }

    /// Non-blocking probe; `None` while the task is still pending.
    pub fn try_wait(&mut self) -> Option<&TaskResult<T>> {
        if self.result.is_none() {
            match self.rx.try_recv() {
                Ok(received) => self.result = Some(received),
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Disconnected) => {
                    self.result = Some(Err(PoolError::ChannelClosed))
                }
            }
        }
        self.result.as_ref()
    }

    /// Block up to `timeout`; `None` if the task is still pending then.
    pub fn wait_timeout(&mut self, timeout: Duration) -> Option<&TaskResult<T>> {
        if self.result.is_none() {
            match self.rx.recv_timeout(timeout) {
                Ok(received) => self.result = Some(received),
                Err(RecvTimeoutError::Timeout) => return None,
                Err(RecvTimeoutError::Disconnected) => {
                    self.result = Some(Err(PoolError::ChannelClosed))
                }
            }
        }
        self.result.as_ref()
    }

    /// Consume the handle, yielding the result by value.
    pub fn into_result(self) -> TaskResult<T> {
        match self.result {
            Some(result) => result,
            None => self.rx.recv().unwrap_or(Err(PoolError::ChannelClosed)),
        }
    }
}
