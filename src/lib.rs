//! A worker-thread pool over OS threads with fixed and cached modes
//!
//! # Features
//! - Bounded FIFO task queue with submission backpressure
//! - Fixed mode: a constant worker count per run cycle
//! - Cached mode: elastic growth under bursts, idle-timeout shrink
//! - Panic-safe task execution with deferred failure delivery
//! - Restartable: `run` / `shut_down` may be cycled
//! - Lock-free `size()` and metrics snapshots

pub mod errors;
pub mod handle;
pub mod model;
pub mod pool;

mod queue;
mod worker;

pub use errors::{PoolError, TaskResult};
pub use handle::TaskHandle;
pub use model::PoolMetrics;
pub use pool::{Config, Mode, ThreadPool};
