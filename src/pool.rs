use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, Sender};
use log::{debug, error, info, warn};

use crate::errors::{PoolError, TaskResult};
use crate::handle::TaskHandle;
use crate::model::PoolMetrics;
use crate::queue::TaskQueue;
use crate::worker::{worker_loop, WorkerContext};

const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Operating mode of the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// A constant worker count between `run` and `shut_down`.
    #[default]
    Fixed,
    /// Grows beyond the base count under load, shrinks back when idle.
    Cached,
}

/// Pool configuration, resolved once at construction. Host parallelism
/// is sampled here and nowhere else.
#[derive(Debug, Clone)]
pub struct Config {
    /// Minimum worker count while the pool is running.
    pub base_threads: usize,
    /// Bounded queue threshold; submissions block at capacity.
    pub queue_capacity: usize,
    pub mode: Mode,
    /// Upper bound on elastic growth (cached mode only).
    pub max_threads: usize,
    /// How long a submission may wait for queue capacity.
    pub submit_timeout: Duration,
    /// How long an elastic worker may sit idle before retiring.
    pub idle_timeout: Duration,
    /// Wait granularity of cached-mode workers.
    pub poll_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        let parallelism = num_cpus::get();
        Self {
            base_threads: parallelism,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            mode: Mode::Fixed,
            max_threads: parallelism * 2,
            submit_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_secs(1),
        }
    }
}

impl Config {
    /// Fixed pool of exactly `threads` workers.
    pub fn fixed(threads: usize) -> Self {
        Self {
            base_threads: threads,
            mode: Mode::Fixed,
            ..Default::default()
        }
    }

    /// Cached pool floating between `base` and `max` workers.
    pub fn cached(base: usize, max: usize) -> Self {
        Self {
            base_threads: base,
            mode: Mode::Cached,
            max_threads: max,
            ..Default::default()
        }
    }
}

/// State shared between the controller and its workers.
pub(crate) struct Shared {
    pub(crate) queue: TaskQueue,
    pub(crate) running: AtomicBool,
    pub(crate) thread_count: AtomicUsize,
    /// Mirror of `Config::max_threads`, hot-swappable while a cached pool
    /// runs; read lock-free by the growth check and retiring workers.
    pub(crate) max_threads: AtomicUsize,
    pub(crate) running_tasks: AtomicUsize,
    // Arc'd individually so jobs can hold the counters without holding
    // the whole shared state (jobs sit inside the queue the shared state
    // owns; a full Arc there would be a cycle).
    pub(crate) completed_tasks: Arc<AtomicUsize>,
    pub(crate) failed_tasks: Arc<AtomicUsize>,
    /// Elastic workers announce their own exit here; the controller
    /// reaps the matching join handles (see `ThreadPool::reap_retired`).
    pub(crate) exit_tx: Sender<u64>,
}

struct WorkerHandle {
    id: u64,
    handle: JoinHandle<()>,
}

/// A worker-thread pool with a bounded FIFO queue and two operating
/// modes: fixed and cached (elastic).
///
/// All methods take `&self`; wrap the pool in an [`Arc`] to submit from
/// several threads. Dropping the pool shuts it down.
pub struct ThreadPool {
    shared: Arc<Shared>,
    workers: Mutex<Vec<WorkerHandle>>,
    exit_rx: Receiver<u64>,
    config: Mutex<Config>,
    next_worker_id: AtomicU64,
}

impl ThreadPool {
    pub fn new(config: Config) -> Self {
        let (exit_tx, exit_rx) = channel::unbounded();
        let shared = Arc::new(Shared {
            queue: TaskQueue::new(config.queue_capacity),
            running: AtomicBool::new(false),
            thread_count: AtomicUsize::new(0),
            max_threads: AtomicUsize::new(config.max_threads),
            running_tasks: AtomicUsize::new(0),
            completed_tasks: Arc::new(AtomicUsize::new(0)),
            failed_tasks: Arc::new(AtomicUsize::new(0)),
            exit_tx,
        });
        Self {
            shared,
            workers: Mutex::new(Vec::new()),
            exit_rx,
            config: Mutex::new(config),
            next_worker_id: AtomicU64::new(0),
        }
    }

    /// Spawn the base workers. No-op if the pool is already running, so
    /// calling it twice in a row equals calling it once.
    pub fn run(&self) {
        if self.shared.running.swap(true, Ordering::SeqCst) {
            return;
        }
        let config = self.config.lock().unwrap().clone();
        self.shared.queue.reopen();
        self.shared
            .thread_count
            .store(config.base_threads, Ordering::SeqCst);
        let mut workers = self.workers.lock().unwrap();
        for _ in 0..config.base_threads {
            workers.push(self.spawn_worker(&config));
        }
        info!(
            "pool running with {} base workers ({:?} mode)",
            config.base_threads, config.mode
        );
    }

    /// Stop the pool. Queued work is drained first, then every worker is
    /// joined (handles of already-retired elastic workers join
    /// instantly). No-op if not running; also invoked from `Drop`.
    pub fn shut_down(&self) {
        if !self.shared.running.swap(false, Ordering::SeqCst) {
            return;
        }
        self.shared.queue.close();
        let drained: Vec<WorkerHandle> = self.workers.lock().unwrap().drain(..).collect();
        for worker in drained {
            if worker.handle.join().is_err() {
                // jobs capture their own panics; a worker unwinding is a bug
                error!("worker {} panicked", worker.id);
            }
        }
        while self.exit_rx.try_recv().is_ok() {}
        let base = self.config.lock().unwrap().base_threads;
        self.shared.thread_count.store(base, Ordering::SeqCst);
        self.shared.running_tasks.store(0, Ordering::SeqCst);
        info!("pool shut down");
    }

    /// Submit a task, receiving a handle to its eventual result right
    /// away.
    ///
    /// Blocks up to `submit_timeout` while the queue is at capacity; if
    /// the window elapses the task is dropped and the handle resolves to
    /// [`PoolError::QueueTimeout`]. A panicking task body resolves the
    /// handle to [`PoolError::Panicked`] and never harms the worker.
    ///
    /// Submitting while stopped is allowed: the task waits in the queue
    /// for the next `run`.
    pub fn submit<F, T>(&self, f: F) -> TaskHandle<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = channel::bounded::<TaskResult<T>>(1);
        let handle = TaskHandle::new(rx);

        let completed = Arc::clone(&self.shared.completed_tasks);
        let failed = Arc::clone(&self.shared.failed_tasks);
        let result_tx = tx.clone();
        let job = Box::new(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(f))
                .map_err(|payload| PoolError::Panicked(panic_message(payload.as_ref())));
            match &outcome {
                Ok(_) => completed.fetch_add(1, Ordering::Relaxed),
                Err(_) => failed.fetch_add(1, Ordering::Relaxed),
            };
            // the caller may have dropped its handle (fire and forget)
            let _ = result_tx.send(outcome);
        });

        let (submit_timeout, mode) = {
            let config = self.config.lock().unwrap();
            (config.submit_timeout, config.mode)
        };
        if self.shared.queue.push_timeout(job, submit_timeout).is_err() {
            warn!("queue stayed full for {:?}, dropping submission", submit_timeout);
            let _ = tx.send(Err(PoolError::QueueTimeout));
            return handle;
        }

        if mode == Mode::Cached {
            self.reap_retired();
            self.maybe_grow();
        }
        handle
    }

    /// Advisory snapshot of the live worker count. Not synchronized
    /// against concurrent spawns or retirements.
    pub fn size(&self) -> usize {
        self.shared.thread_count.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    pub fn metrics(&self) -> PoolMetrics {
        let live_threads = self.shared.thread_count.load(Ordering::Relaxed);
        let active_tasks = self.shared.running_tasks.load(Ordering::Relaxed);
        PoolMetrics {
            live_threads,
            active_tasks,
            idle_workers: live_threads.saturating_sub(active_tasks),
            queued_tasks: self.shared.queue.len(),
            completed_tasks: self.shared.completed_tasks.load(Ordering::Relaxed),
            failed_tasks: self.shared.failed_tasks.load(Ordering::Relaxed),
        }
    }

    pub fn set_base_threads(&self, count: usize) -> Result<(), PoolError> {
        if self.is_running() {
            return Err(PoolError::ConfigRejected(
                "base thread count is fixed while running",
            ));
        }
        self.config.lock().unwrap().base_threads = count;
        Ok(())
    }

    pub fn set_mode(&self, mode: Mode) -> Result<(), PoolError> {
        if self.is_running() {
            return Err(PoolError::ConfigRejected("mode is fixed while running"));
        }
        self.config.lock().unwrap().mode = mode;
        Ok(())
    }

    pub fn set_queue_capacity(&self, capacity: usize) -> Result<(), PoolError> {
        if self.is_running() {
            return Err(PoolError::ConfigRejected(
                "queue capacity is fixed while running",
            ));
        }
        let mut config = self.config.lock().unwrap();
        config.queue_capacity = capacity;
        self.shared.queue.set_capacity(capacity);
        Ok(())
    }

    /// The only setter accepted while running, and only in cached mode:
    /// the elasticity cap may be raised or lowered on the fly.
    pub fn set_max_threads(&self, count: usize) -> Result<(), PoolError> {
        let mut config = self.config.lock().unwrap();
        if self.is_running() && config.mode != Mode::Cached {
            return Err(PoolError::ConfigRejected(
                "max thread count is fixed while a fixed pool is running",
            ));
        }
        config.max_threads = count;
        self.shared.max_threads.store(count, Ordering::SeqCst);
        Ok(())
    }

    fn spawn_worker(&self, config: &Config) -> WorkerHandle {
        let id = self.next_worker_id.fetch_add(1, Ordering::Relaxed);
        let ctx = WorkerContext {
            shared: Arc::clone(&self.shared),
            id,
            mode: config.mode,
            base_threads: config.base_threads,
            poll_interval: config.poll_interval,
            idle_timeout: config.idle_timeout,
        };
        let handle = thread::Builder::new()
            .name(format!("pool-worker-{id}"))
            .spawn(move || worker_loop(ctx))
            .expect("worker thread spawn failed");
        WorkerHandle { id, handle }
    }

    /// Per-submission elasticity check, no periodic monitor: when pending
    /// tasks outnumber idle workers and the cap allows it, spawn one
    /// elastic worker.
    fn maybe_grow(&self) {
        let max = self.shared.max_threads.load(Ordering::SeqCst);
        let grew = self.shared.thread_count.fetch_update(
            Ordering::SeqCst,
            Ordering::SeqCst,
            |threads| {
                // re-checked inside the update so a racing shut_down
                // cannot be outgrown after it reset the count
                if !self.shared.running.load(Ordering::SeqCst) {
                    return None;
                }
                let busy = self.shared.running_tasks.load(Ordering::SeqCst);
                let idle = threads.saturating_sub(busy);
                (self.shared.queue.len() > idle && threads < max).then(|| threads + 1)
            },
        );
        if grew.is_ok() {
            let config = self.config.lock().unwrap().clone();
            let worker = self.spawn_worker(&config);
            debug!(
                "elastic worker {} spawned, {} live",
                worker.id,
                self.shared.thread_count.load(Ordering::SeqCst)
            );
            self.workers.lock().unwrap().push(worker);
        }
    }

    /// Join workers that announced their own exit, keeping the roster
    /// from accumulating dead handles across long cached-mode runs.
    fn reap_retired(&self) {
        while let Ok(id) = self.exit_rx.try_recv() {
            let retired = {
                let mut workers = self.workers.lock().unwrap();
                workers
                    .iter()
                    .position(|w| w.id == id)
                    .map(|i| workers.swap_remove(i))
            };
            if let Some(worker) = retired {
                let _ = worker.handle.join();
            }
        }
    }
}

impl Default for ThreadPool {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shut_down();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "task panicked".to_string()
    }
}
