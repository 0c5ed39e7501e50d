use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// A queued unit of work. The user closure is already wrapped with panic
/// capture and result delivery by the time it lands here.
pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;

/// Outcome of a consumer-side dequeue attempt.
pub(crate) enum Dequeued {
    Job(Job),
    /// Cached-mode poll interval elapsed with the queue still empty.
    TimedOut,
    /// The queue is closed and fully drained.
    Closed,
}

struct Inner {
    buf: VecDeque<Job>,
    capacity: usize,
    closed: bool,
}

/// Bounded FIFO of jobs: one mutex, `not_full` for producers, `ready`
/// for consumers, plus a length mirror for lock-free advisory reads.
pub(crate) struct TaskQueue {
    inner: Mutex<Inner>,
    not_full: Condvar,
    ready: Condvar,
    len: AtomicUsize,
}

impl TaskQueue {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                buf: VecDeque::new(),
                capacity,
                closed: false,
            }),
            not_full: Condvar::new(),
            ready: Condvar::new(),
            len: AtomicUsize::new(0),
        }
    }

    /// Lock-free length snapshot.
    pub(crate) fn len(&self) -> usize {
        self.len.load(Ordering::Relaxed)
    }

    /// Emptiness check under the lock, for decisions that must not race
    /// a concurrent push.
    pub(crate) fn is_empty_synced(&self) -> bool {
        self.inner.lock().unwrap().buf.is_empty()
    }

    pub(crate) fn set_capacity(&self, capacity: usize) {
        self.inner.lock().unwrap().capacity = capacity;
    }

    /// Blocks while at capacity, up to `timeout`; on expiry the job is
    /// handed back.
    pub(crate) fn push_timeout(&self, job: Job, timeout: Duration) -> Result<(), Job> {
        let deadline = Instant::now() + timeout;
        let mut inner = self.inner.lock().unwrap();
        while inner.buf.len() >= inner.capacity {
            let now = Instant::now();
            if now >= deadline {
                return Err(job);
            }
            let (guard, wait) = self.not_full.wait_timeout(inner, deadline - now).unwrap();
            inner = guard;
            if wait.timed_out() && inner.buf.len() >= inner.capacity {
                return Err(job);
            }
        }
        inner.buf.push_back(job);
        self.len.store(inner.buf.len(), Ordering::Relaxed);
        drop(inner);
        self.ready.notify_one();
        Ok(())
    }

    /// Parks until a job arrives or the queue is closed and drained.
    pub(crate) fn pop_blocking(&self) -> Dequeued {
        let mut inner = self.inner.lock().unwrap();
        loop {
            if let Some(job) = inner.buf.pop_front() {
                return self.finish_pop(inner, job);
            }
            if inner.closed {
                return Dequeued::Closed;
            }
            inner = self.ready.wait(inner).unwrap();
        }
    }

    /// Like [`Self::pop_blocking`] but wakes every `poll` so the caller
    /// can run its idle check.
    pub(crate) fn pop_timeout(&self, poll: Duration) -> Dequeued {
        let mut inner = self.inner.lock().unwrap();
        loop {
            if let Some(job) = inner.buf.pop_front() {
                return self.finish_pop(inner, job);
            }
            if inner.closed {
                return Dequeued::Closed;
            }
            let (guard, wait) = self.ready.wait_timeout(inner, poll).unwrap();
            inner = guard;
            if wait.timed_out() {
                if let Some(job) = inner.buf.pop_front() {
                    return self.finish_pop(inner, job);
                }
                if inner.closed {
                    return Dequeued::Closed;
                }
                return Dequeued::TimedOut;
            }
        }
    }

    // another consumer is woken only if work remains; producers always,
    // capacity was just freed
    fn finish_pop(&self, inner: MutexGuard<'_, Inner>, job: Job) -> Dequeued {
        self.len.store(inner.buf.len(), Ordering::Relaxed);
        let has_more = !inner.buf.is_empty();
        drop(inner);
        if has_more {
            self.ready.notify_one();
        }
        self.not_full.notify_all();
        Dequeued::Job(job)
    }

    /// Wake everything; consumers drain what is left, then observe
    /// `Closed`. Pushes while closed still land and wait for `reopen`.
    pub(crate) fn close(&self) {
        self.inner.lock().unwrap().closed = true;
        self.ready.notify_all();
        self.not_full.notify_all();
    }

    pub(crate) fn reopen(&self) {
        self.inner.lock().unwrap().closed = false;
    }
}
