use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, trace};

use crate::pool::{Mode, Shared};
use crate::queue::Dequeued;

/// Everything one worker thread needs, captured at spawn time (the
/// copied configuration cannot change while the pool is running).
pub(crate) struct WorkerContext {
    pub(crate) shared: Arc<Shared>,
    pub(crate) id: u64,
    pub(crate) mode: Mode,
    pub(crate) base_threads: usize,
    pub(crate) poll_interval: Duration,
    pub(crate) idle_timeout: Duration,
}

/// Wait for a job, execute it, repeat. Fixed workers park indefinitely;
/// cached workers wake every poll interval and may retire themselves.
pub(crate) fn worker_loop(ctx: WorkerContext) {
    debug!("worker {} started ({:?} mode)", ctx.id, ctx.mode);
    let mut last_activity = Instant::now();
    loop {
        let dequeued = match ctx.mode {
            Mode::Fixed => ctx.shared.queue.pop_blocking(),
            Mode::Cached => ctx.shared.queue.pop_timeout(ctx.poll_interval),
        };
        match dequeued {
            Dequeued::Job(job) => {
                trace!("worker {} picked up a task", ctx.id);
                ctx.shared.running_tasks.fetch_add(1, Ordering::SeqCst);
                // The job never unwinds: panic capture happens inside it.
                job();
                ctx.shared.running_tasks.fetch_sub(1, Ordering::SeqCst);
                last_activity = Instant::now();
            }
            Dequeued::Closed => {
                debug!("worker {} exiting, pool stopped", ctx.id);
                return;
            }
            Dequeued::TimedOut => {
                if !try_retire(&ctx, last_activity) {
                    continue;
                }
                // A submission can slip in between the timed-out wait and
                // the decrement while the growth check still counts this
                // worker as idle; take the slot back if work is pending.
                if !ctx.shared.queue.is_empty_synced() && reclaim_slot(&ctx) {
                    continue;
                }
                // Announce the exit instead of touching the roster from
                // inside the worker; the controller joins us later.
                let _ = ctx.shared.exit_tx.send(ctx.id);
                debug!(
                    "worker {} retired after {:?} idle",
                    ctx.id,
                    last_activity.elapsed()
                );
                return;
            }
        }
    }
}

/// The decrement is the retirement: the count only goes down while above
/// the base, so concurrent retirements cannot undershoot and base workers
/// never pass this gate.
fn try_retire(ctx: &WorkerContext, last_activity: Instant) -> bool {
    if last_activity.elapsed() <= ctx.idle_timeout {
        return false;
    }
    let base = ctx.base_threads;
    ctx.shared
        .thread_count
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |count| {
            (count > base).then(|| count - 1)
        })
        .is_ok()
}

/// Undo a retirement decision, bounded by the cap so a concurrent elastic
/// spawn cannot push the pool past `max_threads`.
fn reclaim_slot(ctx: &WorkerContext) -> bool {
    let max = ctx.shared.max_threads.load(Ordering::SeqCst);
    ctx.shared
        .thread_count
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |count| {
            (count < max).then(|| count + 1)
        })
        .is_ok()
}
