/// Point-in-time snapshot of pool activity.
///
/// Every field is read from an atomic without taking the queue lock, so
/// the numbers are advisory: they may be mutually inconsistent under
/// concurrent load.
#[derive(Debug, Clone)]
pub struct PoolMetrics {
    pub live_threads: usize,
    pub active_tasks: usize,
    pub idle_workers: usize,
    pub queued_tasks: usize,
    pub completed_tasks: usize,
    pub failed_tasks: usize,
}

impl PoolMetrics {
    pub fn utilization(&self) -> f64 {
        if self.live_threads == 0 {
            return 0.0;
        }
        self.active_tasks as f64 / self.live_threads as f64
    }

    pub fn queue_pressure(&self) -> f64 {
        self.queued_tasks as f64
    }

    pub fn success_rate(&self) -> f64 {
        let total = self.completed_tasks + self.failed_tasks;
        if total == 0 {
            return 1.0;
        }
        self.completed_tasks as f64 / total as f64
    }
}
