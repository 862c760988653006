//! Bounded worker pool.
//!
//! At most `max_workers` jobs run at once regardless of wave size. Callers
//! over the limit suspend on the semaphore's FIFO waiter queue; saturation
//! is therefore never surfaced as an error. The active counter comes back
//! down on success and failure alike.

use crate::worker::{Worker, WorkerJob, WorkerOutput};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;

/// Execution counters. The average is a running mean over all settled jobs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoolStats {
    pub total_executed: u64,
    pub total_failed: u64,
    pub avg_duration_ms: f64,
}

pub struct WorkerPool {
    worker: Arc<dyn Worker>,
    semaphore: Arc<Semaphore>,
    max_workers: usize,
    active: AtomicUsize,
    stats: Mutex<PoolStats>,
}

impl WorkerPool {
    pub fn new(worker: Arc<dyn Worker>, max_workers: usize) -> Self {
        Self {
            worker,
            semaphore: Arc::new(Semaphore::new(max_workers)),
            max_workers,
            active: AtomicUsize::new(0),
            stats: Mutex::new(PoolStats::default()),
        }
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    pub fn active_workers(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> PoolStats {
        self.stats.lock().clone()
    }

    /// Run one job, waiting for a slot if the pool is saturated. Waiters
    /// resume in FIFO order (the tokio semaphore is fair).
    pub async fn execute(&self, job: WorkerJob) -> anyhow::Result<WorkerOutput> {
        let permit = self
            .semaphore
            .acquire()
            .await
            .expect("pool semaphore never closed");
        self.active.fetch_add(1, Ordering::SeqCst);

        let started = Instant::now();
        let result = self.worker.execute(&job).await;
        let duration_ms = started.elapsed().as_millis() as f64;

        self.active.fetch_sub(1, Ordering::SeqCst);
        drop(permit);

        let mut stats = self.stats.lock();
        stats.total_executed += 1;
        if result.is_err() {
            stats.total_failed += 1;
        }
        let n = stats.total_executed as f64;
        stats.avg_duration_ms = (stats.avg_duration_ms * (n - 1.0) + duration_ms) / n;

        result
    }
}
