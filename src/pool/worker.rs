//! Worker thread implementation

use crate::core::error::panic_message;
use crate::core::{BoxedJob, PoolError, Result};
use crate::pool::worker_pool::PoolShared;
use crate::queue::QueueError;
use crossbeam_utils::CachePadded;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

#[cfg(feature = "tracing")]
use crate::telemetry::metrics::{self, JobOutcome};
#[cfg(feature = "tracing")]
use tracing::{debug, span, Level};

/// Live counters shared by all workers of a pool.
#[derive(Debug, Default)]
pub struct PoolCounters {
    active: CachePadded<AtomicUsize>,
    accepted: CachePadded<AtomicU64>,
    rejected: CachePadded<AtomicU64>,
    completed: CachePadded<AtomicU64>,
    failed: CachePadded<AtomicU64>,
    panicked: CachePadded<AtomicU64>,
}

impl PoolCounters {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_accepted(&self) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the rejection count including this one.
    pub(crate) fn record_rejected(&self) -> u64 {
        self.rejected.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Workers currently executing a job
    pub fn active(&self) -> usize {
        self.active.load(Ordering::Relaxed)
    }

    /// Jobs accepted by the pool
    pub fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    /// Submissions refused by the pool
    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    /// Jobs that returned `Ok`
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    /// Jobs that returned `Err`
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    /// Jobs that panicked
    pub fn panicked(&self) -> u64 {
        self.panicked.load(Ordering::Relaxed)
    }
}

/// A worker thread draining the pool queue.
///
/// Dropping a `Worker` detaches its thread; only [`join`](Worker::join) waits.
#[derive(Debug)]
pub struct Worker {
    id: usize,
    thread: Option<thread::JoinHandle<()>>,
}

// Runs the exit bookkeeping even if the worker loop unwinds.
struct ExitGuard {
    id: usize,
    shared: Arc<PoolShared>,
}

impl Drop for ExitGuard {
    fn drop(&mut self) {
        self.shared.worker_exited(self.id);
    }
}

impl Worker {
    /// Spawns a worker that runs `first_job` and then drains the queue.
    ///
    /// Workers exit once the queue is closed and empty, so queued jobs are
    /// processed before shutdown completes.
    pub(crate) fn spawn(id: usize, first_job: BoxedJob, shared: Arc<PoolShared>) -> Result<Self> {
        let name = format!("{}{}", shared.name_prefix(), id);
        shared.worker_started();

        let worker_shared = Arc::clone(&shared);
        let spawned = thread::Builder::new().name(name.clone()).spawn(move || {
            let guard = ExitGuard {
                id,
                shared: worker_shared,
            };
            Self::run(id, first_job, &guard.shared);
        });

        match spawned {
            Ok(thread) => {
                log::debug!("spawned worker thread {}", name);
                Ok(Self {
                    id,
                    thread: Some(thread),
                })
            }
            Err(e) => {
                shared.worker_spawn_failed();
                Err(PoolError::spawn_with_source(
                    id,
                    format!("cannot start {}", name),
                    e,
                ))
            }
        }
    }

    /// Join the worker thread
    pub fn join(mut self) -> Result<()> {
        if let Some(thread) = self.thread.take() {
            thread
                .join()
                .map_err(|_| PoolError::join(self.id, "Worker panicked"))?;
        }
        Ok(())
    }

    fn run(id: usize, first_job: BoxedJob, shared: &PoolShared) {
        #[cfg(feature = "tracing")]
        let worker_span = span!(Level::DEBUG, "worker", id = id, pool = %shared.identity_str());
        #[cfg(feature = "tracing")]
        let _guard = worker_span.enter();

        #[cfg(feature = "tracing")]
        debug!("worker started");

        Self::execute_job(id, first_job, shared);

        loop {
            match shared.queue().recv_timeout(shared.poll_interval()) {
                Ok(job) => Self::execute_job(id, job, shared),
                Err(QueueError::Empty) => continue,
                Err(_) => break,
            }
        }

        #[cfg(feature = "tracing")]
        debug!("worker shutting down");
    }

    /// Execute a single job with panic protection
    fn execute_job(id: usize, mut job: BoxedJob, shared: &PoolShared) {
        let counters = shared.counters();

        #[cfg(feature = "tracing")]
        let job_span = span!(Level::DEBUG, "job_execution", job_type = job.job_type());
        #[cfg(feature = "tracing")]
        let _job_guard = job_span.enter();
        let _active = counters.active.fetch_add(1, Ordering::Relaxed) + 1;
        #[cfg(feature = "tracing")]
        metrics::record_active(shared.identity_str(), id, _active);
        let start = Instant::now();

        let outcome = catch_unwind(AssertUnwindSafe(|| job.execute()));

        let elapsed = start.elapsed();
        let _active = counters.active.fetch_sub(1, Ordering::Relaxed) - 1;

        match outcome {
            Ok(Ok(())) => {
                counters.completed.fetch_add(1, Ordering::Relaxed);
                #[cfg(feature = "tracing")]
                metrics::record_job_finished(shared.identity_str(), elapsed, JobOutcome::Completed);
            }
            Ok(Err(e)) => {
                counters.failed.fetch_add(1, Ordering::Relaxed);
                log::warn!(
                    "{}: job {} failed after {:?}: {}",
                    shared.identity_str(),
                    job.job_type(),
                    elapsed,
                    e
                );
                #[cfg(feature = "tracing")]
                metrics::record_job_finished(shared.identity_str(), elapsed, JobOutcome::Failed);
            }
            Err(payload) => {
                counters.panicked.fetch_add(1, Ordering::Relaxed);
                log::error!(
                    "{}: job {} panicked on worker {}: {}",
                    shared.identity_str(),
                    job.job_type(),
                    id,
                    panic_message(payload.as_ref())
                );
                #[cfg(feature = "tracing")]
                metrics::record_job_finished(shared.identity_str(), elapsed, JobOutcome::Panicked);
            }
        }

        #[cfg(feature = "tracing")]
        metrics::record_active(shared.identity_str(), id, _active);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        let counters = PoolCounters::new();
        assert_eq!(counters.active(), 0);
        assert_eq!(counters.accepted(), 0);
        assert_eq!(counters.rejected(), 0);
        assert_eq!(counters.completed(), 0);
    }

    #[test]
    fn test_record_rejected_returns_new_total() {
        let counters = PoolCounters::new();
        assert_eq!(counters.record_rejected(), 1);
        assert_eq!(counters.record_rejected(), 2);
        assert_eq!(counters.rejected(), 2);
    }
}
