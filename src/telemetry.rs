//! Tracing integration, enabled by the `tracing` feature.
//!
//! Workers open a `worker` span per thread and a `job_execution` span per job.
//! The [`metrics`] functions emit trace events with `counter.*`, `gauge.*` and
//! `histogram.*` fields that a metrics layer can aggregate.
//!
//! ```rust,ignore
//! use managed_pool::prelude::*;
//!
//! let span = tracing::info_span!("request", id = 7);
//! let _entered = span.enter();
//!
//! // The job runs inside `request` even though it executes on a worker.
//! pool.submit_traced(ClosureJob::new(|| Ok(())))?;
//! ```

use crate::core::{Job, Result};

/// Runs the wrapped job inside the span that was current at submission.
pub struct TracedJob<J: Job> {
    inner: J,
    span: tracing::Span,
}

impl<J: Job> TracedJob<J> {
    /// Captures the current span
    pub fn new(job: J) -> Self {
        Self::with_span(job, tracing::Span::current())
    }

    /// Uses `span` instead of the current one
    pub fn with_span(job: J, span: tracing::Span) -> Self {
        Self { inner: job, span }
    }
}

impl<J: Job> Job for TracedJob<J> {
    fn execute(&mut self) -> Result<()> {
        let _guard = self.span.enter();
        self.inner.execute()
    }

    fn job_type(&self) -> &str {
        self.inner.job_type()
    }
}

/// Metric events emitted by pools and workers.
pub mod metrics {
    use crate::queue::RejectionCause;
    use std::time::Duration;

    /// How a job ended.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum JobOutcome {
        /// Returned `Ok`
        Completed,
        /// Returned `Err`
        Failed,
        /// Panicked
        Panicked,
    }

    /// Records the end of a job with its duration.
    #[inline]
    pub fn record_job_finished(pool: &str, duration: Duration, outcome: JobOutcome) {
        let duration_ms = duration.as_millis() as u64;
        match outcome {
            JobOutcome::Completed => tracing::trace!(
                counter.jobs_completed = 1,
                histogram.job_duration_ms = duration_ms,
                pool = pool,
                "job completed"
            ),
            JobOutcome::Failed => tracing::trace!(
                counter.jobs_failed = 1,
                histogram.job_duration_ms = duration_ms,
                pool = pool,
                "job failed"
            ),
            JobOutcome::Panicked => tracing::warn!(
                counter.jobs_panicked = 1,
                histogram.job_duration_ms = duration_ms,
                pool = pool,
                "job panicked"
            ),
        }
    }

    /// Records a refused submission.
    #[inline]
    pub fn record_rejection(pool: &str, cause: RejectionCause, rejected_total: u64) {
        tracing::debug!(
            counter.jobs_rejected = 1,
            pool = pool,
            cause = ?cause,
            rejected_total = rejected_total,
            "submission rejected"
        );
    }

    /// Records a change in the number of busy workers.
    #[inline]
    pub fn record_active(pool: &str, worker_id: usize, active: usize) {
        tracing::trace!(
            gauge.workers_active = active as u64,
            pool = pool,
            worker_id = worker_id,
            "active workers changed"
        );
    }

    /// Records pool construction.
    #[inline]
    pub fn record_pool_start(pool: &str, size: usize, queue_capacity: usize) {
        tracing::info!(
            pool = pool,
            size = size,
            queue_capacity = queue_capacity,
            "worker pool created"
        );
    }

    /// Records the start of shutdown.
    #[inline]
    pub fn record_pool_shutdown(pool: &str, queued: usize) {
        tracing::info!(pool = pool, queued = queued, "worker pool shutting down");
    }
}
