//! Saturation policies for refused submissions.
//!
//! A submission is refused when every worker is busy and the queue is full, or
//! when the pool has stopped accepting work. The pool always counts the refusal
//! first, then applies the configured policy:
//!
//! - [`SaturationPolicy::Abort`]: fail the submitter (default)
//! - [`SaturationPolicy::Discard`]: drop the new job silently
//! - [`SaturationPolicy::DiscardOldest`]: drop the oldest queued job and retry
//! - [`SaturationPolicy::CallerRuns`]: run the job on the submitting thread
//! - [`SaturationPolicy::Custom`]: delegate to a [`RejectionHandler`]
//!
//! # Example
//!
//! ```rust
//! use managed_pool::prelude::*;
//!
//! let config = WorkerPoolConfig::new(4, 100)
//!     .with_saturation_policy(SaturationPolicy::CallerRuns);
//! assert!(matches!(config.saturation_policy, SaturationPolicy::CallerRuns));
//! ```

use crate::core::{BoxedJob, PoolError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Strategy applied to a submission the pool refused.
#[derive(Clone, Default)]
pub enum SaturationPolicy {
    /// Return [`PoolError::Saturated`](crate::PoolError::Saturated), or
    /// [`PoolError::ShutDown`](crate::PoolError::ShutDown) once stopped.
    #[default]
    Abort,

    /// Drop the refused job and report success.
    Discard,

    /// Drop the oldest queued job, then offer the new one again.
    /// Once the pool is shut down the new job is dropped instead.
    DiscardOldest,

    /// Run the refused job on the submitting thread.
    /// Once the pool is shut down the job is dropped instead.
    CallerRuns,

    /// Call a user-provided handler.
    Custom(Arc<dyn RejectionHandler>),
}

impl std::fmt::Debug for SaturationPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Abort => write!(f, "Abort"),
            Self::Discard => write!(f, "Discard"),
            Self::DiscardOldest => write!(f, "DiscardOldest"),
            Self::CallerRuns => write!(f, "CallerRuns"),
            Self::Custom(_) => write!(f, "Custom(<handler>)"),
        }
    }
}

impl SaturationPolicy {
    /// Short name used in logs and settings files.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Abort => "abort",
            Self::Discard => "discard",
            Self::DiscardOldest => "discard_oldest",
            Self::CallerRuns => "caller_runs",
            Self::Custom(_) => "custom",
        }
    }
}

/// Why a submission was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionCause {
    /// All workers busy and the queue full
    Saturated,
    /// The pool is shutting down or terminated
    ShutDown,
}

/// Information handed to a [`RejectionHandler`].
#[derive(Debug, Clone)]
pub struct RejectionContext {
    /// Identity of the refusing pool
    pub identity: String,
    /// Why the submission was refused
    pub cause: RejectionCause,
    /// Jobs queued at the time of the refusal
    pub queued: usize,
    /// Configured queue capacity
    pub queue_capacity: usize,
    /// Rejection count including this refusal
    pub rejected_count: u64,
}

impl RejectionContext {
    /// The error an aborting policy reports for this refusal.
    pub fn to_error(&self) -> PoolError {
        match self.cause {
            RejectionCause::Saturated => {
                PoolError::saturated(self.identity.clone(), self.queued, self.queue_capacity)
            }
            RejectionCause::ShutDown => PoolError::shut_down(self.identity.clone()),
        }
    }
}

/// Handler for custom rejection logic.
///
/// # Example
///
/// ```rust
/// use managed_pool::queue::{RejectionContext, RejectionHandler};
/// use managed_pool::{BoxedJob, PoolError, Result};
///
/// struct LogAndFail;
///
/// impl RejectionHandler for LogAndFail {
///     fn handle_rejection(&self, job: BoxedJob, ctx: &RejectionContext) -> Result<Option<BoxedJob>> {
///         drop(job);
///         Err(PoolError::saturated(ctx.identity.clone(), ctx.queued, ctx.queue_capacity))
///     }
/// }
/// ```
pub trait RejectionHandler: Send + Sync {
    /// Called after the refusal has been counted.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(job))` - Offer the (possibly modified) job once more
    /// - `Ok(None)` - Drop the job silently
    /// - `Err(_)` - Propagate error to the submitter
    fn handle_rejection(&self, job: BoxedJob, ctx: &RejectionContext) -> Result<Option<BoxedJob>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_debug_and_name() {
        assert_eq!(format!("{:?}", SaturationPolicy::Abort), "Abort");
        assert_eq!(format!("{:?}", SaturationPolicy::DiscardOldest), "DiscardOldest");
        assert_eq!(SaturationPolicy::CallerRuns.name(), "caller_runs");
        assert_eq!(SaturationPolicy::Discard.name(), "discard");
    }

    #[test]
    fn test_default_policy_is_abort() {
        assert!(matches!(SaturationPolicy::default(), SaturationPolicy::Abort));
    }

    struct DropAll;

    impl RejectionHandler for DropAll {
        fn handle_rejection(&self, _job: BoxedJob, _ctx: &RejectionContext) -> Result<Option<BoxedJob>> {
            Ok(None)
        }
    }

    #[test]
    fn test_custom_policy() {
        let policy = SaturationPolicy::Custom(Arc::new(DropAll));
        assert_eq!(format!("{:?}", policy), "Custom(<handler>)");
        assert_eq!(policy.name(), "custom");
    }

    #[test]
    fn test_context_to_error() {
        let mut ctx = RejectionContext {
            identity: "pool:a".to_string(),
            cause: RejectionCause::Saturated,
            queued: 2,
            queue_capacity: 2,
            rejected_count: 1,
        };
        assert!(matches!(
            ctx.to_error(),
            PoolError::Saturated { queued: 2, capacity: 2, .. }
        ));

        ctx.cause = RejectionCause::ShutDown;
        assert!(matches!(ctx.to_error(), PoolError::ShutDown { .. }));
    }

    #[test]
    fn test_rejection_cause_serde() {
        let json = serde_json::to_string(&RejectionCause::ShutDown).unwrap();
        assert_eq!(json, "\"shut_down\"");
    }
}
