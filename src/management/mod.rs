//! Operational metrics and registration with a management registry.
//!
//! A pool exposes its live counters through the [`PoolMetrics`] trait and hands
//! an `Arc<dyn PoolMetrics>` to a [`ManagementRegistry`] under its
//! [`PoolIdentity`]. The registry keeps the reference until the pool
//! terminates.
//!
//! ```rust
//! # #[cfg(feature = "metrics")]
//! # fn main() -> managed_pool::Result<()> {
//! use managed_pool::prelude::*;
//! use std::sync::Arc;
//!
//! let registry = Arc::new(InMemoryRegistry::new());
//! let pool = WorkerPool::new(
//!     WorkerPoolConfig::new(2, 10)
//!         .with_instance_name("reports")
//!         .with_registry(registry.clone()),
//! )?;
//!
//! let snapshot = registry.snapshot(pool.identity()).expect("registered");
//! assert_eq!(snapshot.active_count, 0);
//!
//! pool.shutdown()?;
//! assert!(registry.is_empty());
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "metrics"))]
//! # fn main() {}
//! ```

mod identity;
#[cfg(feature = "metrics")]
mod registry;

pub use identity::{quote, PoolIdentity, DEFAULT_DOMAIN};
#[cfg(feature = "metrics")]
pub use registry::InMemoryRegistry;

use crate::core::Result;
use crate::pool::PoolState;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

/// Read-only operational view of a pool.
///
/// Counter accessors are single atomic reads and may be called concurrently
/// with submission and execution. After termination the values stay frozen at
/// their last state.
pub trait PoolMetrics: Send + Sync {
    /// Key the pool is registered under
    fn identity(&self) -> &PoolIdentity;

    /// Lifecycle state
    fn state(&self) -> PoolState;

    /// Configured number of workers
    fn pool_size(&self) -> usize;

    /// Configured queue capacity
    fn queue_capacity(&self) -> usize;

    /// Workers currently executing a job
    fn active_count(&self) -> usize;

    /// Cumulative number of accepted jobs (rejected ones excluded)
    fn task_count(&self) -> u64;

    /// `queue_capacity - queued jobs`
    fn remaining_queue_capacity(&self) -> usize;

    /// Cumulative number of refused submissions
    fn rejected_count(&self) -> u64;

    /// Jobs that finished successfully
    fn completed_count(&self) -> u64;

    /// Jobs that returned an error
    fn failed_count(&self) -> u64;

    /// Jobs that panicked
    fn panicked_count(&self) -> u64;

    /// Reads every counter into a snapshot. Fields are read one at a time.
    fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            identity: self.identity().clone(),
            state: self.state(),
            pool_size: self.pool_size(),
            queue_capacity: self.queue_capacity(),
            active_count: self.active_count(),
            task_count: self.task_count(),
            remaining_queue_capacity: self.remaining_queue_capacity(),
            rejected_count: self.rejected_count(),
            completed_count: self.completed_count(),
            failed_count: self.failed_count(),
            panicked_count: self.panicked_count(),
            captured_at: Utc::now(),
        }
    }
}

/// Point-in-time copy of a pool's counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    /// Pool identity
    pub identity: PoolIdentity,
    /// Lifecycle state
    pub state: PoolState,
    /// Configured number of workers
    pub pool_size: usize,
    /// Configured queue capacity
    pub queue_capacity: usize,
    /// Workers executing a job
    pub active_count: usize,
    /// Accepted jobs
    pub task_count: u64,
    /// Free queue slots
    pub remaining_queue_capacity: usize,
    /// Refused submissions
    pub rejected_count: u64,
    /// Jobs that finished successfully
    pub completed_count: u64,
    /// Jobs that returned an error
    pub failed_count: u64,
    /// Jobs that panicked
    pub panicked_count: u64,
    /// When the snapshot was taken
    pub captured_at: DateTime<Utc>,
}

impl MetricsSnapshot {
    /// Jobs waiting in the queue when the snapshot was taken
    pub fn queued(&self) -> usize {
        self.queue_capacity
            .saturating_sub(self.remaining_queue_capacity)
    }
}

/// External registry that exposes pool metrics under their identity.
pub trait ManagementRegistry: Send + Sync {
    /// Registers a pool under `pool.identity()`.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::DuplicateIdentity`](crate::PoolError::DuplicateIdentity)
    /// when the identity is already taken.
    fn register(&self, pool: Arc<dyn PoolMetrics>) -> Result<()>;

    /// Removes a registration. Returns whether one existed.
    fn unregister(&self, identity: &PoolIdentity) -> bool;
}
