//! Convenient re-exports for common types and traits

pub use crate::core::{
    BoxedJob, CancellationReason, CancellationToken, ClosureJob, Job, JobHandle, PoolError, Result,
};
#[cfg(feature = "metrics")]
pub use crate::management::InMemoryRegistry;
pub use crate::management::{ManagementRegistry, MetricsSnapshot, PoolIdentity, PoolMetrics};
pub use crate::pool::{PoolSettings, PoolState, TaskHandle, WorkerPool, WorkerPoolConfig};
pub use crate::queue::{RejectionContext, RejectionHandler, SaturationPolicy};
