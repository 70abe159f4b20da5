//! # Managed Pool
//!
//! A fixed-size worker pool with a bounded queue that counts the work it turns
//! away and reports its live state to a management registry.
//!
//! ## Features
//!
//! - **Worker Pool**: `size` threads started on demand, never more
//! - **Bounded Queue**: FIFO on a crossbeam channel; submission never blocks
//! - **Saturation Policies**: abort, discard, discard-oldest, caller-runs or custom
//! - **Metrics**: active, task, rejected and remaining-capacity counters under a stable identity
//! - **Management Registry**: pools register on construction and unregister on termination
//! - **Graceful Shutdown**: drain-and-join, bounded wait, or immediate with cancellation
//!
//! ## Quick Start
//!
//! ```rust
//! use managed_pool::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let pool = WorkerPool::new(WorkerPoolConfig::new(4, 100))?;
//!
//! for i in 0..10 {
//!     pool.execute(move || {
//!         println!("Job {} executing", i);
//!         Ok(())
//!     })?;
//! }
//!
//! pool.shutdown()?;
//! assert_eq!(pool.task_count(), 10);
//! # Ok(())
//! # }
//! ```
//!
//! ## Saturation
//!
//! Once every worker is busy and the queue is full, a submission is refused.
//! The refusal is always counted; the configured policy decides what the
//! submitter sees.
//!
//! ```rust
//! use managed_pool::prelude::*;
//! use std::sync::mpsc;
//!
//! # fn main() -> Result<()> {
//! let pool = WorkerPool::new(WorkerPoolConfig::new(1, 1))?;
//! let (release, gate) = mpsc::channel::<()>();
//! let (started_tx, started) = mpsc::channel();
//!
//! pool.execute(move || {
//!     started_tx.send(()).ok();
//!     gate.recv().ok();
//!     Ok(())
//! })?;
//! started.recv().ok();
//! pool.execute(|| Ok(()))?;
//!
//! match pool.execute(|| Ok(())) {
//!     Err(PoolError::Saturated { queued, capacity, .. }) => assert_eq!(queued, capacity),
//!     other => panic!("expected saturation, got {:?}", other),
//! }
//! assert_eq!(pool.rejected_count(), 1);
//!
//! release.send(()).ok();
//! pool.shutdown()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Custom Jobs
//!
//! ```rust
//! use managed_pool::prelude::*;
//!
//! struct Report {
//!     account: String,
//! }
//!
//! impl Job for Report {
//!     fn execute(&mut self) -> Result<()> {
//!         println!("Building report for {}", self.account);
//!         Ok(())
//!     }
//!
//!     fn job_type(&self) -> &str {
//!         "Report"
//!     }
//! }
//!
//! # fn main() -> Result<()> {
//! # let pool = WorkerPool::new(WorkerPoolConfig::new(2, 8))?;
//! pool.submit(Report {
//!     account: "acme".to_string(),
//! })?;
//! # pool.shutdown()?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod core;
pub mod management;
pub mod pool;
pub mod prelude;
pub mod queue;
#[cfg(feature = "tracing")]
pub mod telemetry;

pub use crate::core::{
    BoxedJob, CancellationReason, CancellationToken, ClosureJob, Job, JobHandle, PoolError, Result,
};
pub use management::{ManagementRegistry, MetricsSnapshot, PoolIdentity, PoolMetrics};
pub use pool::{PoolState, TaskHandle, WorkerPool, WorkerPoolConfig};
pub use queue::SaturationPolicy;
