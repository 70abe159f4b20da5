//! Worker pool and worker implementations

pub mod config;
mod handle;
pub mod worker;
mod worker_pool;

pub use config::{PolicyKind, PoolSettings, ResolvedNames, WorkerPoolConfig, DEFAULT_POLL_INTERVAL};
pub use handle::TaskHandle;
pub use worker::{PoolCounters, Worker};
pub use worker_pool::{PoolState, WorkerPool};
