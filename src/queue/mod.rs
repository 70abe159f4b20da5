//! Work queue and saturation handling.
//!
//! - [`BoundedQueue`]: fixed-capacity FIFO shared by all workers of a pool
//! - [`SaturationPolicy`]: what happens to a submission the pool refuses

mod bounded;
mod saturation;

pub use bounded::BoundedQueue;
pub use saturation::{RejectionCause, RejectionContext, RejectionHandler, SaturationPolicy};

use crate::core::BoxedJob;

/// Errors that can occur during queue operations.
///
/// Refused offers carry the job back so it can go through the rejection path.
#[derive(Debug)]
pub enum QueueError {
    /// Queue is at capacity
    Full(BoxedJob),
    /// Queue is closed and not accepting new jobs
    Closed(BoxedJob),
    /// Queue is empty
    Empty,
    /// Queue is closed and drained
    Disconnected,
}

impl std::fmt::Display for QueueError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueError::Full(_) => write!(f, "queue is full"),
            QueueError::Closed(_) => write!(f, "queue is closed"),
            QueueError::Empty => write!(f, "queue is empty"),
            QueueError::Disconnected => write!(f, "queue is disconnected"),
        }
    }
}

impl std::error::Error for QueueError {}

/// Result type for queue operations
pub type QueueResult<T> = std::result::Result<T, QueueError>;
