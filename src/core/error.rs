//! Error types for the worker pool

/// Result type for worker pool operations
pub type Result<T> = std::result::Result<T, PoolError>;

/// Errors that can occur in the worker pool
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PoolError {
    /// Invalid configuration with parameter
    #[error("Invalid configuration for '{parameter}': {message}")]
    InvalidConfig {
        /// Configuration parameter name
        parameter: String,
        /// Error message
        message: String,
    },

    /// The queue refused a submission because it was full
    #[error("Worker pool '{identity}' is saturated: {queued}/{capacity} jobs queued")]
    Saturated {
        /// Identity of the pool
        identity: String,
        /// Jobs queued at the time of the refusal
        queued: usize,
        /// Configured queue capacity
        capacity: usize,
    },

    /// The pool no longer accepts submissions
    #[error("Worker pool '{identity}' has been shut down")]
    ShutDown {
        /// Identity of the pool
        identity: String,
    },

    /// Failed to spawn a worker thread with details
    #[error("Failed to spawn worker thread #{thread_id}: {message}")]
    SpawnError {
        /// ID of the thread that failed to spawn
        thread_id: usize,
        /// Error message
        message: String,
        /// Source IO error
        #[source]
        source: Option<std::io::Error>,
    },

    /// Failed to join a worker thread
    #[error("Failed to join worker thread #{thread_id}: {message}")]
    JoinError {
        /// ID of the thread that failed to join
        thread_id: usize,
        /// Error message
        message: String,
    },

    /// Another pool is already registered under this identity
    #[error("Identity '{identity}' is already registered")]
    DuplicateIdentity {
        /// The conflicting identity
        identity: String,
    },

    /// A job panicked while its caller was waiting on it
    #[error("Job panicked: {message}")]
    TaskPanicked {
        /// Panic message
        message: String,
    },

    /// A job was cancelled or dropped before producing a result
    #[error("Job cancelled: {reason}")]
    Cancelled {
        /// Reason for cancellation
        reason: String,
    },

    /// Waiting for a job result timed out
    #[error("Timed out after {timeout_ms}ms")]
    Timeout {
        /// Timeout duration in milliseconds
        timeout_ms: u64,
    },

    /// Settings or snapshot (de)serialization failed
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// General error
    #[error("{0}")]
    Other(String),
}

impl PoolError {
    /// Create an invalid config error
    pub fn invalid_config(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        PoolError::InvalidConfig {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Create a saturated error
    pub fn saturated(identity: impl Into<String>, queued: usize, capacity: usize) -> Self {
        PoolError::Saturated {
            identity: identity.into(),
            queued,
            capacity,
        }
    }

    /// Create a shut down error
    pub fn shut_down(identity: impl Into<String>) -> Self {
        PoolError::ShutDown {
            identity: identity.into(),
        }
    }

    /// Create a spawn error with source
    pub fn spawn_with_source(
        thread_id: usize,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        PoolError::SpawnError {
            thread_id,
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a join error
    pub fn join(thread_id: usize, message: impl Into<String>) -> Self {
        PoolError::JoinError {
            thread_id,
            message: message.into(),
        }
    }

    /// Create a duplicate identity error
    pub fn duplicate_identity(identity: impl Into<String>) -> Self {
        PoolError::DuplicateIdentity {
            identity: identity.into(),
        }
    }

    /// Create a task panicked error
    pub fn task_panicked(message: impl Into<String>) -> Self {
        PoolError::TaskPanicked {
            message: message.into(),
        }
    }

    /// Create a cancelled error
    pub fn cancelled(reason: impl Into<String>) -> Self {
        PoolError::Cancelled {
            reason: reason.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(timeout_ms: u64) -> Self {
        PoolError::Timeout { timeout_ms }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        PoolError::Other(msg.into())
    }

    /// Returns true for errors produced by the rejection path.
    pub fn is_rejection(&self) -> bool {
        matches!(self, PoolError::Saturated { .. } | PoolError::ShutDown { .. })
    }
}

/// Extracts a readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = PoolError::invalid_config("size", "must be greater than 0");
        assert!(matches!(err, PoolError::InvalidConfig { .. }));

        let err = PoolError::saturated("pool", 2, 2);
        assert!(matches!(err, PoolError::Saturated { .. }));
        assert!(err.is_rejection());

        let err = PoolError::task_panicked("boom");
        assert!(!err.is_rejection());
    }

    #[test]
    fn test_error_display() {
        let err = PoolError::saturated("orders", 4, 4);
        assert_eq!(
            err.to_string(),
            "Worker pool 'orders' is saturated: 4/4 jobs queued"
        );

        let err = PoolError::invalid_config("queue_capacity", "must be greater than 0");
        assert_eq!(
            err.to_string(),
            "Invalid configuration for 'queue_capacity': must be greater than 0"
        );

        let err = PoolError::timeout(250);
        assert_eq!(err.to_string(), "Timed out after 250ms");
    }

    #[test]
    fn test_spawn_error_with_source() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = PoolError::spawn_with_source(5, "Cannot create thread", io_err);

        assert!(matches!(err, PoolError::SpawnError { .. }));
        assert!(err.to_string().contains("worker thread #5"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_panic_message_extraction() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("static message");
        assert_eq!(panic_message(payload.as_ref()), "static message");

        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");

        let payload: Box<dyn std::any::Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(payload.as_ref()), "Unknown panic");
    }
}
