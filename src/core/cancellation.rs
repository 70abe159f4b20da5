//! Cooperative interruption for running jobs
//!
//! The pool never kills a running job. Instead every pool owns an interrupt
//! [`CancellationToken`]; jobs submitted through
//! [`WorkerPool::submit_interruptible`](crate::pool::WorkerPool::submit_interruptible)
//! receive a child of that token and are expected to poll it.
//! [`WorkerPool::shutdown_now`](crate::pool::WorkerPool::shutdown_now) cancels
//! the pool token, which cancels every child.
//!
//! ```rust
//! use managed_pool::CancellationToken;
//!
//! let parent = CancellationToken::new();
//! let child = parent.child();
//!
//! parent.cancel();
//! assert!(child.is_cancelled());
//! ```

use crate::core::{PoolError, Result};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

static NEXT_JOB_ID: AtomicU64 = AtomicU64::new(1);

fn next_job_id() -> u64 {
    NEXT_JOB_ID.fetch_add(1, Ordering::Relaxed)
}

/// Reason for cancellation
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CancellationReason {
    /// Explicitly cancelled via `cancel()`
    Manual,
    /// Cancelled because the parent token was cancelled
    ParentCancelled,
    /// The owning pool was stopped with `shutdown_now()`
    PoolShutdown,
    /// Custom cancellation reason
    Custom(String),
}

impl std::fmt::Display for CancellationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CancellationReason::Manual => write!(f, "manually cancelled"),
            CancellationReason::ParentCancelled => write!(f, "parent was cancelled"),
            CancellationReason::PoolShutdown => write!(f, "pool shut down"),
            CancellationReason::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

type Callback = Box<dyn FnOnce() + Send + Sync>;

struct TokenInner {
    cancelled: AtomicBool,
    // Weak so that finished jobs' tokens are freed while the pool token lives on.
    children: RwLock<Vec<Weak<TokenInner>>>,
    callbacks: RwLock<Vec<Callback>>,
    reason: RwLock<Option<CancellationReason>>,
}

impl TokenInner {
    fn new() -> Self {
        Self {
            cancelled: AtomicBool::new(false),
            children: RwLock::new(Vec::new()),
            callbacks: RwLock::new(Vec::new()),
            reason: RwLock::new(None),
        }
    }
}

/// A thread-safe cancellation token shared between a job and whoever may
/// interrupt it.
#[derive(Clone)]
pub struct CancellationToken {
    inner: Arc<TokenInner>,
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .field("reason", &self.reason())
            .finish()
    }
}

impl CancellationToken {
    /// Create a new cancellation token (not cancelled)
    pub fn new() -> Self {
        Self {
            inner: Arc::new(TokenInner::new()),
        }
    }

    /// Creates a child token that is cancelled whenever this token is.
    ///
    /// If this token is already cancelled the child starts cancelled.
    pub fn child(&self) -> Self {
        let child = CancellationToken {
            inner: Arc::new(TokenInner::new()),
        };

        {
            let mut children = self.inner.children.write();
            children.retain(|weak| weak.strong_count() > 0);
            children.push(Arc::downgrade(&child.inner));
        }

        if self.is_cancelled() {
            child.cancel_with_reason(CancellationReason::ParentCancelled);
        }

        child
    }

    /// Cancel this token with the `Manual` reason
    pub fn cancel(&self) {
        self.cancel_with_reason(CancellationReason::Manual);
    }

    /// Cancel this token and all of its children.
    ///
    /// Only the first call records a reason and runs callbacks.
    pub fn cancel_with_reason(&self, reason: CancellationReason) {
        {
            // Readers of `reason` block until it is set.
            let mut slot = self.inner.reason.write();
            if self.inner.cancelled.swap(true, Ordering::SeqCst) {
                return;
            }
            *slot = Some(reason);
        }

        let callbacks: Vec<_> = self.inner.callbacks.write().drain(..).collect();
        for callback in callbacks {
            callback();
        }

        let children: Vec<_> = self
            .inner
            .children
            .write()
            .drain(..)
            .filter_map(|weak| weak.upgrade())
            .collect();
        for inner in children {
            CancellationToken { inner }.cancel_with_reason(CancellationReason::ParentCancelled);
        }
    }

    /// Check if this token has been cancelled
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Returns the cancellation reason, if cancelled
    pub fn reason(&self) -> Option<CancellationReason> {
        self.inner.reason.read().clone()
    }

    /// Returns `Err(PoolError::Cancelled)` once cancelled, for use with `?`
    /// inside job bodies.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            let reason = self
                .reason()
                .map(|r| r.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            Err(PoolError::cancelled(reason))
        } else {
            Ok(())
        }
    }

    /// Registers a callback to run on cancellation. Runs immediately if the
    /// token is already cancelled.
    pub fn on_cancel<F>(&self, callback: F)
    where
        F: FnOnce() + Send + Sync + 'static,
    {
        if self.is_cancelled() {
            callback();
            return;
        }
        let mut callbacks = self.inner.callbacks.write();
        // Re-check under the lock; cancel_with_reason drains after setting the flag.
        if self.is_cancelled() {
            drop(callbacks);
            callback();
        } else {
            callbacks.push(Box::new(callback));
        }
    }

    #[cfg(test)]
    fn live_children(&self) -> usize {
        self.inner
            .children
            .read()
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle returned by `submit_interruptible`, used to interrupt one job.
#[derive(Debug, Clone)]
pub struct JobHandle {
    job_id: u64,
    token: CancellationToken,
}

impl JobHandle {
    pub(crate) fn new(token: CancellationToken) -> Self {
        Self {
            job_id: next_job_id(),
            token,
        }
    }

    /// Process-unique id of the job
    pub fn job_id(&self) -> u64 {
        self.job_id
    }

    /// The token handed to the job
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Request interruption of the job
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether interruption was requested, directly or through the pool
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}
