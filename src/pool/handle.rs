//! Result handles for jobs submitted with a return value.

use crate::core::error::panic_message;
use crate::core::{ClosureJob, PoolError, Result};
use crossbeam::channel::{self, Receiver, RecvTimeoutError};
use std::panic::{catch_unwind, resume_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

type Outcome<T> = std::result::Result<T, String>;

/// Receives the value produced by a job submitted through
/// [`WorkerPool::submit_with_result`](super::WorkerPool::submit_with_result).
#[derive(Debug)]
pub struct TaskHandle<T> {
    receiver: Receiver<Outcome<T>>,
    // Set once `join_timeout` has received the outcome.
    taken: AtomicBool,
}

impl<T: Send + 'static> TaskHandle<T> {
    /// Wraps `f` into a job that reports its outcome to the returned handle.
    ///
    /// A panic is reported to the handle and then resumed so the worker
    /// still counts it.
    pub(crate) fn wrap<F>(f: F) -> (ClosureJob<impl FnOnce() -> Result<()> + Send>, Self)
    where
        F: FnOnce() -> T + Send + 'static,
    {
        let (sender, receiver) = channel::bounded(1);
        let job = ClosureJob::with_name(
            move || match catch_unwind(AssertUnwindSafe(f)) {
                Ok(value) => {
                    // The caller may have dropped the handle.
                    let _ = sender.send(Ok(value));
                    Ok(())
                }
                Err(payload) => {
                    let _ = sender.send(Err(panic_message(payload.as_ref())));
                    resume_unwind(payload)
                }
            },
            "ResultJob",
        );
        (
            job,
            Self {
                receiver,
                taken: AtomicBool::new(false),
            },
        )
    }
}

impl<T> TaskHandle<T> {
    /// Blocks until the job has run.
    ///
    /// # Errors
    ///
    /// - [`PoolError::TaskPanicked`] if the job panicked
    /// - [`PoolError::Cancelled`] if the job was dropped without running
    /// - [`PoolError::Other`] if [`join_timeout`](Self::join_timeout) already
    ///   returned the outcome
    pub fn join(self) -> Result<T> {
        if self.taken.load(Ordering::Acquire) {
            return Err(taken());
        }
        match self.receiver.recv() {
            Ok(outcome) => outcome.map_err(PoolError::task_panicked),
            Err(_) => Err(dropped()),
        }
    }

    /// Like [`join`](Self::join) but gives up after `timeout` with
    /// [`PoolError::Timeout`]. Can be retried after a timeout; once the
    /// outcome has been returned later calls fail.
    pub fn join_timeout(&self, timeout: Duration) -> Result<T> {
        if self.taken.load(Ordering::Acquire) {
            return Err(taken());
        }
        match self.receiver.recv_timeout(timeout) {
            Ok(outcome) => {
                self.taken.store(true, Ordering::Release);
                outcome.map_err(PoolError::task_panicked)
            }
            Err(RecvTimeoutError::Timeout) => Err(PoolError::timeout(timeout.as_millis() as u64)),
            Err(RecvTimeoutError::Disconnected) => Err(dropped()),
        }
    }

    /// Whether the job has produced its outcome
    pub fn is_finished(&self) -> bool {
        self.taken.load(Ordering::Acquire) || !self.receiver.is_empty()
    }
}

fn taken() -> PoolError {
    PoolError::other("job outcome was already taken by join_timeout")
}

fn dropped() -> PoolError {
    PoolError::cancelled("job was dropped before it ran")
}
