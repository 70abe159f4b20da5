//! Bounded FIFO work queue.

use super::{QueueError, QueueResult};
use crate::core::BoxedJob;
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender, TryRecvError, TrySendError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// A bounded FIFO queue with a capacity fixed at construction.
///
/// Offers never block: a full queue hands the job back in
/// [`QueueError::Full`] so the caller can run its rejection path.
///
/// # Example
///
/// ```rust
/// use managed_pool::queue::{BoundedQueue, QueueError};
/// use managed_pool::ClosureJob;
///
/// let queue = BoundedQueue::new(1);
/// queue.try_send(Box::new(ClosureJob::new(|| Ok(())))).unwrap();
///
/// match queue.try_send(Box::new(ClosureJob::new(|| Ok(())))) {
///     Err(QueueError::Full(_job)) => assert_eq!(queue.remaining_capacity(), 0),
///     _ => panic!("expected Full error"),
/// }
/// ```
pub struct BoundedQueue {
    sender: Sender<BoxedJob>,
    receiver: Receiver<BoxedJob>,
    capacity: usize,
    closed: AtomicBool,
}

impl BoundedQueue {
    /// Creates a new bounded queue with the specified capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0. Pool configuration rejects a zero capacity
    /// before a queue is ever built.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be greater than 0");
        let (sender, receiver) = channel::bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
            closed: AtomicBool::new(false),
        }
    }

    /// Returns the maximum capacity of this queue.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of further jobs the queue accepts right now.
    pub fn remaining_capacity(&self) -> usize {
        self.capacity.saturating_sub(self.len())
    }

    /// Offers a job without blocking.
    pub fn try_send(&self, job: BoxedJob) -> QueueResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(QueueError::Closed(job));
        }
        self.sender.try_send(job).map_err(|e| match e {
            TrySendError::Full(job) => QueueError::Full(job),
            TrySendError::Disconnected(job) => QueueError::Closed(job),
        })
    }

    /// Removes the job at the head of the queue, if any.
    pub fn try_recv(&self) -> QueueResult<BoxedJob> {
        self.receiver.try_recv().map_err(|e| match e {
            TryRecvError::Empty => QueueError::Empty,
            TryRecvError::Disconnected => QueueError::Disconnected,
        })
    }

    /// Waits up to `timeout` for a job.
    ///
    /// Returns [`QueueError::Disconnected`] once the queue is closed and
    /// drained, which is the signal for workers to exit.
    pub fn recv_timeout(&self, timeout: Duration) -> QueueResult<BoxedJob> {
        if self.closed.load(Ordering::SeqCst) && self.receiver.is_empty() {
            return Err(QueueError::Disconnected);
        }

        match self.receiver.recv_timeout(timeout) {
            Ok(job) => Ok(job),
            Err(RecvTimeoutError::Timeout) => {
                if self.closed.load(Ordering::SeqCst) && self.receiver.is_empty() {
                    Err(QueueError::Disconnected)
                } else {
                    Err(QueueError::Empty)
                }
            }
            Err(RecvTimeoutError::Disconnected) => Err(QueueError::Disconnected),
        }
    }

    /// Removes every queued job without running it.
    pub fn drain(&self) -> Vec<BoxedJob> {
        self.receiver.try_iter().collect()
    }

    /// Stops accepting new jobs; queued jobs stay receivable.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Number of queued jobs.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Whether the queue holds no jobs.
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

impl std::fmt::Debug for BoundedQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedQueue")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}
