//! Fixed-size worker pool with a bounded queue and rejection accounting.

use crate::core::error::panic_message;
use crate::core::{
    BoxedJob, CancellationReason, CancellationToken, ClosureJob, Job, JobHandle, PoolError, Result,
};
use crate::management::{ManagementRegistry, PoolIdentity, PoolMetrics};
use crate::pool::config::WorkerPoolConfig;
use crate::pool::handle::TaskHandle;
use crate::pool::worker::{PoolCounters, Worker};
use crate::queue::{BoundedQueue, QueueError, RejectionCause, RejectionContext, SaturationPolicy};
use parking_lot::{Condvar, Mutex, RwLock};
use serde::Serialize;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Lifecycle state of a [`WorkerPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolState {
    /// Accepting and executing jobs
    Running,
    /// No longer accepting jobs; queued and in-flight jobs still run
    ShuttingDown,
    /// Every worker has exited
    Terminated,
}

impl fmt::Display for PoolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolState::Running => write!(f, "running"),
            PoolState::ShuttingDown => write!(f, "shutting down"),
            PoolState::Terminated => write!(f, "terminated"),
        }
    }
}

/// State shared between the pool handle, its workers and the registry.
pub(crate) struct PoolShared {
    identity: PoolIdentity,
    name_prefix: String,
    size: usize,
    poll_interval: Duration,
    queue: BoundedQueue,
    counters: PoolCounters,
    state: RwLock<PoolState>,
    live_workers: AtomicUsize,
    terminated: Mutex<bool>,
    termination: Condvar,
    interrupt: CancellationToken,
    registry: Option<Arc<dyn ManagementRegistry>>,
}

impl PoolShared {
    pub(crate) fn identity_str(&self) -> &str {
        self.identity.as_str()
    }

    pub(crate) fn name_prefix(&self) -> &str {
        &self.name_prefix
    }

    pub(crate) fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub(crate) fn queue(&self) -> &BoundedQueue {
        &self.queue
    }

    pub(crate) fn counters(&self) -> &PoolCounters {
        &self.counters
    }

    pub(crate) fn worker_started(&self) {
        self.live_workers.fetch_add(1, Ordering::AcqRel);
    }

    // Called with the state lock held, so it must not try to terminate.
    pub(crate) fn worker_spawn_failed(&self) {
        self.live_workers.fetch_sub(1, Ordering::AcqRel);
    }

    pub(crate) fn worker_exited(&self, id: usize) {
        let remaining = self.live_workers.fetch_sub(1, Ordering::AcqRel) - 1;
        log::debug!("{}{} exited, {} workers left", self.name_prefix, id, remaining);
        if remaining == 0 {
            self.try_terminate();
        }
    }

    /// Moves `Running` to `ShuttingDown` and closes the queue.
    /// Returns false if shutdown had already begun.
    fn begin_shutdown(&self) -> bool {
        let mut state = self.state.write();
        if *state != PoolState::Running {
            return false;
        }
        *state = PoolState::ShuttingDown;
        self.queue.close();
        drop(state);

        log::info!(
            "{}: shutdown initiated with {} queued jobs",
            self.identity,
            self.queue.len()
        );
        #[cfg(feature = "tracing")]
        crate::telemetry::metrics::record_pool_shutdown(self.identity.as_str(), self.queue.len());
        true
    }

    fn try_terminate(&self) {
        {
            let mut state = self.state.write();
            if *state != PoolState::ShuttingDown || self.live_workers.load(Ordering::Acquire) != 0 {
                return;
            }
            *state = PoolState::Terminated;
        }

        if let Some(registry) = &self.registry {
            registry.unregister(&self.identity);
        }
        log::info!(
            "{}: terminated after {} tasks ({} rejected)",
            self.identity,
            self.counters.accepted(),
            self.counters.rejected()
        );

        *self.terminated.lock() = true;
        self.termination.notify_all();
    }

    /// Waits until terminated; `None` waits forever.
    fn wait_terminated(&self, timeout: Option<Duration>) -> bool {
        let mut terminated = self.terminated.lock();
        match timeout {
            None => {
                while !*terminated {
                    self.termination.wait(&mut terminated);
                }
            }
            Some(timeout) => {
                let Some(deadline) = Instant::now().checked_add(timeout) else {
                    // Too far out to represent; same as waiting forever.
                    while !*terminated {
                        self.termination.wait(&mut terminated);
                    }
                    return true;
                };
                while !*terminated {
                    if self
                        .termination
                        .wait_until(&mut terminated, deadline)
                        .timed_out()
                    {
                        break;
                    }
                }
            }
        }
        *terminated
    }

    fn record_rejection(&self, cause: RejectionCause) -> RejectionContext {
        let rejected_count = self.counters.record_rejected();
        let queued = self.queue.len();
        log::debug!(
            "{}: submission refused ({:?}), {}/{} queued, {} rejected so far",
            self.identity,
            cause,
            queued,
            self.queue.capacity(),
            rejected_count
        );
        #[cfg(feature = "tracing")]
        crate::telemetry::metrics::record_rejection(self.identity.as_str(), cause, rejected_count);

        RejectionContext {
            identity: self.identity.to_string(),
            cause,
            queued,
            queue_capacity: self.queue.capacity(),
            rejected_count,
        }
    }
}

impl PoolMetrics for PoolShared {
    fn identity(&self) -> &PoolIdentity {
        &self.identity
    }

    fn state(&self) -> PoolState {
        *self.state.read()
    }

    fn pool_size(&self) -> usize {
        self.size
    }

    fn queue_capacity(&self) -> usize {
        self.queue.capacity()
    }

    fn active_count(&self) -> usize {
        self.counters.active()
    }

    fn task_count(&self) -> u64 {
        self.counters.accepted()
    }

    fn remaining_queue_capacity(&self) -> usize {
        self.queue.remaining_capacity()
    }

    fn rejected_count(&self) -> u64 {
        self.counters.rejected()
    }

    fn completed_count(&self) -> u64 {
        self.counters.completed()
    }

    fn failed_count(&self) -> u64 {
        self.counters.failed()
    }

    fn panicked_count(&self) -> u64 {
        self.counters.panicked()
    }
}

enum Offer {
    Accepted,
    Refused(BoxedJob, RejectionCause),
}

/// A fixed-size worker pool with a bounded queue.
///
/// Workers are started on demand: each submission starts a new worker, which
/// runs that job first, until `size` workers exist. After that jobs go to the
/// bounded queue, and a submission that finds the queue full is refused,
/// counted and handed to the configured [`SaturationPolicy`].
///
/// # Example
///
/// ```rust
/// use managed_pool::prelude::*;
///
/// # fn main() -> Result<()> {
/// let pool = WorkerPool::new(WorkerPoolConfig::new(2, 16).with_instance_name("docs"))?;
///
/// pool.execute(|| {
///     println!("running on a worker");
///     Ok(())
/// })?;
///
/// let handle = pool.submit_with_result(|| 6 * 7)?;
/// assert_eq!(handle.join()?, 42);
///
/// pool.shutdown()?;
/// assert!(pool.is_terminated());
/// assert_eq!(pool.task_count(), 2);
/// # Ok(())
/// # }
/// ```
pub struct WorkerPool {
    shared: Arc<PoolShared>,
    workers: Mutex<Vec<Worker>>,
    instance_name: String,
    policy: SaturationPolicy,
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("identity", &self.shared.identity)
            .field("state", &self.state())
            .field("size", &self.shared.size)
            .field("queue", &self.shared.queue)
            .field("policy", &self.policy)
            .finish()
    }
}

impl WorkerPool {
    /// Builds a pool and registers it with the configured registry.
    ///
    /// No worker thread is started until the first submission.
    ///
    /// # Errors
    ///
    /// - [`PoolError::InvalidConfig`] if the size or queue capacity is zero, or
    ///   the explicit identity is blank
    /// - Any error returned by the registry, such as
    ///   [`PoolError::DuplicateIdentity`]
    pub fn new(config: WorkerPoolConfig) -> Result<Self> {
        config.validate()?;
        let names = config.resolve_names()?;

        let shared = Arc::new(PoolShared {
            identity: names.identity,
            name_prefix: names.name_prefix,
            size: config.size,
            poll_interval: config.poll_interval,
            queue: BoundedQueue::new(config.queue_capacity),
            counters: PoolCounters::new(),
            state: RwLock::new(PoolState::Running),
            live_workers: AtomicUsize::new(0),
            terminated: Mutex::new(false),
            termination: Condvar::new(),
            interrupt: CancellationToken::new(),
            registry: config.registry().cloned(),
        });

        if let Some(registry) = &shared.registry {
            registry.register(Arc::clone(&shared) as Arc<dyn PoolMetrics>)?;
        }

        log::info!(
            "{}: created with {} workers, queue capacity {}, {} policy",
            shared.identity,
            config.size,
            config.queue_capacity,
            config.saturation_policy.name()
        );
        #[cfg(feature = "tracing")]
        crate::telemetry::metrics::record_pool_start(
            shared.identity.as_str(),
            config.size,
            config.queue_capacity,
        );

        Ok(Self {
            shared,
            workers: Mutex::new(Vec::with_capacity(config.size)),
            instance_name: names.instance_name,
            policy: config.saturation_policy,
        })
    }

    /// Submit a job to the pool
    ///
    /// Never blocks. A refused submission is counted and then handled by the
    /// configured [`SaturationPolicy`].
    ///
    /// # Errors
    ///
    /// - [`PoolError::Saturated`] / [`PoolError::ShutDown`] under
    ///   [`SaturationPolicy::Abort`]
    /// - The job's own error under [`SaturationPolicy::CallerRuns`]
    /// - [`PoolError::SpawnError`] if a worker thread cannot be started
    pub fn submit<J: Job + 'static>(&self, job: J) -> Result<()> {
        self.submit_boxed(Box::new(job))
    }

    /// Submit a closure as a job
    pub fn execute<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        self.submit(ClosureJob::new(f))
    }

    /// Submit a closure and get a handle to its return value.
    ///
    /// If the job is dropped without running (discarded by a policy or
    /// returned from [`shutdown_now`](Self::shutdown_now)), joining the handle
    /// reports [`PoolError::Cancelled`].
    pub fn submit_with_result<T, F>(&self, f: F) -> Result<TaskHandle<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (job, handle) = TaskHandle::wrap(f);
        self.submit(job)?;
        Ok(handle)
    }

    /// Submit an interruptible closure and get a handle to cancel it
    ///
    /// The closure receives a token that is cancelled by
    /// [`JobHandle::cancel`] or by [`shutdown_now`](Self::shutdown_now). The
    /// job must check the token cooperatively. A job cancelled before it starts
    /// does not run its closure.
    ///
    /// # Example
    ///
    /// ```
    /// use managed_pool::prelude::*;
    /// use std::time::Duration;
    ///
    /// # fn main() -> Result<()> {
    /// let pool = WorkerPool::new(WorkerPoolConfig::new(1, 4))?;
    ///
    /// let handle = pool.submit_interruptible(|token| {
    ///     while !token.is_cancelled() {
    ///         std::thread::sleep(Duration::from_millis(5));
    ///     }
    ///     token.check()
    /// })?;
    ///
    /// handle.cancel();
    /// pool.shutdown()?;
    /// assert_eq!(pool.failed_count(), 1);
    /// # Ok(())
    /// # }
    /// ```
    pub fn submit_interruptible<F>(&self, f: F) -> Result<JobHandle>
    where
        F: FnOnce(CancellationToken) -> Result<()> + Send + 'static,
    {
        let handle = JobHandle::new(self.shared.interrupt.child());
        let token = handle.token().clone();
        self.submit(ClosureJob::with_name(
            move || {
                token.check()?;
                f(token)
            },
            "InterruptibleJob",
        ))?;
        Ok(handle)
    }

    /// Submit a job wrapped in a span linked to the caller's current span
    #[cfg(feature = "tracing")]
    pub fn submit_traced<J: Job + 'static>(&self, job: J) -> Result<()> {
        self.submit(crate::telemetry::TracedJob::new(job))
    }

    fn submit_boxed(&self, job: BoxedJob) -> Result<()> {
        let mut job = job;
        loop {
            let (refused, cause) = match self.offer(job)? {
                Offer::Accepted => return Ok(()),
                Offer::Refused(refused, cause) => (refused, cause),
            };
            let ctx = self.shared.record_rejection(cause);

            match &self.policy {
                SaturationPolicy::Abort => return Err(ctx.to_error()),
                SaturationPolicy::Discard => {
                    log::debug!("{}: discarded {}", ctx.identity, refused.job_type());
                    return Ok(());
                }
                SaturationPolicy::DiscardOldest => {
                    if cause == RejectionCause::ShutDown {
                        return Ok(());
                    }
                    if let Ok(oldest) = self.shared.queue.try_recv() {
                        log::debug!("{}: discarded oldest {}", ctx.identity, oldest.job_type());
                    }
                    job = refused;
                }
                SaturationPolicy::CallerRuns => {
                    if cause == RejectionCause::ShutDown {
                        return Ok(());
                    }
                    return run_on_caller(refused);
                }
                SaturationPolicy::Custom(handler) => {
                    return match handler.handle_rejection(refused, &ctx)? {
                        Some(retry) => match self.offer(retry)? {
                            Offer::Accepted => Ok(()),
                            Offer::Refused(_, cause) => {
                                Err(self.shared.record_rejection(cause).to_error())
                            }
                        },
                        None => Ok(()),
                    };
                }
            }
        }
    }

    // Admission runs under the shared state lock so no job slips in after
    // shutdown has closed the queue.
    fn offer(&self, job: BoxedJob) -> Result<Offer> {
        let state = self.shared.state.read();
        if *state != PoolState::Running {
            return Ok(Offer::Refused(job, RejectionCause::ShutDown));
        }

        let mut workers = self.workers.lock();
        if workers.len() < self.shared.size {
            let id = workers.len() + 1;
            workers.push(Worker::spawn(id, job, Arc::clone(&self.shared))?);
            self.shared.counters.record_accepted();
            return Ok(Offer::Accepted);
        }
        drop(workers);

        match self.shared.queue.try_send(job) {
            Ok(()) => {
                self.shared.counters.record_accepted();
                Ok(Offer::Accepted)
            }
            Err(QueueError::Full(job)) => Ok(Offer::Refused(job, RejectionCause::Saturated)),
            Err(QueueError::Closed(job)) => Ok(Offer::Refused(job, RejectionCause::ShutDown)),
            Err(e) => Err(PoolError::other(e.to_string())),
        }
    }

    /// Stops accepting jobs, waits for queued and running jobs to finish and
    /// joins every worker.
    ///
    /// Calling it again, or after [`shutdown_now`](Self::shutdown_now), only
    /// waits for termination. Must not be called from inside a job of the
    /// same pool.
    pub fn shutdown(&self) -> Result<()> {
        self.shared.begin_shutdown();
        self.shared.try_terminate();
        self.shared.wait_terminated(None);
        self.join_workers()
    }

    /// Like [`shutdown`](Self::shutdown) but gives up waiting after `timeout`.
    ///
    /// Returns whether the pool terminated in time. Workers keep draining the
    /// queue in the background after a timeout.
    pub fn shutdown_timeout(&self, timeout: Duration) -> Result<bool> {
        self.shared.begin_shutdown();
        self.shared.try_terminate();
        let terminated = self.shared.wait_terminated(Some(timeout));
        if terminated {
            self.join_workers()?;
        }
        Ok(terminated)
    }

    /// Stops accepting jobs, cancels interruptible jobs and returns the jobs
    /// that never started.
    ///
    /// Running jobs are not waited for; use
    /// [`await_termination`](Self::await_termination) for that.
    pub fn shutdown_now(&self) -> Vec<BoxedJob> {
        self.shared.begin_shutdown();
        let pending = self.shared.queue.drain();
        self.shared
            .interrupt
            .cancel_with_reason(CancellationReason::PoolShutdown);
        if !pending.is_empty() {
            log::info!(
                "{}: {} queued jobs removed by shutdown_now",
                self.shared.identity,
                pending.len()
            );
        }
        self.shared.try_terminate();
        pending
    }

    /// Blocks until the pool has terminated or `timeout` elapses.
    ///
    /// Returns whether the pool terminated.
    pub fn await_termination(&self, timeout: Duration) -> bool {
        self.shared.wait_terminated(Some(timeout))
    }

    /// Whether shutdown has begun
    pub fn is_shutdown(&self) -> bool {
        self.state() != PoolState::Running
    }

    /// Whether every worker has exited after shutdown
    pub fn is_terminated(&self) -> bool {
        self.state() == PoolState::Terminated
    }

    fn join_workers(&self) -> Result<()> {
        let workers = std::mem::take(&mut *self.workers.lock());
        for worker in workers {
            worker.join()?;
        }
        Ok(())
    }

    /// Registration identity
    pub fn identity(&self) -> &PoolIdentity {
        &self.shared.identity
    }

    /// Instance name the identity and thread names derive from
    pub fn instance_name(&self) -> &str {
        &self.instance_name
    }

    /// Worker thread name prefix
    pub fn name_prefix(&self) -> &str {
        &self.shared.name_prefix
    }

    /// Configured saturation policy
    pub fn saturation_policy(&self) -> &SaturationPolicy {
        &self.policy
    }

    /// Lifecycle state
    pub fn state(&self) -> PoolState {
        self.shared.state()
    }

    /// Configured number of workers
    pub fn pool_size(&self) -> usize {
        self.shared.size
    }

    /// Worker threads started so far (and not yet joined)
    pub fn worker_count(&self) -> usize {
        self.workers.lock().len()
    }

    /// Configured queue capacity
    pub fn queue_capacity(&self) -> usize {
        self.shared.queue.capacity()
    }

    /// Jobs waiting in the queue
    pub fn queue_len(&self) -> usize {
        self.shared.queue.len()
    }

    /// Workers currently executing a job
    pub fn active_count(&self) -> usize {
        self.shared.active_count()
    }

    /// Cumulative number of accepted jobs
    pub fn task_count(&self) -> u64 {
        self.shared.task_count()
    }

    /// Free queue slots
    pub fn remaining_queue_capacity(&self) -> usize {
        self.shared.remaining_queue_capacity()
    }

    /// Cumulative number of refused submissions
    pub fn rejected_count(&self) -> u64 {
        self.shared.rejected_count()
    }

    /// Jobs that returned `Ok`
    pub fn completed_count(&self) -> u64 {
        self.shared.completed_count()
    }

    /// Jobs that returned `Err`
    pub fn failed_count(&self) -> u64 {
        self.shared.failed_count()
    }

    /// Jobs that panicked
    pub fn panicked_count(&self) -> u64 {
        self.shared.panicked_count()
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> crate::management::MetricsSnapshot {
        self.shared.snapshot()
    }

    /// Shared metrics view, for registries the pool was not configured with
    pub fn metrics(&self) -> Arc<dyn PoolMetrics> {
        Arc::clone(&self.shared) as Arc<dyn PoolMetrics>
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Workers are detached; they finish the queue and terminate the pool.
        if self.shared.begin_shutdown() {
            self.shared.try_terminate();
        }
    }
}

fn run_on_caller(mut job: BoxedJob) -> Result<()> {
    match catch_unwind(AssertUnwindSafe(|| job.execute())) {
        Ok(result) => result,
        Err(payload) => Err(PoolError::task_panicked(panic_message(payload.as_ref()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::thread;

    fn blocking_job(
        started: mpsc::Sender<()>,
        release: Arc<Mutex<mpsc::Receiver<()>>>,
    ) -> impl FnOnce() -> Result<()> + Send + 'static {
        move || {
            let _ = started.send(());
            let _ = release.lock().recv();
            Ok(())
        }
    }

    #[test]
    fn test_pool_creation() {
        let pool = WorkerPool::new(WorkerPoolConfig::new(3, 5)).expect("Failed to create pool");
        assert_eq!(pool.state(), PoolState::Running);
        assert_eq!(pool.pool_size(), 3);
        assert_eq!(pool.queue_capacity(), 5);
        assert_eq!(pool.active_count(), 0);
        assert_eq!(pool.worker_count(), 0);
        assert_eq!(pool.remaining_queue_capacity(), 5);
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            WorkerPool::new(WorkerPoolConfig::new(0, 5)),
            Err(PoolError::InvalidConfig { .. })
        ));
        assert!(matches!(
            WorkerPool::new(WorkerPoolConfig::new(1, 0)),
            Err(PoolError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_workers_start_lazily_and_are_named() {
        let pool = WorkerPool::new(
            WorkerPoolConfig::new(2, 4).with_name_prefix("lazy-"),
        )
        .expect("Failed to create pool");

        let (tx, rx) = mpsc::channel();
        pool.execute(move || {
            let _ = tx.send(thread::current().name().map(str::to_string));
            Ok(())
        })
        .expect("Failed to submit");

        let name = rx.recv_timeout(Duration::from_secs(5)).expect("job did not run");
        assert_eq!(name.as_deref(), Some("lazy-1"));
        assert_eq!(pool.worker_count(), 1);
        pool.shutdown().expect("Failed to shutdown");
    }

    #[test]
    fn test_saturation_and_release() {
        let pool = WorkerPool::new(WorkerPoolConfig::new(1, 1)).expect("Failed to create pool");
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let release_rx = Arc::new(Mutex::new(release_rx));

        pool.execute(blocking_job(started_tx.clone(), Arc::clone(&release_rx)))
            .expect("first job");
        started_rx.recv().expect("first job started");
        pool.execute(blocking_job(started_tx, Arc::clone(&release_rx)))
            .expect("second job queued");
        assert_eq!(pool.remaining_queue_capacity(), 0);

        let err = pool.execute(|| Ok(())).unwrap_err();
        assert!(matches!(err, PoolError::Saturated { queued: 1, capacity: 1, .. }));
        assert_eq!(pool.rejected_count(), 1);
        assert_eq!(pool.task_count(), 2);

        release_tx.send(()).unwrap();
        release_tx.send(()).unwrap();
        pool.shutdown().expect("Failed to shutdown");
        assert_eq!(pool.completed_count(), 2);
    }

    #[test]
    fn test_shutdown_without_workers_terminates() {
        let pool = WorkerPool::new(WorkerPoolConfig::new(2, 2)).expect("Failed to create pool");
        pool.shutdown().expect("Failed to shutdown");
        assert!(pool.is_shutdown());
        assert!(pool.is_terminated());
        assert!(pool.await_termination(Duration::ZERO));
    }

    #[test]
    fn test_submit_after_shutdown_is_counted() {
        let pool = WorkerPool::new(WorkerPoolConfig::new(1, 1)).expect("Failed to create pool");
        pool.shutdown().expect("Failed to shutdown");

        let err = pool.execute(|| Ok(())).unwrap_err();
        assert!(matches!(err, PoolError::ShutDown { .. }));
        assert_eq!(pool.rejected_count(), 1);
        assert_eq!(pool.task_count(), 0);
    }

    #[test]
    fn test_failures_and_panics_are_counted() {
        let pool = WorkerPool::new(WorkerPoolConfig::new(1, 4)).expect("Failed to create pool");
        pool.execute(|| Ok(())).unwrap();
        pool.execute(|| Err(PoolError::other("boom"))).unwrap();
        pool.execute(|| panic!("job panic")).unwrap();
        pool.execute(|| Ok(())).unwrap();

        pool.shutdown().expect("Failed to shutdown");
        assert_eq!(pool.completed_count(), 2);
        assert_eq!(pool.failed_count(), 1);
        assert_eq!(pool.panicked_count(), 1);
        assert_eq!(pool.task_count(), 4);
    }

    #[test]
    fn test_caller_runs_on_submitting_thread() {
        let pool = WorkerPool::new(
            WorkerPoolConfig::new(1, 1).with_saturation_policy(SaturationPolicy::CallerRuns),
        )
        .expect("Failed to create pool");
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let release_rx = Arc::new(Mutex::new(release_rx));

        pool.execute(blocking_job(started_tx.clone(), Arc::clone(&release_rx)))
            .unwrap();
        started_rx.recv().unwrap();
        pool.execute(blocking_job(started_tx, Arc::clone(&release_rx)))
            .unwrap();

        let caller = thread::current().id();
        let (ran_tx, ran_rx) = mpsc::channel();
        pool.execute(move || {
            let _ = ran_tx.send(thread::current().id());
            Ok(())
        })
        .unwrap();
        assert_eq!(ran_rx.try_recv().unwrap(), caller);
        assert_eq!(pool.rejected_count(), 1);

        let err = pool.execute(|| panic!("caller panic")).unwrap_err();
        assert!(matches!(err, PoolError::TaskPanicked { .. }));

        release_tx.send(()).unwrap();
        release_tx.send(()).unwrap();
        pool.shutdown().unwrap();
    }

    #[test]
    fn test_drop_terminates_idle_pool() {
        let pool = WorkerPool::new(WorkerPoolConfig::new(1, 1)).expect("Failed to create pool");
        let metrics = pool.metrics();
        drop(pool);
        assert_eq!(metrics.state(), PoolState::Terminated);
    }

    #[test]
    fn test_pool_state_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&PoolState::ShuttingDown).unwrap(),
            "\"shutting_down\""
        );
        assert_eq!(PoolState::Running.to_string(), "running");
    }
}
