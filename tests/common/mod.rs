//! Helpers shared by the integration tests

#![allow(dead_code)]

use managed_pool::Result;
use std::sync::mpsc;
use std::time::Duration;

/// How long a test waits for a worker before giving up
pub const WAIT: Duration = Duration::from_secs(5);

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A job that reports `id` on `started` and then blocks until released.
///
/// Dropping the returned sender releases the job as well.
pub fn blocking_job(
    id: usize,
    started: &mpsc::Sender<usize>,
) -> (impl FnOnce() -> Result<()> + Send + 'static, mpsc::Sender<()>) {
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let started = started.clone();
    let job = move || {
        let _ = started.send(id);
        let _ = release_rx.recv();
        Ok(())
    };
    (job, release_tx)
}
