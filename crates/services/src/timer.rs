//! Cancellable one-shot timers.

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// A callback scheduled on the tokio runtime after a delay.
///
/// Dropping the handle aborts the timer, so a callback never outlives the
/// object that scheduled it.
#[derive(Debug)]
pub struct ScheduledCallback {
    task: JoinHandle<()>,
}

impl ScheduledCallback {
    pub fn spawn<F>(runtime: &Handle, delay: Duration, callback: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let task = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            callback();
        });
        Self { task }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for ScheduledCallback {
    fn drop(&mut self) {
        self.task.abort();
    }
}
