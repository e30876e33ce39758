use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};

/// Recurring tick task, aborted on `cancel` or drop
///
/// The first tick fires one full period after `start`. The callback returns
/// `false` to end the task on its own.
pub(crate) struct ElapsedTimer {
    handle: Option<JoinHandle<()>>,
}

impl ElapsedTimer {
    /// Must be called from within a Tokio runtime
    pub(crate) fn start<F>(period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            loop {
                ticks.tick().await;
                if !on_tick() {
                    break;
                }
            }
        });

        Self {
            handle: Some(handle),
        }
    }

    pub(crate) fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for ElapsedTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
