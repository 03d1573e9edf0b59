//! Cancellable debounce timer.
//!
//! Each call to [`Debouncer::schedule`] aborts the previous timer if it has not
//! fired yet and starts a new one. When the quiet period elapses the supplied
//! closure runs synchronously on the timer task, so once it has fired there is
//! nothing left to cancel: any work it spawns keeps running.

use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: Mutex::new(None),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Restart the timer; `fire` runs after `window` of quiescence.
    pub fn schedule<F>(&self, fire: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let window = self.window;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(window).await;
            fire();
        });

        if let Some(previous) = self.pending.lock().replace(handle) {
            previous.abort();
        }
    }

    /// Cancel a timer that has not fired. Returns whether one was pending.
    pub fn cancel(&self) -> bool {
        match self.pending.lock().take() {
            Some(handle) => {
                let was_pending = !handle.is_finished();
                handle.abort();
                was_pending
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.get_mut().take() {
            handle.abort();
        }
    }
}
