//! Trailing-edge debounce on the Tokio runtime.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Coalesces bursts of calls into one execution of the most recent call.
///
/// Every [`call`](Debouncer::call) restarts the window; only the closure passed
/// last runs, once the window elapses without another call. Dropping the
/// debouncer discards a call that has not fired yet.
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

    /// Schedule `f` after the window, replacing any call still waiting.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn call<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let window = self.window;
        let next = tokio::spawn(async move {
            tokio::time::sleep(window).await;
            f();
        });

        let previous = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(next);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    /// Discard the call still waiting, if any.
    pub(crate) fn cancel(&self) {
        let pending = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(pending) = pending {
            pending.abort();
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        let pending = self
            .pending
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(pending) = pending {
            pending.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_burst_collapses_to_last_call() {
        let debouncer = Debouncer::new(Duration::from_millis(1000));
        let calls = Arc::new(Mutex::new(Vec::new()));

        for value in ["r", "re", "red"] {
            let calls = Arc::clone(&calls);
            debouncer.call(move || calls.lock().unwrap().push(value));
            tokio::time::sleep(Duration::from_millis(300)).await;
        }
        assert!(calls.lock().unwrap().is_empty());

        tokio::time::sleep(Duration::from_millis(800)).await;
        assert_eq!(*calls.lock().unwrap(), vec!["red"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_restarts_on_each_call() {
        let debouncer = Debouncer::new(Duration::from_millis(1000));
        let calls = Arc::new(Mutex::new(0));

        let c = Arc::clone(&calls);
        debouncer.call(move || *c.lock().unwrap() += 1);
        tokio::time::sleep(Duration::from_millis(900)).await;

        let c = Arc::clone(&calls);
        debouncer.call(move || *c.lock().unwrap() += 1);
        tokio::time::sleep(Duration::from_millis(900)).await;
        assert_eq!(*calls.lock().unwrap(), 0);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_windows_each_fire() {
        let debouncer = Debouncer::new(Duration::from_millis(100));
        let calls = Arc::new(Mutex::new(Vec::new()));

        for value in [1, 2] {
            let calls = Arc::clone(&calls);
            debouncer.call(move || calls.lock().unwrap().push(value));
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        assert_eq!(*calls.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_discards_pending_call() {
        let calls = Arc::new(Mutex::new(0));
        {
            let debouncer = Debouncer::new(Duration::from_millis(100));
            let c = Arc::clone(&calls);
            debouncer.call(move || *c.lock().unwrap() += 1);
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(*calls.lock().unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_discards_pending_call() {
        let debouncer = Debouncer::new(Duration::from_millis(100));
        let calls = Arc::new(Mutex::new(0));

        let c = Arc::clone(&calls);
        debouncer.call(move || *c.lock().unwrap() += 1);
        debouncer.cancel();
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(*calls.lock().unwrap(), 0);

        let c = Arc::clone(&calls);
        debouncer.call(move || *c.lock().unwrap() += 1);
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(*calls.lock().unwrap(), 1);
    }
}
