//! Timer-reset debouncing.

use std::time::Duration;
use tokio::task::JoinHandle;

/// Runs a callback once input has been quiet for `interval`.
///
/// Every [`Debouncer::call`] discards the pending timer and arms a new one.
/// Must be used from within a tokio runtime.
#[derive(Debug)]
pub struct Debouncer {
    interval: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(interval: Duration) -> Self {
        Self { interval, pending: None }
    }

    /// Arm the timer; `on_fire` runs after the interval unless re-armed or cancelled first.
    ///
    /// `on_fire` is synchronous, so an abort either prevents it entirely or arrives too late
    /// to interrupt it. Callers that race with `cancel` must re-check their own gate inside it.
    pub fn call<F>(&mut self, on_fire: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();

        let interval = self.interval;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(interval).await;
            on_fire();
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    fn counter() -> (Arc<AtomicUsize>, impl Fn() -> Box<dyn FnOnce() + Send>) {
        let fired = Arc::new(AtomicUsize::new(0));
        let handle = Arc::clone(&fired);
        let make = move || {
            let fired = Arc::clone(&handle);
            Box::new(move || {
                fired.fetch_add(1, Ordering::SeqCst);
            }) as Box<dyn FnOnce() + Send>
        };
        (fired, make)
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_quiet_interval() {
        let (fired, make) = counter();
        let mut debouncer = Debouncer::new(Duration::from_secs(1));

        debouncer.call(make());
        tokio::time::sleep(Duration::from_millis(999)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn rearming_discards_pending_timer() {
        let (fired, make) = counter();
        let mut debouncer = Debouncer::new(Duration::from_secs(1));

        for _ in 0..3 {
            debouncer.call(make());
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(debouncer.is_pending());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_fire() {
        let (fired, make) = counter();
        let mut debouncer = Debouncer::new(Duration::from_secs(1));

        debouncer.call(make());
        debouncer.cancel();
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(!debouncer.is_pending());
    }
}
