//! Single-owner cancellable timer.
//!
//! Each `schedule` cancels the previous timer before arming a new one. Timers carry a
//! generation number; a timer that already woke up when it was superseded sees a stale
//! generation in [`Debouncer::complete`] and does nothing.

use std::future::Future;
use std::time::Duration;

use tokio::task::AbortHandle;

#[derive(Debug, Default)]
pub struct Debouncer {
    generation: u64,
    pending: Option<AbortHandle>,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a timer that runs `task(generation)` after `delay`. Must be called inside a tokio
    /// runtime.
    pub fn schedule<F, Fut>(&mut self, delay: Duration, task: F) -> u64
    where
        F: FnOnce(u64) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        self.generation += 1;
        let fut = task(self.generation);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            fut.await;
        });
        self.pending = Some(handle.abort_handle());
        self.generation
    }

    /// Cancel the pending timer, if any. Returns whether one was armed.
    pub fn cancel(&mut self) -> bool {
        self.generation += 1;
        match self.pending.take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Called by a timer once it fires. False means it was superseded and must not act.
    pub fn complete(&mut self, generation: u64) -> bool {
        if generation != self.generation {
            return false;
        }
        self.pending = None;
        true
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn reschedule_cancels_previous_timer() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut debouncer = Debouncer::new();
        for _ in 0..3 {
            let fired = Arc::clone(&fired);
            debouncer.schedule(Duration::from_millis(50), move |_| async move {
                fired.fetch_add(1, Ordering::SeqCst);
            });
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_firing() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut debouncer = Debouncer::new();
        let counter = Arc::clone(&fired);
        debouncer.schedule(Duration::from_millis(50), move |_| async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(debouncer.is_pending());
        assert!(debouncer.cancel());
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(!debouncer.cancel());
    }

    #[test]
    fn stale_generation_does_not_complete() {
        let mut debouncer = Debouncer::new();
        debouncer.cancel();
        assert!(!debouncer.complete(0));
        assert!(debouncer.complete(1));
    }
}
