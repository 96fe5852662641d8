//! Submission throttle.
//!
//! A token bucket with capacity 1 refilling one token per interval: the
//! bucket holds at most one submission slot, and a fresh slot becomes
//! available one interval after the previous operation completed. The slot
//! is guarded by a mutex held across the operation, so submissions are
//! paced regardless of how many callers race for it.

use std::future::Future;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Duration, Instant};

/// Paces operations to at most one per interval.
pub struct Throttle {
    interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl Throttle {
    /// Create a throttle with the given minimum spacing between operations.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_slot: Mutex::new(None),
        }
    }

    /// Suspend until a slot is available, run the operation, and return its
    /// result. The next slot opens one interval after the operation returns.
    pub async fn run<F, Fut, T>(&self, op: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let mut slot = self.next_slot.lock().await;
        if let Some(ready_at) = *slot {
            sleep_until(ready_at).await;
        }
        let result = op().await;
        *slot = Some(Instant::now() + self.interval);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_first_run_is_immediate() {
        let throttle = Throttle::new(Duration::from_secs(10));
        let start = Instant::now();
        let value = throttle.run(|| async { 42 }).await;
        assert_eq!(value, 42);
        assert_eq!(Instant::now(), start);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_run_waits_an_interval() {
        let throttle = Throttle::new(Duration::from_secs(10));
        throttle.run(|| async {}).await;

        let start = Instant::now();
        throttle.run(|| async {}).await;
        assert!(Instant::now() - start >= Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_are_serialized() {
        let throttle = Arc::new(Throttle::new(Duration::from_secs(2)));
        let start = Instant::now();

        let a = tokio::spawn({
            let throttle = Arc::clone(&throttle);
            async move { throttle.run(|| async { Instant::now() }).await }
        });
        let b = tokio::spawn({
            let throttle = Arc::clone(&throttle);
            async move { throttle.run(|| async { Instant::now() }).await }
        });

        let (first, second) = (a.await.unwrap(), b.await.unwrap());
        let (earlier, later) = if first <= second {
            (first, second)
        } else {
            (second, first)
        };

        assert_eq!(earlier, start);
        assert!(later - earlier >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_result_passthrough() {
        let throttle = Throttle::new(Duration::from_millis(100));
        let out: Result<u32, String> = throttle.run(|| async { Ok(7) }).await;
        assert_eq!(out.unwrap(), 7);
    }
}
