//! Request rate limiting for the HTTP sources.
//!
//! Sliding-window limiter: at most `max_requests` request starts within
//! any `window`. `acquire` waits until a slot frees up instead of
//! failing, so a large batch plan is spread out rather than rejected
//! upstream with 429s.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;
use tracing::trace;

/// Sliding-window request limiter.
#[derive(Debug)]
pub struct RequestLimiter {
    max_requests: u32,
    window: Duration,
    /// Start times of requests inside the current window.
    started: Mutex<VecDeque<Instant>>,
}

impl RequestLimiter {
    /// Create a limiter allowing `max_requests` per `window`.
    pub fn new(max_requests: u32, window: Duration) -> Self {
        let max_requests = max_requests.max(1);
        Self {
            max_requests,
            window,
            started: Mutex::new(VecDeque::with_capacity(max_requests as usize)),
        }
    }

    pub fn per_second(max_requests: u32) -> Self {
        Self::new(max_requests, Duration::from_secs(1))
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    /// Requests started within the current window.
    pub fn current_count(&self) -> usize {
        let mut started = self.started.lock();
        Self::cleanup(&mut started, self.window, Instant::now());
        started.len()
    }

    /// Wait for a free slot and claim it.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let now = Instant::now();
                let mut started = self.started.lock();
                Self::cleanup(&mut started, self.window, now);
                if started.len() < self.max_requests as usize {
                    started.push_back(now);
                    return;
                }
                started
                    .front()
                    .map(|&oldest| (oldest + self.window).saturating_duration_since(now))
                    .unwrap_or_default()
            };
            trace!(wait_ms = wait.as_millis() as u64, "Request rate limit reached, waiting");
            tokio::time::sleep(wait).await;
        }
    }

    fn cleanup(started: &mut VecDeque<Instant>, window: Duration, now: Instant) {
        while started
            .front()
            .is_some_and(|&t| now.saturating_duration_since(t) >= window)
        {
            started.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::future::join_all;

    #[tokio::test(start_paused = true)]
    async fn test_burst_within_limit_does_not_wait() {
        let limiter = RequestLimiter::per_second(4);
        let start = Instant::now();

        for _ in 0..4 {
            limiter.acquire().await;
        }

        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(limiter.current_count(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_excess_request_waits_for_window() {
        let limiter = RequestLimiter::per_second(4);
        let start = Instant::now();

        for _ in 0..5 {
            limiter.acquire().await;
        }

        assert!(start.elapsed() >= Duration::from_secs(1));
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_requests_are_spread() {
        let limiter = RequestLimiter::per_second(4);
        let start = Instant::now();

        let finished: Vec<Duration> = join_all((0..10).map(|_| async {
            limiter.acquire().await;
            start.elapsed()
        }))
        .await;

        // 4 now, 4 after one second, 2 after two seconds
        let immediate = finished.iter().filter(|d| **d < Duration::from_secs(1)).count();
        assert_eq!(immediate, 4);
        assert!(finished.iter().all(|d| *d < Duration::from_secs(3)));
        assert_eq!(
            finished.iter().filter(|d| **d >= Duration::from_secs(2)).count(),
            2
        );
    }

    #[test]
    fn test_zero_limit_is_clamped() {
        assert_eq!(RequestLimiter::per_second(0).max_requests(), 1);
    }
}
