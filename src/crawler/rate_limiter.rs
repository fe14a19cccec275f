//! Minimum spacing between outgoing requests
//!
//! The crawler sends at most one request at a time, so a single global
//! limiter is enough: each `wait` returns no earlier than `min_interval`
//! after the previous one returned.

use std::time::Duration;
use tokio::time::{sleep_until, Instant};

#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_release: Option<Instant>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_release: None,
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Time left before the next request may be sent, if any
    pub fn time_until_ready(&self, now: Instant) -> Option<Duration> {
        let ready_at = self.last_release? + self.min_interval;
        (ready_at > now).then(|| ready_at - now)
    }

    /// Waits until a request may be sent and returns the release instant
    ///
    /// The first call returns immediately.
    pub async fn wait(&mut self) -> Instant {
        let now = Instant::now();
        if let Some(delay) = self.time_until_ready(now) {
            tracing::trace!("Rate limit: sleeping {:?}", delay);
            sleep_until(now + delay).await;
        }

        let released = Instant::now();
        self.last_release = Some(released);
        released
    }
}
