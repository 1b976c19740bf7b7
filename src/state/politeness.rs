use std::time::{Duration, Instant};

/// Enforces a fixed delay between consecutive fetches of one crawler
///
/// Each `SiteCrawler` run owns its own gate, so the delay only ever slows down
/// that crawl. Waiting is an async sleep, which leaves the worker thread free
/// to drive other crawls in the meantime.
#[derive(Debug, Clone)]
pub struct PolitenessGate {
    /// Minimum time between the start of two requests
    delay: Duration,

    /// Timestamp of the last request made through this gate
    last_request_time: Option<Instant>,
}

impl PolitenessGate {
    /// Creates a gate with the given delay
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_request_time: None,
        }
    }

    /// Returns the configured delay
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Calculates the time until the next request can be made
    ///
    /// Returns None if a request can be made now, or the duration to wait otherwise.
    pub fn time_until_next_request(&self, now: Instant) -> Option<Duration> {
        let last = self.last_request_time?;
        let elapsed = now.duration_since(last);
        if elapsed < self.delay {
            Some(self.delay - elapsed)
        } else {
            None
        }
    }

    /// Records that a request was made
    pub fn record_request(&mut self, now: Instant) {
        self.last_request_time = Some(now);
    }

    /// Waits until the delay has passed, then records the new request
    pub async fn wait_turn(&mut self) {
        if let Some(wait) = self.time_until_next_request(Instant::now()) {
            tracing::trace!("Politeness delay: sleeping {:?}", wait);
            tokio::time::sleep(wait).await;
        }
        self.record_request(Instant::now());
    }
}
