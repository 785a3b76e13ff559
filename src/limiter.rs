//! Sliding-window rate limiter for upstream weather calls
//!
//! Admission never fails; callers over budget are delayed until the oldest
//! admission in the window ages out. The timestamp queue sits behind a fair
//! async mutex that is held across the wait, so concurrent callers are
//! admitted in arrival order and never double-counted.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::warn;

use crate::config::{DEFAULT_RATE_LIMIT, DEFAULT_RATE_WINDOW};

/// Admission control bounding calls to `limit` per rolling `window`
#[derive(Debug)]
pub struct RateLimiter {
    limit: usize,
    window: Duration,
    timestamps: Mutex<VecDeque<Instant>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiter {
    /// Creates a limiter with the provider's default budget (60 calls / 60 s)
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_RATE_LIMIT, DEFAULT_RATE_WINDOW)
    }

    /// Creates a limiter admitting `limit` calls per `window`
    ///
    /// A limit of zero is treated as one.
    pub fn with_limits(limit: usize, window: Duration) -> Self {
        let limit = limit.max(1);
        Self {
            limit,
            window,
            timestamps: Mutex::new(VecDeque::with_capacity(limit)),
        }
    }

    /// Calls admitted per window
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Length of the rolling window
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Waits until one more call fits in the window, then records it
    pub async fn admit(&self) {
        let mut queue = self.timestamps.lock().await;

        let now = Instant::now();
        purge(&mut queue, now, self.window);

        if queue.len() >= self.limit {
            if let Some(&oldest) = queue.front() {
                let ready_at = oldest + self.window;
                if ready_at > now {
                    warn!(
                        "Rate limit reached. Waiting {:.2} seconds",
                        (ready_at - now).as_secs_f64()
                    );
                    tokio::time::sleep_until(ready_at).await;
                }
            }
        }

        let now = Instant::now();
        purge(&mut queue, now, self.window);
        while queue.len() >= self.limit {
            queue.pop_front();
        }
        queue.push_back(now);
    }

    /// Number of admissions still inside the current window
    pub async fn in_window(&self) -> usize {
        let mut queue = self.timestamps.lock().await;
        purge(&mut queue, Instant::now(), self.window);
        queue.len()
    }
}

/// Drops every admission whose age has reached the window length
fn purge(queue: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(&oldest) = queue.front() {
        if now.saturating_duration_since(oldest) >= window {
            queue.pop_front();
        } else {
            break;
        }
    }
}
