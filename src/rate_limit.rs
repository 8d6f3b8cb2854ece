use std::time::{Duration, Instant};

use dashmap::DashMap;

const MAX_REQUESTS: u32 = 5;
const WINDOW_SECS: u64 = 60 * 60;

/// Per-email reset-request limiter using a sliding window. Five requests per
/// hour; every request counts, successful or not, so the limiter cannot be
/// used as an enumeration oracle either.
pub struct ResetRateLimiter {
    /// email -> (count, window_start)
    entries: DashMap<String, (u32, Instant)>,
}

impl ResetRateLimiter {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Check and count a request. Returns Ok(()) or Err with retry-after seconds.
    pub fn check(&self, email: &str) -> Result<(), u64> {
        let window = Duration::from_secs(WINDOW_SECS);
        let now = Instant::now();

        let mut entry = self
            .entries
            .entry(email.trim().to_lowercase())
            .or_insert((0, now));
        let (count, start) = entry.value_mut();

        if now.duration_since(*start) > window {
            *count = 1;
            *start = now;
            return Ok(());
        }

        if *count >= MAX_REQUESTS {
            let elapsed = now.duration_since(*start).as_secs();
            return Err(WINDOW_SECS.saturating_sub(elapsed));
        }

        *count += 1;
        Ok(())
    }

    /// Remove entries whose window has long passed.
    pub fn cleanup(&self, max_age: Duration) {
        let now = Instant::now();
        self.entries
            .retain(|_, (_, start)| now.duration_since(*start) < max_age);
    }
}
