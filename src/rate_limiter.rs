/*!
 * Temporal gate for outbound translation service calls.
 *
 * External translation services throttle or ban clients that exceed
 * undocumented request-rate thresholds. A fixed minimum spacing between
 * calls is a simple, sufficient mitigation for a sequential pipeline.
 */

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Enforces a minimum delay between consecutive outbound calls.
///
/// `wait()` suspends the caller until at least the configured interval has
/// elapsed since the previous `wait()` returned. Purely temporal: no inputs,
/// no error conditions.
pub struct RateLimiter {
    /// Minimum spacing between calls
    min_interval: Duration,
    /// Longer pause applied after a failed call
    failure_cooldown: Duration,
    /// When the previous wait() returned
    last_release: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Create a new rate limiter with the given minimum interval and
    /// post-failure cooldown
    pub fn new(min_interval: Duration, failure_cooldown: Duration) -> Self {
        Self {
            min_interval,
            failure_cooldown,
            last_release: Mutex::new(None),
        }
    }

    /// Create a rate limiter from millisecond settings
    pub fn from_millis(min_interval_ms: u64, failure_cooldown_ms: u64) -> Self {
        Self::new(
            Duration::from_millis(min_interval_ms),
            Duration::from_millis(failure_cooldown_ms),
        )
    }

    /// The configured minimum spacing between calls
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Suspend until the minimum interval since the previous release has
    /// elapsed. The first call returns immediately.
    pub async fn wait(&self) {
        let mut last = self.last_release.lock().await;

        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }

        *last = Some(Instant::now());
    }

    /// Impose the longer post-failure cooldown, letting transient
    /// service-side throttling subside before the pipeline continues.
    pub async fn cooldown(&self) {
        tokio::time::sleep(self.failure_cooldown).await;
        let mut last = self.last_release.lock().await;
        *last = Some(Instant::now());
    }

    /// Take an extra pause of the given length (the periodic breather),
    /// counted as a release like any other.
    pub async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
        let mut last = self.last_release.lock().await;
        *last = Some(Instant::now());
    }
}
