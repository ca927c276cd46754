//! Pacing for outbound `eth_call` lookups.
//!
//! A token bucket: a burst of `capacity` calls, then `refill_rate` calls per
//! second. Lookups run on decode worker threads, so [`RateLimiter::acquire`]
//! parks the calling thread rather than failing.

use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

use chaintables_core::ConfigError;
use serde::{Deserialize, Serialize};

/// Longest single sleep in [`RateLimiter::acquire`]; slower buckets are
/// polled at this interval.
const MAX_WAIT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLimiterConfig {
    /// Burst size.
    #[serde(default = "default_capacity")]
    pub capacity: f64,
    /// Calls per second once the burst is spent.
    #[serde(default = "default_refill_rate")]
    pub refill_rate: f64,
}

fn default_capacity() -> f64 { 3.0 }
fn default_refill_rate() -> f64 { 3.0 }

impl RateLimiterConfig {
    /// The bucket must hold at least one whole call and refill at a finite,
    /// positive rate, or `acquire` could never return.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.capacity.is_finite() || self.capacity < 1.0 {
            return Err(ConfigError::InvalidRateLimit {
                reason: format!("capacity must be at least 1, got {}", self.capacity),
            });
        }
        if !self.refill_rate.is_finite() || self.refill_rate <= 0.0 {
            return Err(ConfigError::InvalidRateLimit {
                reason: format!("refill_rate must be positive, got {}", self.refill_rate),
            });
        }
        Ok(())
    }
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            refill_rate: default_refill_rate(),
        }
    }
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    updated: Instant,
}

impl Bucket {
    /// Take one token, or return how long until one accrues.
    fn take(&mut self, config: &RateLimiterConfig, now: Instant) -> Option<Duration> {
        let accrued = now.duration_since(self.updated).as_secs_f64() * config.refill_rate;
        self.tokens = (self.tokens + accrued).min(config.capacity);
        self.updated = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            return None;
        }
        let wait = (1.0 - self.tokens) / config.refill_rate;
        Some(Duration::try_from_secs_f64(wait).map_or(MAX_WAIT, |d| d.min(MAX_WAIT)))
    }
}

#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimiterConfig,
    bucket: Mutex<Bucket>,
}

impl RateLimiter {
    pub fn new(config: RateLimiterConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            bucket: Mutex::new(Bucket {
                tokens: config.capacity,
                updated: Instant::now(),
            }),
            config,
        })
    }

    fn take(&self) -> Option<Duration> {
        self.bucket
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take(&self.config, Instant::now())
    }

    /// `false` when the call would have to wait.
    pub fn try_acquire(&self) -> bool {
        self.take().is_none()
    }

    /// Block until a call is allowed.
    pub fn acquire(&self) {
        while let Some(wait) = self.take() {
            thread::sleep(wait);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(capacity: f64, refill_rate: f64) -> RateLimiter {
        RateLimiter::new(RateLimiterConfig { capacity, refill_rate }).unwrap()
    }

    fn rejected(capacity: f64, refill_rate: f64) -> bool {
        matches!(
            RateLimiter::new(RateLimiterConfig { capacity, refill_rate }),
            Err(ConfigError::InvalidRateLimit { .. })
        )
    }

    #[test]
    fn burst_then_throttled() {
        let rl = limiter(4.0, 0.001);
        assert_eq!((0..6).filter(|_| rl.try_acquire()).count(), 4);
    }

    #[test]
    fn wait_hint_tracks_refill_rate() {
        let config = RateLimiterConfig { capacity: 1.0, refill_rate: 2.0 };
        let start = Instant::now();
        let mut bucket = Bucket { tokens: 0.0, updated: start };
        let wait = bucket.take(&config, start).unwrap();
        assert_eq!(wait, Duration::from_millis(500));
        assert_eq!(bucket.take(&config, start + Duration::from_millis(500)), None);
    }

    #[test]
    fn acquire_sleeps_once_burst_is_spent() {
        let rl = limiter(1.0, 50.0);
        rl.acquire();
        let start = Instant::now();
        rl.acquire();
        assert!(start.elapsed() >= Duration::from_millis(10));
    }

    #[test]
    fn fractional_capacity_is_rejected() {
        assert!(rejected(0.5, 1000.0));
        assert!(rejected(0.0, 3.0));
        assert!(rejected(f64::NAN, 3.0));
        assert!(rejected(f64::INFINITY, 3.0));
    }

    #[test]
    fn non_positive_or_non_finite_rate_is_rejected() {
        assert!(rejected(3.0, 0.0));
        assert!(rejected(3.0, -1.0));
        assert!(rejected(3.0, f64::NAN));
        assert!(rejected(3.0, f64::INFINITY));
    }

    #[test]
    fn tiny_rate_wait_is_capped() {
        let config = RateLimiterConfig { capacity: 1.0, refill_rate: 1e-300 };
        assert!(config.validate().is_ok());
        let start = Instant::now();
        let mut bucket = Bucket { tokens: 0.0, updated: start };
        assert_eq!(bucket.take(&config, start), Some(MAX_WAIT));
    }

    #[test]
    fn config_defaults_from_json() {
        let cfg: RateLimiterConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, RateLimiterConfig::default());
    }
}
