//! Token bucket rate limiter for data providers.
//!
//! Every provider gets its own bucket, sized from the provider's declared
//! [`RateLimit`]. A bucket grants at most `requests_per_minute` tokens per
//! minute, bursts up to `max_concurrency`, and spaces grants by at least
//! `min_delay`.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::models::ProviderId;
use crate::provider::RateLimit;

/// Token bucket for a single provider.
#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
    last_grant: Option<Instant>,
    /// Tokens per second.
    rate: f64,
    capacity: f64,
    min_delay: Duration,
}

impl TokenBucket {
    fn from_limit(limit: &RateLimit) -> Self {
        let capacity = limit.max_concurrency.max(1) as f64;
        Self {
            tokens: capacity,
            last_refill: Instant::now(),
            last_grant: None,
            rate: limit.requests_per_minute.max(1) as f64 / 60.0,
            capacity,
            min_delay: limit.min_delay,
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.rate).min(self.capacity);
        self.last_refill = now;
    }

    /// Take a token, or return how long to wait before one is available.
    fn take(&mut self) -> Result<(), Duration> {
        self.refill();

        let spacing = self
            .last_grant
            .map(|at| self.min_delay.saturating_sub(at.elapsed()))
            .unwrap_or(Duration::ZERO);

        if self.tokens >= 1.0 && spacing.is_zero() {
            self.tokens -= 1.0;
            self.last_grant = Some(Instant::now());
            return Ok(());
        }

        let refill_wait = if self.tokens >= 1.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64((1.0 - self.tokens) / self.rate)
        };
        Err(refill_wait.max(spacing))
    }
}

/// Rate limiter for multiple providers.
///
/// Buckets are created lazily, using the limit registered through
/// [`configure`](Self::configure) or [`RateLimit::default`].
pub struct RateLimiter {
    buckets: Mutex<HashMap<String, TokenBucket>>,
    limits: Mutex<HashMap<String, RateLimit>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            limits: Mutex::new(HashMap::new()),
        }
    }

    /// Lock the buckets mutex, recovering from poison if necessary.
    ///
    /// A poisoned bucket map at worst misstates a few tokens.
    fn lock_buckets(&self) -> MutexGuard<'_, HashMap<String, TokenBucket>> {
        self.buckets.lock().unwrap_or_else(|poisoned| {
            warn!("Rate limiter buckets mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn lock_limits(&self) -> MutexGuard<'_, HashMap<String, RateLimit>> {
        self.limits.lock().unwrap_or_else(|poisoned| {
            warn!("Rate limiter limits mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Register the limit for a provider, resetting its bucket.
    pub fn configure(&self, provider: &ProviderId, limit: RateLimit) {
        self.lock_limits().insert(provider.to_string(), limit);
        self.lock_buckets().remove(provider.as_ref());
    }

    /// Wait until a token is available for `provider`.
    ///
    /// The lock is never held across the sleep.
    pub async fn acquire(&self, provider: &ProviderId) {
        loop {
            let wait = match self.with_bucket(provider, TokenBucket::take) {
                Ok(()) => {
                    debug!("Rate limiter: acquired token for '{}'", provider);
                    return;
                }
                Err(wait) => wait,
            };

            debug!("Rate limiter: waiting {:?} for provider '{}'", wait, provider);
            tokio::time::sleep(wait.max(Duration::from_millis(1))).await;
        }
    }

    /// Take a token without waiting. Returns false when rate limited.
    pub fn try_acquire(&self, provider: &ProviderId) -> bool {
        self.with_bucket(provider, TokenBucket::take).is_ok()
    }

    pub fn reset(&self, provider: &ProviderId) {
        self.lock_buckets().remove(provider.as_ref());
    }

    fn with_bucket<T>(&self, provider: &ProviderId, f: impl FnOnce(&mut TokenBucket) -> T) -> T {
        let limit = self
            .lock_limits()
            .get(provider.as_ref())
            .cloned()
            .unwrap_or_default();

        let mut buckets = self.lock_buckets();
        let bucket = buckets
            .entry(provider.to_string())
            .or_insert_with(|| TokenBucket::from_limit(&limit));
        f(bucket)
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
