//! Token bucket rate limiting
//!
//! The bucket holds up to `capacity` tokens and regains `refill_amount`
//! tokens every `refill_interval`. Callers either take a token without
//! waiting ([`TokenBucket::try_acquire`]) or suspend until one is available
//! ([`TokenBucket::acquire`]), observing a cancellation token while they wait.
//!
//! Bucket state lives behind a single mutex so refill and take happen as one
//! step; concurrent callers never double-count a refill.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::{Clock, ResilienceError, SystemClock};

/// Configuration for token bucket rate limiter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenBucketConfig {
    /// Maximum number of tokens the bucket can hold
    pub capacity: u64,
    /// Number of tokens to refill per interval
    pub refill_amount: u64,
    /// Time interval for token refill
    pub refill_interval: Duration,
}

impl Default for TokenBucketConfig {
    fn default() -> Self {
        Self { capacity: 100, refill_amount: 10, refill_interval: Duration::from_secs(1) }
    }
}

impl TokenBucketConfig {
    /// Create a new configuration builder
    pub fn builder() -> TokenBucketConfigBuilder {
        TokenBucketConfigBuilder::new()
    }

    /// Configuration sustaining `per_minute` acquisitions per minute with
    /// bursts of up to `burst`.
    ///
    /// One token is regained every `60s / per_minute`.
    pub fn per_minute(per_minute: u32, burst: u64) -> Result<Self, String> {
        if per_minute == 0 {
            return Err("per_minute must be greater than 0".to_string());
        }
        let config = Self {
            capacity: burst,
            refill_amount: 1,
            refill_interval: Duration::from_secs(60) / per_minute,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.capacity == 0 {
            return Err("capacity must be greater than 0".to_string());
        }
        if self.refill_amount == 0 {
            return Err("refill_amount must be greater than 0".to_string());
        }
        if self.refill_interval.is_zero() {
            return Err("refill_interval must be greater than zero".to_string());
        }
        Ok(())
    }
}

/// Builder for TokenBucketConfig
#[derive(Debug)]
pub struct TokenBucketConfigBuilder {
    config: TokenBucketConfig,
}

impl Default for TokenBucketConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenBucketConfigBuilder {
    pub fn new() -> Self {
        Self { config: TokenBucketConfig::default() }
    }

    pub fn capacity(mut self, capacity: u64) -> Self {
        self.config.capacity = capacity;
        self
    }

    pub fn refill_amount(mut self, amount: u64) -> Self {
        self.config.refill_amount = amount;
        self
    }

    pub fn refill_interval(mut self, interval: Duration) -> Self {
        self.config.refill_interval = interval;
        self
    }

    pub fn build(self) -> Result<TokenBucketConfig, String> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[derive(Debug)]
struct BucketState {
    tokens: u64,
    last_refill: Instant,
}

/// Token bucket rate limiter
///
/// Allows bursts of requests up to the capacity, then refills tokens at a fixed
/// rate. Clones share the same bucket.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
///
/// use tallyline_common::resilience::TokenBucket;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let limiter = TokenBucket::new(10, 5, Duration::from_secs(1))?;
///
/// if limiter.try_acquire(3) {
///     println!("Request allowed");
/// } else {
///     println!("Rate limit exceeded");
/// }
/// # Ok(())
/// # }
/// ```
pub struct TokenBucket<C: Clock = SystemClock> {
    config: TokenBucketConfig,
    state: Arc<Mutex<BucketState>>,
    clock: Arc<C>,
}

impl<C: Clock> TokenBucket<C> {
    /// Create a new token bucket with custom clock
    pub fn with_clock(
        capacity: u64,
        refill_amount: u64,
        refill_interval: Duration,
        clock: C,
    ) -> Result<Self, String> {
        Self::from_config(TokenBucketConfig { capacity, refill_amount, refill_interval }, clock)
    }

    /// Create a token bucket from a validated configuration
    pub fn from_config(config: TokenBucketConfig, clock: C) -> Result<Self, String> {
        config.validate()?;

        Ok(Self {
            state: Arc::new(Mutex::new(BucketState {
                tokens: config.capacity,
                last_refill: clock.now(),
            })),
            clock: Arc::new(clock),
            config,
        })
    }

    /// Bucket configuration
    pub fn config(&self) -> &TokenBucketConfig {
        &self.config
    }

    /// Credit whole refill intervals elapsed since the last refill.
    ///
    /// Partial intervals are carried forward so the sustained rate never
    /// drifts below the configured one.
    fn refill(&self, state: &mut BucketState, now: Instant) {
        let elapsed = now.saturating_duration_since(state.last_refill);
        let refills = elapsed.as_nanos() / self.config.refill_interval.as_nanos();
        if refills == 0 {
            return;
        }

        let refills = u64::try_from(refills).unwrap_or(u64::MAX);
        let added = refills.saturating_mul(self.config.refill_amount);
        state.tokens = state.tokens.saturating_add(added).min(self.config.capacity);

        if state.tokens == self.config.capacity {
            state.last_refill = now;
        } else {
            // Not full, so `refills` is bounded by capacity / refill_amount.
            let whole = u32::try_from(refills).unwrap_or(u32::MAX);
            state.last_refill += self.config.refill_interval.saturating_mul(whole);
        }

        trace!(added, tokens = state.tokens, "token bucket refilled");
    }

    /// Try to acquire the specified number of tokens
    ///
    /// Returns `true` if tokens were acquired, `false` if not enough tokens
    /// available. Never waits.
    pub fn try_acquire(&self, tokens: u64) -> bool {
        let now = self.clock.now();
        let mut state = self.state.lock();
        self.refill(&mut state, now);

        if state.tokens < tokens {
            debug!(available = state.tokens, requested = tokens, "rate limit: insufficient tokens");
            return false;
        }

        state.tokens -= tokens;
        trace!(acquired = tokens, remaining = state.tokens, "tokens acquired");
        true
    }

    /// Time until `tokens` tokens will be available, `Duration::ZERO` if they
    /// already are.
    pub fn time_until_available(&self, tokens: u64) -> Duration {
        let now = self.clock.now();
        let mut state = self.state.lock();
        self.refill(&mut state, now);

        if state.tokens >= tokens {
            return Duration::ZERO;
        }

        let deficit = tokens - state.tokens;
        let refills = deficit.div_ceil(self.config.refill_amount);
        let refills = u32::try_from(refills).unwrap_or(u32::MAX);
        let ready_at = state.last_refill + self.config.refill_interval.saturating_mul(refills);
        ready_at.saturating_duration_since(now)
    }

    /// Wait until one token can be taken, then take it.
    ///
    /// Fails with [`ResilienceError::Cancelled`] as soon as `cancel` fires,
    /// including when it has already fired before the call. No token is
    /// consumed on cancellation.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<(), ResilienceError> {
        loop {
            if cancel.is_cancelled() {
                return Err(ResilienceError::Cancelled);
            }
            if self.try_acquire(1) {
                return Ok(());
            }

            let wait = self.time_until_available(1).max(Duration::from_millis(1));
            debug!(wait_ms = wait.as_millis() as u64, "waiting for token bucket refill");

            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(ResilienceError::Cancelled),
                () = tokio::time::sleep(wait) => {}
            }
        }
    }

    /// Get the current number of available tokens
    pub fn available_tokens(&self) -> u64 {
        let now = self.clock.now();
        let mut state = self.state.lock();
        self.refill(&mut state, now);
        state.tokens
    }

    /// Reset the limiter to full capacity
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.tokens = self.config.capacity;
        state.last_refill = self.clock.now();
    }
}

impl TokenBucket<SystemClock> {
    /// Create a new token bucket with system clock
    pub fn new(
        capacity: u64,
        refill_amount: u64,
        refill_interval: Duration,
    ) -> Result<Self, String> {
        Self::with_clock(capacity, refill_amount, refill_interval, SystemClock)
    }
}

impl<C: Clock> Clone for TokenBucket<C> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            state: Arc::clone(&self.state),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<C: Clock> std::fmt::Debug for TokenBucket<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenBucket")
            .field("capacity", &self.config.capacity)
            .field("refill_amount", &self.config.refill_amount)
            .field("refill_interval", &self.config.refill_interval)
            .field("tokens", &self.state.lock().tokens)
            .finish()
    }
}
