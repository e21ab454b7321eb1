//! Global quota gate
//!
//! One throughput limiter and one concurrency ceiling shared by every realm
//! a client talks to. It is checked before any per-realm cost is paid.

use tallyline_common::resilience::{Bulkhead, BulkheadPermit, Clock, SystemClock, TokenBucket};
use tallyline_domain::{LimitConfig, QuotaLimit, Result, TallyError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{limit_throughput, wait_error, AcquireMode};

/// Holds one global concurrency slot until dropped.
#[derive(Debug)]
#[must_use = "the global slot is released as soon as the permit is dropped"]
pub struct GatePermit {
    _slot: BulkheadPermit,
}

pub struct GlobalQuotaGate<C: Clock = SystemClock> {
    throughput: TokenBucket<C>,
    concurrency: Bulkhead,
}

impl GlobalQuotaGate<SystemClock> {
    /// # Errors
    /// Returns `TallyError::Config` when any limit is zero.
    pub fn new(config: &LimitConfig) -> Result<Self> {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> GlobalQuotaGate<C> {
    /// # Errors
    /// Returns `TallyError::Config` when any limit is zero.
    pub fn with_clock(config: &LimitConfig, clock: C) -> Result<Self> {
        let throughput = TokenBucket::from_config(limit_throughput(config)?, clock)
            .map_err(TallyError::Config)?;
        let concurrency = Bulkhead::with_capacity(config.max_concurrent).map_err(TallyError::Config)?;
        Ok(Self { throughput, concurrency })
    }

    /// Take a concurrency slot and a throughput token.
    ///
    /// In [`AcquireMode::FailFast`] nothing waits: an exhausted dimension is
    /// reported as `GlobalConcurrencyExceeded` or `GlobalThroughputExceeded`.
    /// In [`AcquireMode::Wait`] both are awaited under `cancel`; on
    /// cancellation no slot is held.
    ///
    /// # Errors
    /// Returns the exhausted dimension in fail-fast mode, or
    /// `TallyError::Cancelled` when `cancel` fires while waiting.
    pub async fn acquire(&self, mode: AcquireMode, cancel: &CancellationToken) -> Result<GatePermit> {
        match mode {
            AcquireMode::FailFast => {
                let Some(slot) = self.concurrency.try_acquire() else {
                    warn!(limit = %QuotaLimit::GlobalConcurrency, "local quota rejected call");
                    return Err(TallyError::GlobalConcurrencyExceeded);
                };
                if !self.throughput.try_acquire(1) {
                    warn!(limit = %QuotaLimit::GlobalThroughput, "local quota rejected call");
                    return Err(TallyError::GlobalThroughputExceeded);
                }
                debug!(available_slots = self.concurrency.available_permits(), "global permit acquired");
                Ok(GatePermit { _slot: slot })
            }
            AcquireMode::Wait => {
                let slot = self.concurrency.acquire(cancel).await.map_err(wait_error)?;
                // Dropping `slot` on cancellation returns it.
                self.throughput.acquire(cancel).await.map_err(wait_error)?;
                debug!(available_slots = self.concurrency.available_permits(), "global permit acquired");
                Ok(GatePermit { _slot: slot })
            }
        }
    }

    /// Free global concurrency slots.
    pub fn available_slots(&self) -> usize {
        self.concurrency.available_permits()
    }

    /// Global throughput tokens available right now.
    pub fn available_tokens(&self) -> u64 {
        self.throughput.available_tokens()
    }
}

impl<C: Clock> std::fmt::Debug for GlobalQuotaGate<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalQuotaGate")
            .field("throughput", &self.throughput)
            .field("concurrency", &self.concurrency)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tallyline_common::resilience::MockClock;

    use super::*;

    fn limits(requests_per_minute: u32, burst: u32, max_concurrent: usize) -> LimitConfig {
        LimitConfig { requests_per_minute, burst, max_concurrent }
    }

    #[tokio::test]
    async fn test_fail_fast_reports_concurrency() {
        let gate = GlobalQuotaGate::with_clock(&limits(500, 10, 2), MockClock::new()).unwrap();
        let cancel = CancellationToken::new();

        let _a = gate.acquire(AcquireMode::FailFast, &cancel).await.unwrap();
        let _b = gate.acquire(AcquireMode::FailFast, &cancel).await.unwrap();
        let err = gate.acquire(AcquireMode::FailFast, &cancel).await.unwrap_err();

        assert_eq!(err, TallyError::GlobalConcurrencyExceeded);
        assert_eq!(gate.available_slots(), 0);
    }

    #[tokio::test]
    async fn test_fail_fast_reports_throughput_and_returns_slot() {
        let clock = MockClock::new();
        let gate = GlobalQuotaGate::with_clock(&limits(60, 2, 10), clock.clone()).unwrap();
        let cancel = CancellationToken::new();

        drop(gate.acquire(AcquireMode::FailFast, &cancel).await.unwrap());
        drop(gate.acquire(AcquireMode::FailFast, &cancel).await.unwrap());
        let err = gate.acquire(AcquireMode::FailFast, &cancel).await.unwrap_err();

        assert_eq!(err, TallyError::GlobalThroughputExceeded);
        assert_eq!(gate.available_slots(), 10);

        clock.advance(Duration::from_secs(1));
        assert!(gate.acquire(AcquireMode::FailFast, &cancel).await.is_ok());
    }

    #[tokio::test]
    async fn test_dropping_permit_restores_slot() {
        let gate = GlobalQuotaGate::new(&limits(500, 10, 1)).unwrap();
        let cancel = CancellationToken::new();

        let permit = gate.acquire(AcquireMode::FailFast, &cancel).await.unwrap();
        assert_eq!(gate.available_slots(), 0);
        drop(permit);
        assert_eq!(gate.available_slots(), 1);
    }

    #[tokio::test]
    async fn test_wait_cancelled_holds_nothing() {
        let gate = GlobalQuotaGate::new(&limits(500, 10, 1)).unwrap();
        let cancel = CancellationToken::new();
        let _held = gate.acquire(AcquireMode::FailFast, &cancel).await.unwrap();

        let waiter_cancel = CancellationToken::new();
        let trigger = waiter_cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let err = gate.acquire(AcquireMode::Wait, &waiter_cancel).await.unwrap_err();
        assert_eq!(err, TallyError::Cancelled);
        assert_eq!(gate.available_slots(), 0);
    }

    #[tokio::test]
    async fn test_cancel_while_waiting_for_throughput_returns_slot() {
        // One token per minute: the second call must wait for throughput.
        let gate = GlobalQuotaGate::new(&limits(1, 1, 5)).unwrap();
        let cancel = CancellationToken::new();
        drop(gate.acquire(AcquireMode::FailFast, &cancel).await.unwrap());

        let waiter_cancel = CancellationToken::new();
        let trigger = waiter_cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let err = gate.acquire(AcquireMode::Wait, &waiter_cancel).await.unwrap_err();
        assert_eq!(err, TallyError::Cancelled);
        assert_eq!(gate.available_slots(), 5);
    }

    #[test]
    fn test_zero_limits_are_config_errors() {
        assert!(matches!(GlobalQuotaGate::new(&limits(0, 10, 10)), Err(TallyError::Config(_))));
        assert!(matches!(GlobalQuotaGate::new(&limits(500, 10, 0)), Err(TallyError::Config(_))));
    }
}
