//! Per-realm quota bundle
//!
//! Three independent limiters per realm: general throughput, a concurrency
//! ceiling, and a slower throughput class used only by batch calls.

use tallyline_common::resilience::{Bulkhead, BulkheadPermit, Clock, SystemClock, TokenBucket};
use tallyline_domain::{BatchLimitConfig, LimitConfig, QuotaLimit, RealmId, Result, TallyError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{batch_throughput, limit_throughput, wait_error, AcquireMode};

/// Holds one realm concurrency slot until dropped.
#[derive(Debug)]
#[must_use = "the realm slot is released as soon as the permit is dropped"]
pub struct RealmPermit {
    _slot: BulkheadPermit,
}

pub struct RealmQuotaTracker<C: Clock = SystemClock> {
    realm: RealmId,
    general: TokenBucket<C>,
    concurrency: Bulkhead,
    batch: TokenBucket<C>,
}

impl<C: Clock + Clone> RealmQuotaTracker<C> {
    /// # Errors
    /// Returns `TallyError::Config` when any limit is zero.
    pub fn new(
        realm: RealmId,
        limits: &LimitConfig,
        batch: &BatchLimitConfig,
        clock: C,
    ) -> Result<Self> {
        let general = TokenBucket::from_config(limit_throughput(limits)?, clock.clone())
            .map_err(TallyError::Config)?;
        let concurrency = Bulkhead::with_capacity(limits.max_concurrent).map_err(TallyError::Config)?;
        let batch =
            TokenBucket::from_config(batch_throughput(batch)?, clock).map_err(TallyError::Config)?;
        Ok(Self { realm, general, concurrency, batch })
    }
}

impl<C: Clock> RealmQuotaTracker<C> {
    pub const fn realm(&self) -> &RealmId {
        &self.realm
    }

    fn reject(&self, limit: QuotaLimit) -> TallyError {
        warn!(realm = %self.realm, limit = %limit, "local quota rejected call");
        TallyError::quota_exceeded(limit, &self.realm)
    }

    /// Take one general throughput token.
    ///
    /// # Errors
    /// `RealmThroughputExceeded` in fail-fast mode, `Cancelled` while waiting.
    pub async fn acquire_general(&self, mode: AcquireMode, cancel: &CancellationToken) -> Result<()> {
        match mode {
            AcquireMode::FailFast if self.general.try_acquire(1) => Ok(()),
            AcquireMode::FailFast => Err(self.reject(QuotaLimit::RealmThroughput)),
            AcquireMode::Wait => self.general.acquire(cancel).await.map_err(wait_error),
        }
    }

    /// Take one concurrency slot, held until the returned permit drops.
    ///
    /// # Errors
    /// `RealmConcurrencyExceeded` in fail-fast mode, `Cancelled` while waiting.
    pub async fn acquire_concurrency(
        &self,
        mode: AcquireMode,
        cancel: &CancellationToken,
    ) -> Result<RealmPermit> {
        let slot = match mode {
            AcquireMode::FailFast => self
                .concurrency
                .try_acquire()
                .ok_or_else(|| self.reject(QuotaLimit::RealmConcurrency))?,
            AcquireMode::Wait => self.concurrency.acquire(cancel).await.map_err(wait_error)?,
        };
        debug!(realm = %self.realm, available_slots = self.concurrency.available_permits(), "realm permit acquired");
        Ok(RealmPermit { _slot: slot })
    }

    /// General token, then concurrency slot.
    ///
    /// # Errors
    /// See [`Self::acquire_general`] and [`Self::acquire_concurrency`].
    pub async fn acquire(&self, mode: AcquireMode, cancel: &CancellationToken) -> Result<RealmPermit> {
        self.acquire_general(mode, cancel).await?;
        self.acquire_concurrency(mode, cancel).await
    }

    /// Wait for a batch token. Batch calls always wait.
    ///
    /// # Errors
    /// `Cancelled` when `cancel` fires first.
    pub async fn acquire_batch(&self, cancel: &CancellationToken) -> Result<()> {
        self.batch.acquire(cancel).await.map_err(wait_error)?;
        debug!(realm = %self.realm, "realm batch token acquired");
        Ok(())
    }

    /// Non-waiting batch check, for callers that prefer to shed load.
    ///
    /// # Errors
    /// `RealmBatchThroughputExceeded` when no batch token is available.
    pub fn try_acquire_batch(&self) -> Result<()> {
        if self.batch.try_acquire(1) {
            Ok(())
        } else {
            Err(self.reject(QuotaLimit::RealmBatchThroughput))
        }
    }

    pub fn available_slots(&self) -> usize {
        self.concurrency.available_permits()
    }

    pub fn available_tokens(&self) -> u64 {
        self.general.available_tokens()
    }

    pub fn available_batch_tokens(&self) -> u64 {
        self.batch.available_tokens()
    }
}

impl<C: Clock> std::fmt::Debug for RealmQuotaTracker<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealmQuotaTracker")
            .field("realm", &self.realm)
            .field("general", &self.general)
            .field("concurrency", &self.concurrency)
            .field("batch", &self.batch)
            .finish()
    }
}
