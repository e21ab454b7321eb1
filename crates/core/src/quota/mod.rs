//! Local quota enforcement
//!
//! Every dispatched call takes, in this fixed order:
//! 1. a global concurrency slot and a global throughput token
//! 2. the realm's throughput token
//! 3. the realm's concurrency slot
//!
//! Batch calls additionally wait on the realm's batch limiter first.
//! Concurrency slots are returned when their permit is dropped, so every
//! exit path of a call releases what it took.

pub mod gate;
pub mod realm;
pub mod registry;
pub mod throttle;

use tallyline_common::resilience::{ResilienceError, TokenBucketConfig};
use tallyline_domain::{BatchLimitConfig, LimitConfig, TallyError};

pub use gate::{GatePermit, GlobalQuotaGate};
pub use realm::{RealmPermit, RealmQuotaTracker};
pub use registry::QuotaRegistry;
pub use throttle::RemoteThrottleMonitor;

/// How a call behaves when a quota is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AcquireMode {
    /// Reject immediately with the exhausted dimension.
    #[default]
    FailFast,
    /// Wait for capacity, giving up only on cancellation.
    Wait,
}

impl AcquireMode {
    pub const fn is_blocking(self) -> bool {
        matches!(self, Self::Wait)
    }
}

/// Free capacity at one instant, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaSnapshot {
    pub global_slots: usize,
    pub global_tokens: u64,
    /// `None` when the realm has not been seen yet.
    pub realm_slots: Option<usize>,
    pub realm_tokens: Option<u64>,
}

pub(crate) fn throughput_config(
    requests_per_minute: u32,
    burst: u32,
) -> Result<TokenBucketConfig, TallyError> {
    TokenBucketConfig::per_minute(requests_per_minute, u64::from(burst)).map_err(TallyError::Config)
}

pub(crate) fn limit_throughput(limit: &LimitConfig) -> Result<TokenBucketConfig, TallyError> {
    throughput_config(limit.requests_per_minute, limit.burst)
}

pub(crate) fn batch_throughput(limit: &BatchLimitConfig) -> Result<TokenBucketConfig, TallyError> {
    throughput_config(limit.requests_per_minute, limit.burst)
}

/// Attribute a waiting failure of the primitives to the caller.
pub(crate) fn wait_error(err: ResilienceError) -> TallyError {
    match err {
        // Limiter semaphores are never closed, so both mean the caller gave up.
        ResilienceError::Cancelled | ResilienceError::Closed => TallyError::Cancelled,
    }
}
