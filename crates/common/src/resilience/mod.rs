//! Admission-control primitives for outbound calls
//!
//! This module provides **generic, reusable** limiting primitives:
//! - **Token Bucket**: throughput limiting with bursts up to a capacity
//! - **Bulkhead**: a counting semaphore bounding in-flight operations
//!
//! Both are safe for concurrent use without external locking and offer a
//! non-waiting `try_acquire` plus a waiting `acquire` that observes a
//! [`CancellationToken`](tokio_util::sync::CancellationToken).
//!
//! ## Architecture: Generic Library vs Domain-Specific Policy
//!
//! Nothing here knows about accounts, realms or HTTP. The quota policy built
//! from these primitives (which limiter guards which dimension, acquisition
//! order, error attribution) lives in `tallyline-core`.

pub mod bulkhead;
pub mod clock;
pub mod rate_limiter;

use thiserror::Error;

pub use bulkhead::{Bulkhead, BulkheadConfig, BulkheadConfigBuilder, BulkheadMetrics, BulkheadPermit};
pub use clock::{Clock, MockClock, SystemClock};
pub use rate_limiter::{TokenBucket, TokenBucketConfig, TokenBucketConfigBuilder};

/// Failures of the waiting acquisition paths
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResilienceError {
    /// The caller's cancellation signal fired before capacity was obtained
    #[error("cancelled while waiting for capacity")]
    Cancelled,

    /// The underlying semaphore was closed
    #[error("limiter closed")]
    Closed,
}
