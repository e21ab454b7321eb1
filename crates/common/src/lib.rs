//! Generic utilities shared across Tallyline crates.
//!
//! # Feature Tiers
//!
//! - `runtime`: async admission-control primitives (token bucket, bulkhead,
//!   clock abstraction). Pulls in tokio and tracing.
//!
//! Nothing in this crate knows about the accounting API; domain policy lives
//! in `tallyline-core`.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod resilience;

#[cfg(feature = "runtime")]
pub use resilience::{
    Bulkhead, BulkheadConfig, BulkheadPermit, Clock, MockClock, ResilienceError, SystemClock,
    TokenBucket, TokenBucketConfig,
};
