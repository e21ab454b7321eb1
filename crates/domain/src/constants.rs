//! Application constants
//!
//! Endpoints, protocol versions and paging sizes shared by every layer.

// Endpoints
pub const PRODUCTION_ENDPOINT: &str = "https://quickbooks.api.intuit.com";
pub const SANDBOX_ENDPOINT: &str = "https://sandbox-quickbooks.api.intuit.com";

/// API minor version attached to every request as `minorversion`.
pub const DEFAULT_MINOR_VERSION: &str = "75";

// Request defaults
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_USER_AGENT: &str = concat!("tallyline/", env!("CARGO_PKG_VERSION"));

// Quota defaults (per minute / burst / in-flight)
pub const DEFAULT_REQUESTS_PER_MINUTE: u32 = 500;
pub const DEFAULT_BURST: u32 = 10;
pub const DEFAULT_MAX_CONCURRENT: usize = 10;
pub const DEFAULT_BATCH_REQUESTS_PER_MINUTE: u32 = 40;
pub const DEFAULT_BATCH_BURST: u32 = 5;
/// Largest in-flight ceiling a limiter accepts (tokio's semaphore maximum).
pub const MAX_CONCURRENT_LIMIT: usize = usize::MAX >> 3;

/// Maximum number of items the batch endpoint accepts in one call.
pub const BATCH_CHUNK_SIZE: usize = 30;
/// Page size used when walking a full result set.
pub const QUERY_PAGE_SIZE: u64 = 1000;

/// Window during which a remote 429 is reported as a cool-down.
pub const REMOTE_THROTTLE_WINDOW_SECS: u64 = 60;
