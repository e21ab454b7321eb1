//! Error types used throughout the client
//!
//! Every dispatched call resolves to a value or to exactly one
//! [`TallyError`] kind, so callers can branch on the failure without string
//! matching.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::RealmId;

/// The quota dimension a local gate rejected a call on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaLimit {
    GlobalThroughput,
    GlobalConcurrency,
    RealmThroughput,
    RealmConcurrency,
    RealmBatchThroughput,
}

impl QuotaLimit {
    /// Whether the limit is partitioned per realm.
    pub const fn is_realm_scoped(self) -> bool {
        matches!(self, Self::RealmThroughput | Self::RealmConcurrency | Self::RealmBatchThroughput)
    }
}

crate::impl_wire_name_conversions!(QuotaLimit {
    GlobalThroughput => "global_throughput",
    GlobalConcurrency => "global_concurrency",
    RealmThroughput => "realm_throughput",
    RealmConcurrency => "realm_concurrency",
    RealmBatchThroughput => "realm_batch_throughput",
});

/// A non-success response from the remote service that is not a 429.
///
/// When the body carried a structured fault, the fields mirror its first
/// `Error` entry; otherwise `message` holds the raw body.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RequestFailure {
    pub status: u16,
    pub fault_code: Option<String>,
    pub element: Option<String>,
    pub message: String,
    pub detail: Option<String>,
    pub fault_type: Option<String>,
}

impl fmt::Display for RequestFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "status {}", self.status)?;
        if let Some(code) = &self.fault_code {
            write!(f, ", code {code}")?;
        }
        if let Some(element) = self.element.as_deref().filter(|e| !e.is_empty()) {
            write!(f, ", element {element}")?;
        }
        write!(f, ": {}", self.message)?;
        if let Some(detail) = self.detail.as_deref().filter(|d| !d.is_empty()) {
            write!(f, " ({detail})")?;
        }
        Ok(())
    }
}

/// Main error type for Tallyline
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TallyError {
    #[error("Global throughput quota exceeded")]
    GlobalThroughputExceeded,

    #[error("Global concurrency quota exceeded")]
    GlobalConcurrencyExceeded,

    #[error("Throughput quota exceeded for realm {realm}")]
    RealmThroughputExceeded { realm: RealmId },

    #[error("Concurrency quota exceeded for realm {realm}")]
    RealmConcurrencyExceeded { realm: RealmId },

    #[error("Batch throughput quota exceeded for realm {realm}")]
    RealmBatchThroughputExceeded { realm: RealmId },

    #[error("Remote service rate limited realm {realm}")]
    RemoteRateLimited { realm: RealmId, retry_after_secs: Option<u64> },

    #[error("Request cancelled")]
    Cancelled,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request failed: {0}")]
    RequestFailure(Box<RequestFailure>),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl TallyError {
    /// Build the local rejection error for `limit`.
    ///
    /// `realm` is ignored for the global dimensions.
    pub fn quota_exceeded(limit: QuotaLimit, realm: &RealmId) -> Self {
        match limit {
            QuotaLimit::GlobalThroughput => Self::GlobalThroughputExceeded,
            QuotaLimit::GlobalConcurrency => Self::GlobalConcurrencyExceeded,
            QuotaLimit::RealmThroughput => Self::RealmThroughputExceeded { realm: realm.clone() },
            QuotaLimit::RealmConcurrency => Self::RealmConcurrencyExceeded { realm: realm.clone() },
            QuotaLimit::RealmBatchThroughput => {
                Self::RealmBatchThroughputExceeded { realm: realm.clone() }
            }
        }
    }

    /// The dimension a local gate rejected on, if this is a local rejection.
    pub const fn quota_limit(&self) -> Option<QuotaLimit> {
        match self {
            Self::GlobalThroughputExceeded => Some(QuotaLimit::GlobalThroughput),
            Self::GlobalConcurrencyExceeded => Some(QuotaLimit::GlobalConcurrency),
            Self::RealmThroughputExceeded { .. } => Some(QuotaLimit::RealmThroughput),
            Self::RealmConcurrencyExceeded { .. } => Some(QuotaLimit::RealmConcurrency),
            Self::RealmBatchThroughputExceeded { .. } => Some(QuotaLimit::RealmBatchThroughput),
            _ => None,
        }
    }

    /// True when a local gate rejected the call before any HTTP exchange.
    pub const fn is_local_rejection(&self) -> bool {
        self.quota_limit().is_some()
    }

    /// True for local rejections and remote 429s alike.
    pub const fn is_rate_limited(&self) -> bool {
        self.is_local_rejection() || matches!(self, Self::RemoteRateLimited { .. })
    }

    /// The parsed failure of a non-success response, if any.
    pub fn request_failure(&self) -> Option<&RequestFailure> {
        match self {
            Self::RequestFailure(failure) => Some(failure),
            _ => None,
        }
    }

    /// Realm the failure is attributed to, when it is realm scoped.
    pub const fn realm(&self) -> Option<&RealmId> {
        match self {
            Self::RealmThroughputExceeded { realm }
            | Self::RealmConcurrencyExceeded { realm }
            | Self::RealmBatchThroughputExceeded { realm }
            | Self::RemoteRateLimited { realm, .. } => Some(realm),
            _ => None,
        }
    }
}

impl From<RequestFailure> for TallyError {
    fn from(failure: RequestFailure) -> Self {
        Self::RequestFailure(Box::new(failure))
    }
}

impl From<serde_json::Error> for TallyError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Result type alias for Tallyline operations
pub type Result<T> = std::result::Result<T, TallyError>;
