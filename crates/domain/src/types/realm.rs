//! Realm identifiers and bearer credentials

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{Result, TallyError};

/// Opaque identifier of one remote tenant ("realm").
///
/// Used as the partition key for per-realm quota state and as a path
/// segment in every request URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RealmId(String);

impl RealmId {
    /// # Errors
    /// Returns `TallyError::InvalidRequest` for empty identifiers or ones
    /// that would escape their URL path segment.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(TallyError::InvalidRequest("realm id must not be empty".into()));
        }
        if id.contains(['/', '?', '#']) {
            return Err(TallyError::InvalidRequest(format!("realm id contains a reserved character: {id}")));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RealmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RealmId {
    type Error = TallyError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<RealmId> for String {
    fn from(value: RealmId) -> Self {
        value.0
    }
}

impl AsRef<str> for RealmId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Access token attached to outgoing requests.
///
/// Issued and refreshed elsewhere; this crate only reads the token value.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BearerToken {
    access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_at: Option<DateTime<Utc>>,
}

impl BearerToken {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self { access_token: access_token.into(), expires_at: None }
    }

    #[must_use]
    pub const fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn secret(&self) -> &str {
        &self.access_token
    }

    pub const fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// True when an expiry is known and has passed at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerToken")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
