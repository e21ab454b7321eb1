//! Access token seam
//!
//! Token acquisition and refresh live outside this crate. The dispatcher only
//! needs a bearer credential per call, which callers obtain through
//! [`AccessTokenProvider`].

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tallyline_domain::{BearerToken, RealmId, Result, TallyError};
use tracing::debug;

/// Trait for providing access tokens
///
/// This trait allows dependency injection and testing with mock providers.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// A currently valid token for `realm`.
    async fn access_token(&self, realm: &RealmId) -> Result<BearerToken>;
}

/// Serves fixed tokens, optionally one per realm.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenProvider {
    default: Option<BearerToken>,
    per_realm: HashMap<RealmId, BearerToken>,
}

impl StaticTokenProvider {
    /// Serve `token` for every realm.
    pub fn new(token: BearerToken) -> Self {
        Self { default: Some(token), per_realm: HashMap::new() }
    }

    #[must_use]
    pub fn with_realm(mut self, realm: RealmId, token: BearerToken) -> Self {
        self.per_realm.insert(realm, token);
        self
    }
}

#[async_trait]
impl AccessTokenProvider for StaticTokenProvider {
    async fn access_token(&self, realm: &RealmId) -> Result<BearerToken> {
        let token = self.per_realm.get(realm).or(self.default.as_ref()).ok_or_else(|| {
            TallyError::InvalidRequest(format!("no access token configured for realm {realm}"))
        })?;

        if token.is_expired_at(Utc::now()) {
            debug!(%realm, "configured access token has expired");
            return Err(TallyError::InvalidRequest(format!("access token for realm {realm} has expired")));
        }

        Ok(token.clone())
    }
}
