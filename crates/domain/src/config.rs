//! Client configuration
//!
//! Every field has a default matching the remote service's published
//! limits, so an empty JSON or TOML document is a valid configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BATCH_BURST, DEFAULT_BATCH_REQUESTS_PER_MINUTE, DEFAULT_BURST,
    DEFAULT_MAX_CONCURRENT, DEFAULT_MINOR_VERSION, DEFAULT_REQUESTS_PER_MINUTE,
    DEFAULT_TIMEOUT_SECS, MAX_CONCURRENT_LIMIT, PRODUCTION_ENDPOINT, SANDBOX_ENDPOINT,
};
use crate::errors::{Result, TallyError};

/// Top-level client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base endpoint, without the `/v3/company` suffix.
    pub base_url: String,
    pub minor_version: String,
    pub timeout_secs: u64,
    /// Send `Accept-Encoding: gzip` and decompress responses.
    pub request_gzip: bool,
    pub user_agent: Option<String>,
    pub quotas: QuotaConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: PRODUCTION_ENDPOINT.to_string(),
            minor_version: DEFAULT_MINOR_VERSION.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            request_gzip: true,
            user_agent: None,
            quotas: QuotaConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Configuration pointed at `base_url` with every other field defaulted.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), ..Self::default() }
    }

    /// Configuration for the sandbox environment.
    pub fn sandbox() -> Self {
        Self::with_base_url(SANDBOX_ENDPOINT)
    }

    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate the configuration
    ///
    /// # Errors
    /// Returns `TallyError::Config` when the base URL or minor version is
    /// empty, the timeout is zero, or any quota is zero.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(TallyError::Config("base_url must not be empty".into()));
        }
        if self.minor_version.trim().is_empty() {
            return Err(TallyError::Config("minor_version must not be empty".into()));
        }
        if self.timeout_secs == 0 {
            return Err(TallyError::Config("timeout_secs must be greater than 0".into()));
        }
        self.quotas.validate()
    }
}

/// Quota limits enforced locally before any request leaves the process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct QuotaConfig {
    /// Aggregate limits shared by every realm.
    pub global: LimitConfig,
    /// Limits applied to each realm independently.
    pub realm: LimitConfig,
    /// Slower throughput class for batch calls, per realm.
    pub batch: BatchLimitConfig,
}

impl QuotaConfig {
    /// # Errors
    /// Returns `TallyError::Config` naming the first invalid section.
    pub fn validate(&self) -> Result<()> {
        self.global.validate("global")?;
        self.realm.validate("realm")?;
        self.batch.validate()
    }
}

/// Throughput and concurrency limits for one scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitConfig {
    pub requests_per_minute: u32,
    pub burst: u32,
    pub max_concurrent: usize,
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: DEFAULT_REQUESTS_PER_MINUTE,
            burst: DEFAULT_BURST,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
        }
    }
}

impl LimitConfig {
    fn validate(&self, scope: &str) -> Result<()> {
        if self.requests_per_minute == 0 {
            return Err(TallyError::Config(format!(
                "{scope}.requests_per_minute must be greater than 0"
            )));
        }
        if self.burst == 0 {
            return Err(TallyError::Config(format!("{scope}.burst must be greater than 0")));
        }
        if self.max_concurrent == 0 {
            return Err(TallyError::Config(format!(
                "{scope}.max_concurrent must be greater than 0"
            )));
        }
        if self.max_concurrent > MAX_CONCURRENT_LIMIT {
            return Err(TallyError::Config(format!(
                "{scope}.max_concurrent must not exceed {MAX_CONCURRENT_LIMIT}"
            )));
        }
        Ok(())
    }
}

/// Throughput limit for batch calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchLimitConfig {
    pub requests_per_minute: u32,
    pub burst: u32,
}

impl Default for BatchLimitConfig {
    fn default() -> Self {
        Self { requests_per_minute: DEFAULT_BATCH_REQUESTS_PER_MINUTE, burst: DEFAULT_BATCH_BURST }
    }
}

impl BatchLimitConfig {
    fn validate(&self) -> Result<()> {
        if self.requests_per_minute == 0 || self.burst == 0 {
            return Err(TallyError::Config(
                "batch.requests_per_minute and batch.burst must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}
