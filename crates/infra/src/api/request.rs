//! Request descriptors and per-call context
//!
//! An [`ApiRequest`] says what to send; a [`RequestContext`] says on whose
//! behalf and under which quota policy.

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use tallyline_core::AcquireMode;
use tallyline_domain::{BearerToken, RealmId, Result, TallyError};
use tokio_util::sync::CancellationToken;

use super::auth::AccessTokenProvider;

/// Method, realm-relative path, query parameters and optional JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path below `/v3/company/<realm>/`, e.g. `invoice/130`.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self { method, path: path.into(), query: Vec::new(), body: None }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Attach `payload` serialized as JSON.
    ///
    /// # Errors
    /// Returns `TallyError::InvalidRequest` if `payload` cannot be serialized.
    pub fn with_json<T: Serialize + ?Sized>(self, payload: &T) -> Result<Self> {
        let body = serde_json::to_value(payload)
            .map_err(|e| TallyError::InvalidRequest(format!("cannot serialize payload: {e}")))?;
        Ok(self.with_body(body))
    }
}

/// Who a call is for, and how it behaves under quota pressure.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub realm: RealmId,
    pub token: BearerToken,
    pub mode: AcquireMode,
    pub cancel: CancellationToken,
}

impl RequestContext {
    /// Fail-fast context with a fresh, never-cancelled token.
    pub fn new(realm: RealmId, token: BearerToken) -> Self {
        Self { realm, token, mode: AcquireMode::default(), cancel: CancellationToken::new() }
    }

    /// Context for `realm` with a credential from `provider`.
    ///
    /// # Errors
    /// Whatever the provider reports.
    pub async fn from_provider(provider: &dyn AccessTokenProvider, realm: RealmId) -> Result<Self> {
        let token = provider.access_token(&realm).await?;
        Ok(Self::new(realm, token))
    }

    #[must_use]
    pub fn with_mode(mut self, mode: AcquireMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn waiting(self) -> Self {
        self.with_mode(AcquireMode::Wait)
    }

    #[must_use]
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_request_builders() {
        let request = ApiRequest::get("query")
            .with_query("query", "SELECT * FROM Term")
            .with_query("include", "enhancedAllCustomFields");

        assert_eq!(request.method, Method::GET);
        assert_eq!(request.path, "query");
        assert_eq!(request.query.len(), 2);
        assert!(request.body.is_none());
    }

    #[test]
    fn test_with_json_serializes_payload() {
        #[derive(Serialize)]
        #[serde(rename_all = "PascalCase")]
        struct Payload {
            display_name: &'static str,
        }

        let request = ApiRequest::post("customer").with_json(&Payload { display_name: "Amy" }).unwrap();
        assert_eq!(request.body, Some(json!({ "DisplayName": "Amy" })));
    }

    #[test]
    fn test_context_defaults_to_fail_fast() {
        let ctx = RequestContext::new(RealmId::new("1").unwrap(), BearerToken::new("t"));
        assert_eq!(ctx.mode, AcquireMode::FailFast);
        assert!(!ctx.cancel.is_cancelled());
        assert_eq!(ctx.waiting().mode, AcquireMode::Wait);
    }
}
