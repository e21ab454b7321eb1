//! Quota-aware request dispatcher
//!
//! Every API operation funnels through [`ApiClient::dispatch`] (or its batch
//! and discard variants). A call takes the global gate, then the realm's
//! throughput token and concurrency slot, performs one HTTP exchange under
//! the caller's cancellation token, and classifies the outcome. Slots are
//! held by scoped permits and released on every exit path.

use reqwest::header::{ACCEPT, ACCEPT_ENCODING, AUTHORIZATION, CONTENT_TYPE};
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use tallyline_core::{GlobalQuotaGate, QuotaRegistry, QuotaSnapshot, RemoteThrottleMonitor};
use tallyline_domain::constants::DEFAULT_USER_AGENT;
use tallyline_domain::{BearerToken, ClientConfig, RealmId, Result, TallyError};
use tracing::{debug, instrument};
use url::Url;

use super::batch::BatchService;
use super::entities::EntityService;
use super::errors::{classify_response, decode_json};
use super::request::{ApiRequest, RequestContext};
use crate::errors::InfraError;
use crate::http::HttpClient;

/// API client owning its own quota state
///
/// Quotas are per instance: two clients in one process never share a gate
/// or a realm tracker.
#[derive(Debug)]
pub struct ApiClient {
    http: HttpClient,
    config: ClientConfig,
    base_url: Url,
    gate: GlobalQuotaGate,
    registry: QuotaRegistry,
    throttle: RemoteThrottleMonitor,
}

impl ApiClient {
    /// Create a new API client
    ///
    /// # Errors
    ///
    /// Returns `TallyError::Config` if the configuration is invalid or the
    /// HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT))
            .build()?;
        Self::with_http_client(config, http)
    }

    /// Create a client around an existing transport.
    ///
    /// # Errors
    ///
    /// Returns `TallyError::Config` if the configuration is invalid.
    pub fn with_http_client(config: ClientConfig, http: HttpClient) -> Result<Self> {
        config.validate()?;

        let base_url = Url::parse(config.base_url.trim())
            .map_err(|e| TallyError::Config(format!("invalid base_url {}: {e}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(TallyError::Config(format!("base_url {base_url} cannot carry a path")));
        }

        let gate = GlobalQuotaGate::new(&config.quotas.global)?;
        let registry = QuotaRegistry::new(config.quotas.clone())?;

        Ok(Self {
            http,
            config,
            base_url,
            gate,
            registry,
            throttle: RemoteThrottleMonitor::default(),
        })
    }

    /// Create a builder for fluent configuration
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Typed create/read/update/delete operations.
    pub const fn entities(&self) -> EntityService<'_> {
        EntityService::new(self)
    }

    /// Chunked batch execution.
    pub const fn batch(&self) -> BatchService<'_> {
        BatchService::new(self)
    }

    /// Dispatch `request` and decode the response body into `R`.
    ///
    /// # Errors
    ///
    /// Any kind of the error taxonomy: local quota rejections in fail-fast
    /// mode, `Cancelled`, `Transport`, `RemoteRateLimited`,
    /// `RequestFailure` or `Decode`.
    #[instrument(
        skip(self, request, ctx),
        fields(realm = %ctx.realm, method = %request.method, path = %request.path)
    )]
    pub async fn dispatch<R: DeserializeOwned>(
        &self,
        request: &ApiRequest,
        ctx: &RequestContext,
    ) -> Result<R> {
        let body = self.execute(request, ctx).await?;
        decode_json(&body)
    }

    /// Dispatch `request` and ignore the response body.
    ///
    /// # Errors
    ///
    /// As [`Self::dispatch`], minus `Decode`.
    #[instrument(
        skip(self, request, ctx),
        fields(realm = %ctx.realm, method = %request.method, path = %request.path)
    )]
    pub async fn dispatch_discard(&self, request: &ApiRequest, ctx: &RequestContext) -> Result<()> {
        self.execute(request, ctx).await.map(drop)
    }

    /// Dispatch a batch call.
    ///
    /// Waits on the realm's batch limiter before taking any other quota,
    /// whatever the context's acquisition mode.
    ///
    /// # Errors
    ///
    /// As [`Self::dispatch`].
    #[instrument(
        skip(self, request, ctx),
        fields(realm = %ctx.realm, method = %request.method, path = %request.path)
    )]
    pub async fn dispatch_batch<R: DeserializeOwned>(
        &self,
        request: &ApiRequest,
        ctx: &RequestContext,
    ) -> Result<R> {
        let tracker = self.registry.get_or_create(&ctx.realm)?;
        tracker.acquire_batch(&ctx.cancel).await?;
        let body = self.execute(request, ctx).await?;
        decode_json(&body)
    }

    /// Free global and realm capacity right now.
    pub fn quota_snapshot(&self, realm: &RealmId) -> QuotaSnapshot {
        let tracker = self.registry.get(realm);
        QuotaSnapshot {
            global_slots: self.gate.available_slots(),
            global_tokens: self.gate.available_tokens(),
            realm_slots: tracker.as_ref().map(|t| t.available_slots()),
            realm_tokens: tracker.as_ref().map(|t| t.available_tokens()),
        }
    }

    /// Whether the service returned a 429 within the last minute.
    ///
    /// Advisory only; dispatch never consults it.
    pub fn is_cooling_down(&self) -> bool {
        self.throttle.is_cooling_down()
    }

    /// Number of 429 responses seen by this client.
    pub fn remote_throttle_count(&self) -> u64 {
        self.throttle.total_throttled()
    }

    /// `<base>/v3/company/<realm>/<path>?minorversion=<v>&<query>`
    ///
    /// # Errors
    ///
    /// Returns `TallyError::InvalidRequest` if the base URL cannot take path
    /// segments.
    pub fn url_for(&self, realm: &RealmId, request: &ApiRequest) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| TallyError::InvalidRequest(format!("{} cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(["v3", "company", realm.as_str()])
            .extend(request.path.split('/').filter(|segment| !segment.is_empty()));

        url.query_pairs_mut()
            .append_pair("minorversion", &self.config.minor_version)
            .extend_pairs(request.query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        Ok(url)
    }

    async fn execute(&self, request: &ApiRequest, ctx: &RequestContext) -> Result<Vec<u8>> {
        // Both permits live until this function returns.
        let _global = self.gate.acquire(ctx.mode, &ctx.cancel).await?;
        let tracker = self.registry.get_or_create(&ctx.realm)?;
        let _realm = tracker.acquire(ctx.mode, &ctx.cancel).await?;

        if ctx.cancel.is_cancelled() {
            return Err(TallyError::Cancelled);
        }

        let url = self.url_for(&ctx.realm, request)?;
        let builder = self.build_request(url, request, &ctx.token)?;

        let exchange = async {
            let response = self.http.send(builder).await?;
            let status = response.status();
            let headers = response.headers().clone();
            let body = response.bytes().await.map_err(InfraError::from)?;
            Ok::<_, TallyError>((status, headers, body))
        };

        let (status, headers, body) = tokio::select! {
            biased;
            () = ctx.cancel.cancelled() => {
                debug!("call cancelled during transport");
                return Err(TallyError::Cancelled);
            }
            result = exchange => result?,
        };

        let outcome = classify_response(&ctx.realm, status, &headers, &body);
        match &outcome {
            Ok(body) => debug!(status = status.as_u16(), bytes = body.len(), "request succeeded"),
            Err(TallyError::RemoteRateLimited { .. }) => self.throttle.record(&ctx.realm),
            Err(err) => debug!(status = status.as_u16(), error = %err, "request failed"),
        }
        outcome
    }

    fn build_request(
        &self,
        url: Url,
        request: &ApiRequest,
        token: &BearerToken,
    ) -> Result<RequestBuilder> {
        let mut builder = self
            .http
            .request(request.method.clone(), url)
            .header(ACCEPT, "application/json")
            .header(AUTHORIZATION, format!("Bearer {}", token.secret()));

        if self.config.request_gzip {
            builder = builder.header(ACCEPT_ENCODING, "gzip");
        }

        if let Some(body) = &request.body {
            let bytes = serde_json::to_vec(body)
                .map_err(|e| TallyError::InvalidRequest(format!("cannot serialize body: {e}")))?;
            builder = builder.header(CONTENT_TYPE, "application/json").body(bytes);
        }

        Ok(builder)
    }
}

/// Builder for API client
#[derive(Debug, Default)]
pub struct ApiClientBuilder {
    config: Option<ClientConfig>,
    http: Option<HttpClient>,
}

impl ApiClientBuilder {
    /// Set the client configuration
    #[must_use]
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Point the client at `base_url`, keeping the rest of the configuration.
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        let mut config = self.config.take().unwrap_or_default();
        config.base_url = base_url.into();
        self.config = Some(config);
        self
    }

    /// Use a preconfigured transport instead of building one
    #[must_use]
    pub fn http_client(mut self, http: HttpClient) -> Self {
        self.http = Some(http);
        self
    }

    /// Build the API client
    ///
    /// # Errors
    ///
    /// Returns `TallyError::Config` if the configuration is invalid.
    pub fn build(self) -> Result<ApiClient> {
        let config = self.config.unwrap_or_default();
        match self.http {
            Some(http) => ApiClient::with_http_client(config, http),
            None => ApiClient::new(config),
        }
    }
}
