//! Shared fixtures for dispatcher integration tests
//!
//! Each test binary uses a different subset of these helpers.

#![allow(dead_code)]

use tallyline_domain::{BearerToken, ClientConfig, LimitConfig, QuotaConfig, RealmId};
use tallyline_infra::{ApiClient, RequestContext};
use wiremock::MockServer;

pub const REALM: &str = "4620816365";
pub const TOKEN: &str = "test-access-token";

pub fn realm() -> RealmId {
    RealmId::new(REALM).expect("valid realm id")
}

/// Fail-fast context for [`REALM`].
pub fn ctx() -> RequestContext {
    RequestContext::new(realm(), BearerToken::new(TOKEN))
}

/// Path the dispatcher sends `rest` to.
pub fn company_path(rest: &str) -> String {
    format!("/v3/company/{REALM}/{rest}")
}

/// Default quotas pointed at `server`.
pub fn client_for(server: &MockServer) -> ApiClient {
    client_with_quotas(server, QuotaConfig::default())
}

pub fn client_with_quotas(server: &MockServer, quotas: QuotaConfig) -> ApiClient {
    let config = ClientConfig { quotas, ..ClientConfig::with_base_url(server.uri()) };
    ApiClient::new(config).expect("client should build")
}

/// Generous throughput with the given concurrency ceilings.
pub fn concurrency_quotas(global: usize, realm: usize) -> QuotaConfig {
    QuotaConfig {
        global: LimitConfig { requests_per_minute: 6_000, burst: 100, max_concurrent: global },
        realm: LimitConfig { requests_per_minute: 6_000, burst: 100, max_concurrent: realm },
        ..QuotaConfig::default()
    }
}
