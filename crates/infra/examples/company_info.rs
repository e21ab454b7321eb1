//! Example: Reading company settings for one realm
//!
//! Loads the client configuration, builds a client and prints the realm's
//! company name together with the quota capacity left after the call.
//!
//! # Setup
//!
//! ```bash
//! export TALLYLINE_BASE_URL=https://sandbox-quickbooks.api.intuit.com
//! export TALLYLINE_REALM_ID=4620816365
//! export TALLYLINE_ACCESS_TOKEN=<bearer token>
//! cargo run -p tallyline-infra --example company_info
//! ```

use anyhow::Context;
use tallyline_domain::{BearerToken, RealmId};
use tallyline_infra::{config, ApiClient, RequestContext, StaticTokenProvider};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tallyline=debug")),
        )
        .init();

    let config = config::load().context("no usable configuration")?;
    let realm = RealmId::new(std::env::var("TALLYLINE_REALM_ID").context("TALLYLINE_REALM_ID is not set")?)?;
    let token = std::env::var("TALLYLINE_ACCESS_TOKEN").context("TALLYLINE_ACCESS_TOKEN is not set")?;

    let provider = StaticTokenProvider::new(BearerToken::new(token));
    let client = ApiClient::new(config)?;
    let ctx = RequestContext::from_provider(&provider, realm.clone()).await?.waiting();

    let info = client.entities().company_info(&ctx).await?;
    println!("Company: {}", info.company_name.as_deref().unwrap_or("<unnamed>"));

    let snapshot = client.quota_snapshot(&realm);
    println!(
        "Capacity left: {} global slots, {:?} realm slots",
        snapshot.global_slots, snapshot.realm_slots
    );

    Ok(())
}
