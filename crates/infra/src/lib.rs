//! # Tallyline Infrastructure
//!
//! Everything that touches the network or the filesystem.
//!
//! This crate contains:
//! - The HTTP transport and response decompression
//! - The quota-aware request dispatcher and typed error classifier
//! - Entity, batch and change-data-capture operations built on it
//! - Configuration loading from environment and files
//!
//! ## Architecture
//! - Quota policy comes from `tallyline-core`
//! - Wire types and the error taxonomy come from `tallyline-domain`
//! - The library never installs a tracing subscriber

pub mod api;
pub mod config;
pub mod errors;
pub mod http;

// Re-export commonly used items
pub use api::{
    AccessTokenProvider, ApiClient, ApiClientBuilder, ApiRequest, BatchService, EntityService,
    RequestContext, StaticTokenProvider,
};
pub use http::HttpClient;
pub use tallyline_core::AcquireMode;
