//! Remote API access for Tallyline
//!
//! This module provides the quota-aware dispatcher and the typed layers
//! built on it.
//!
//! # Architecture
//!
//! - [`ApiClient`] is the single chokepoint: quota gates, URL and header
//!   construction, one HTTP exchange, outcome classification
//! - [`EntityService`] and [`BatchService`] only build requests and decode
//!   responses
//! - Credentials arrive per call in a [`RequestContext`]; token refresh is
//!   the job of an [`AccessTokenProvider`] outside this crate
//! - No retries: every failure reaches the caller as a `TallyError`

pub mod auth;
pub mod batch;
pub mod client;
pub mod entities;
pub mod errors;
pub mod request;

pub use auth::{AccessTokenProvider, StaticTokenProvider};
pub use batch::BatchService;
pub use client::{ApiClient, ApiClientBuilder};
pub use entities::EntityService;
pub use errors::{classify_response, decode_json, request_failure};
pub use request::{ApiRequest, RequestContext};
