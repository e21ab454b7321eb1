//! HTTP transport
//!
//! A thin wrapper over `reqwest` that owns timeouts and the user agent, plus
//! response-body decompression. It never retries: every failure is reported
//! to the dispatcher as-is.

pub mod client;
pub mod encoding;

pub use client::{HttpClient, HttpClientBuilder};
pub use encoding::{decode_content, is_gzip};
