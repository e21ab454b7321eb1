//! # Tallyline Domain
//!
//! Wire types and domain models for the Tallyline accounting client.
//!
//! This crate contains:
//! - The closed error taxonomy ([`TallyError`]) and its `Result` alias
//! - Client and quota configuration structures
//! - Realm identifiers and bearer credentials
//! - Entity models, query/batch/change-data-capture envelopes and fault bodies
//!
//! ## Architecture
//! - No dependencies on other Tallyline crates
//! - No I/O; everything here is plain data plus serde mappings

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
