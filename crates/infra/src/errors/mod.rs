//! Conversions from transport-level errors into the domain taxonomy.

pub mod conversions;

pub use conversions::InfraError;
