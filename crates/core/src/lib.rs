//! # Tallyline Core
//!
//! Quota policy layer - no HTTP or I/O.
//!
//! This crate contains:
//! - The global quota gate shared by every realm
//! - Per-realm quota trackers and the registry that owns them
//! - The advisory remote-throttle monitor
//!
//! ## Architecture Principles
//! - Builds on the generic primitives in `tallyline-common`
//! - Reports failures in the `tallyline-domain` error taxonomy
//! - All state is owned by an instance; nothing is process-global

pub mod quota;

pub use quota::{
    AcquireMode, GatePermit, GlobalQuotaGate, QuotaRegistry, QuotaSnapshot, RealmPermit,
    RealmQuotaTracker, RemoteThrottleMonitor,
};
