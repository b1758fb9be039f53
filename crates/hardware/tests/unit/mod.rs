//! # Unit Components
//!
//! Tests grouped by the module they exercise.




/// Configuration defaults and JSON parsing.
pub mod config;

/// Error display and step attribution.
pub mod error;

/// Mailbox protocol: round-trip, completion, timeout.
pub mod mailbox;

/// Direct MMIO windows and bus routing.
pub mod mmio;

/// Power budget translation.
pub mod power;
