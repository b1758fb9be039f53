//! Common types shared by every layer of the crate.
//!
//! This module provides:
//! 1. **Address Types:** The `PhysAddr` newtype for the APE's 32-bit address space.
//! 2. **Access Kinds:** Read/write tags for errors and trace events.
//! 3. **Error Handling:** The crate-wide `Error` enum and `Result` alias.
//! 4. **Polling:** Bounded retry with cancellation, used by every wait.

/// Address type definitions.
pub mod addr;

/// Register access kind definitions.
pub mod data;

/// Error types.
pub mod error;

/// Bounded polling and cancellation tokens.
pub mod poll;

pub use addr::PhysAddr;
pub use data::AccessKind;
pub use error::{Error, Result};
pub use poll::{CancelToken, PollPolicy, Retry, retry};
