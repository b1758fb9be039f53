//! Shared test infrastructure.

/// Fake access strategies and backends.
pub mod fakes;


/// `mockall` mocks.
pub mod mocks;
