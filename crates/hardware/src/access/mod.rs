//! Register access indirection.
//!
//! Register reads and writes never touch memory directly. Each register (or a
//! whole bank) is bound to a [`RegisterAccess`] strategy, and every access is
//! dispatched through it. This module provides:
//! 1. **Strategy trait:** `RegisterAccess`, implemented by the direct MMIO and mailbox backends.
//! 2. **Bindings:** Independent read and write slots that can be replaced at any time.
//! 3. **Registers and banks:** `Register` and the fixed-size `RegisterBank`.
//! 4. **Backends:** The `Backend` trait that hands out strategies for a given bank base.

/// Direct memory-mapped access strategy.
pub mod mmio;

/// Registers, banks, and their bindings.
pub mod register;

use std::sync::Arc;

use crate::common::{PhysAddr, Result};

pub use mmio::{MmioAccess, MmioBackend, MmioBus, MmioWindow};
pub use register::{Binding, Register, RegisterBank, WORD_STRIDE};

/// An access strategy bound to a register or bank.
///
/// The strategy carries the base address of the bank it serves; the register
/// supplies its offset. Implementations must be shareable, since one strategy
/// instance is typically bound to every entry of a bank.
pub trait RegisterAccess: Send + Sync {
    /// Returns a short name for trace output (e.g. `"mmio"`, `"mailbox"`).
    fn name(&self) -> &str;

    /// Returns the base address this strategy adds offsets to.
    fn base(&self) -> PhysAddr;

    /// Reads the register at `offset`.
    ///
    /// `cached` is the register's last acknowledged value; strategies are free
    /// to ignore it. The returned value is authoritative.
    ///
    /// # Errors
    ///
    /// Returns a strategy-specific error when the access cannot complete.
    fn read(&self, cached: u32, offset: u32) -> Result<u32>;

    /// Writes `value` to the register at `offset`.
    ///
    /// Returns the value the strategy reports as written, which becomes the
    /// register's acknowledged value and may differ from `value`.
    ///
    /// # Errors
    ///
    /// Returns a strategy-specific error when the access cannot complete.
    fn write(&self, value: u32, offset: u32) -> Result<u32>;
}

/// Source of access strategies for register banks.
///
/// One backend serves every bank of a chip; bring-up code never branches on
/// which backend it is talking to.
pub trait Backend {
    /// Returns a short name for trace output.
    fn name(&self) -> &str;

    /// Returns a strategy serving the bank that starts at `base`.
    fn access(&self, base: PhysAddr) -> Arc<dyn RegisterAccess>;
}

/// Assigns `bank` the strategy `backend` serves for the bank's base address.
///
/// Both directions share one strategy instance, and every entry without a
/// binding of its own routes through it. Rebinding with the same backend
/// yields an equivalent binding, so the operation is idempotent.
///
/// # Arguments
///
/// * `bank` - The bank to bind. Per-entry bindings are left in place.
/// * `backend` - Asked once for a strategy at `bank.base()`.
pub fn bind_bank(bank: &mut RegisterBank, backend: &dyn Backend) {
    let handler = backend.access(bank.base());
    tracing::debug!(
        bank = bank.name(),
        base = %bank.base(),
        entries = bank.len(),
        via = backend.name(),
        "bound register bank"
    );
    bank.install(&handler);
}
