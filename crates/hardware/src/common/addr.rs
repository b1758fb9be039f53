//! Physical address type.
//!
//! The APE sees the controller through a flat 32-bit address space. This module provides:
//! 1. **Type Safety:** A `PhysAddr` newtype so bank bases are never confused with offsets or values.
//! 2. **Address Arithmetic:** Offsetting a base by a register offset, as every access strategy does.

use std::fmt;

/// A physical address in the APE's 32-bit view of the controller.
///
/// Bank bases are carried as `PhysAddr` alongside the access strategy that
/// uses them; the effective address of a register is `base + offset`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PhysAddr(pub u32);

impl PhysAddr {
    /// Creates a new physical address from a raw 32-bit value.
    #[inline(always)]
    pub const fn new(addr: u32) -> Self {
        Self(addr)
    }

    /// Returns the raw 32-bit address value.
    #[inline(always)]
    pub const fn val(self) -> u32 {
        self.0
    }

    /// Returns the address `offset` bytes above this one.
    ///
    /// The APE address space is 32 bits wide, so the sum wraps the same way
    /// the hardware address adder does.
    #[inline(always)]
    pub const fn offset(self, offset: u32) -> Self {
        Self(self.0.wrapping_add(offset))
    }
}

impl fmt::Display for PhysAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

impl From<u32> for PhysAddr {
    fn from(addr: u32) -> Self {
        Self(addr)
    }
}
