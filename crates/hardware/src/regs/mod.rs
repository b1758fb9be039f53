//! Register map.
//!
//! A thin declarative map of the offsets and bit fields bring-up touches:
//! 1. **Fields:** `Field`, a shift/width pair with get/set helpers.
//! 2. **DEVICE:** Control and status registers of the DEVICE block.
//! 3. **MII:** PHY registers reached through the MDIO controller.
//! 4. **Memory map:** Region bases and sizes as seen from the APE.

/// DEVICE block registers.
pub mod device;

/// Bit field descriptor.
pub mod field;

/// Region bases and sizes.
pub mod memory_map;

/// MII registers.
pub mod mii;

pub use field::Field;
