//! MII (clause 22) register numbers and fields reached through MDIO.

use super::Field;

/// Basic mode control register.
pub const CONTROL: u8 = 0x00;
/// Auto-negotiation enable in [`CONTROL`].
pub const CONTROL_AUTO_NEGOTIATION_ENABLE: Field = Field::bit(12);

/// Block (page) select register. Reads back the active block.
pub const BLOCK_SELECT: u8 = 0x1F;

/// First register that is banked by the block select.
pub const FIRST_BANKED: u8 = 0x10;

/// Undocumented register used during function 0 bring-up.
pub const REG_15: u8 = 0x15;
/// Field of [`REG_15`] that must read back as [`REG_15_MODE_VALUE`].
pub const REG_15_MODE: Field = Field::new(0, 2);
/// Required value of [`REG_15_MODE`].
pub const REG_15_MODE_VALUE: u32 = 2;

/// Undocumented register used during function 0 bring-up.
pub const REG_1A: u8 = 0x1A;
/// Bit of [`REG_1A`] held set while block 0x8610 is programmed.
pub const REG_1A_BIT_14: u16 = 0x4000;

/// Block holding [`REG_1A`].
pub const BLOCK_8010: u16 = 0x8010;
/// Block holding [`REG_15`].
pub const BLOCK_8610: u16 = 0x8610;
/// Default block.
pub const BLOCK_0: u16 = 0x0000;

/// Number of registers addressable on one PHY.
pub const REGISTERS: usize = 32;
