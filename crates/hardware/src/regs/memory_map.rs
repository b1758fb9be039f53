//! Base addresses and sizes of the regions the bring-up sequence touches, as
//! seen from the APE.

use crate::common::PhysAddr;

/// DEVICE register block.
pub const DEVICE_BASE: PhysAddr = PhysAddr::new(0xC000_0000);
/// Size of the DEVICE register block in bytes.
pub const DEVICE_SIZE: u32 = 0x8000;

/// Window onto NIC SRAM.
pub const NIC_SRAM_BASE: PhysAddr = PhysAddr::new(0xC001_0000);

/// General communication region.
pub const GEN_BASE: PhysAddr = NIC_SRAM_BASE.offset(0x0B50);
/// Size of the general communication region in bytes.
pub const GEN_SIZE: u32 = 0x04B0;

/// Side-data (send BD) cache.
pub const SDBCACHE_BASE: PhysAddr = NIC_SRAM_BASE.offset(0x1000);
/// Size of the side-data cache in bytes.
pub const SDBCACHE_SIZE: u32 = 0x1000;

/// Receive mbuf pool.
pub const RXMBUF_BASE: PhysAddr = PhysAddr::new(0xC002_0000);
/// Size of the receive mbuf pool in bytes.
pub const RXMBUF_SIZE: u32 = 0x2000;

/// Transmit mbuf pool.
pub const TXMBUF_BASE: PhysAddr = PhysAddr::new(0xC003_0000);
/// Size of the transmit mbuf pool in bytes.
pub const TXMBUF_SIZE: u32 = 0x2000;

/// APE receive port 1 buffer.
pub const RX_PORT1_BASE: PhysAddr = PhysAddr::new(0xA000_4000);
/// Number of 32-bit entries in the receive port 1 buffer.
pub const RX_PORT1_ENTRIES: usize = 4096;
