//! Simulated controller reachable through the mailbox.
//!
//! The executor side of the mailbox needs something to read and write. This module provides:
//! 1. **Devices:** The `Device` trait for components with a 32-bit register window.
//! 2. **Routing:** `SimBus`, which dispatches absolute addresses to devices.
//! 3. **Components:** Sparse RAM for the memory regions and a DEVICE block model with an MDIO controller.
//! 4. **Construction:** `build_bus`, which assembles the regions bring-up touches.
//!
//! The model is a black box that answers every command; it does not emulate
//! the controller's internal behaviour beyond what bring-up observes.

/// Address routing.
pub mod bus;

/// Device trait.
pub mod device;

/// Simulated components.
pub mod devices;

pub use bus::SimBus;
pub use device::Device;
pub use devices::{Board, DeviceBlock, SparseRam};

use crate::regs::memory_map;

/// Builds a bus holding the DEVICE block, the four zero-filled regions, and
/// the receive port 1 buffer.
///
/// # Arguments
///
/// * `device` - The DEVICE block model, already configured with its strap and faults.
pub fn build_bus(device: DeviceBlock) -> SimBus {
    let mut bus = SimBus::new();
    bus.add_device(Box::new(device));
    let regions = [
        ("GEN", memory_map::GEN_BASE, memory_map::GEN_SIZE),
        ("SDBCACHE", memory_map::SDBCACHE_BASE, memory_map::SDBCACHE_SIZE),
        ("RXMBUF", memory_map::RXMBUF_BASE, memory_map::RXMBUF_SIZE),
        ("TXMBUF", memory_map::TXMBUF_BASE, memory_map::TXMBUF_SIZE),
        (
            "RX_PORT1",
            memory_map::RX_PORT1_BASE,
            memory_map::RX_PORT1_ENTRIES as u32 * 4,
        ),
    ];
    for (name, base, size) in regions {
        bus.add_device(Box::new(SparseRam::new(name, base, size)));
    }
    bus
}
