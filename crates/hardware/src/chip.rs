//! Owned handle on the controller's register banks.
//!
//! Every bank bring-up touches lives here rather than in process-wide
//! statics, so a test can build a chip, attach it to whatever backend it
//! likes, and inspect it afterwards.

use crate::access::{Backend, RegisterBank, bind_bank};
use crate::regs::memory_map;

/// The register banks of one controller.
#[derive(Debug)]
pub struct Chip {
    /// DEVICE control and status registers.
    pub device: RegisterBank,
    /// General communication region.
    pub general: RegisterBank,
    /// Receive mbuf pool.
    pub rxmbuf: RegisterBank,
    /// Transmit mbuf pool.
    pub txmbuf: RegisterBank,
    /// Side-data cache.
    pub sdbcache: RegisterBank,
    /// APE receive port 1 buffer.
    pub rx_port1: RegisterBank,
}

impl Chip {
    /// Creates a chip with every bank unbound.
    pub fn new() -> Self {
        Self {
            device: RegisterBank::with_size(
                "DEVICE",
                memory_map::DEVICE_BASE,
                memory_map::DEVICE_SIZE,
            ),
            general: RegisterBank::with_size("GEN", memory_map::GEN_BASE, memory_map::GEN_SIZE),
            rxmbuf: RegisterBank::with_size(
                "RXMBUF",
                memory_map::RXMBUF_BASE,
                memory_map::RXMBUF_SIZE,
            ),
            txmbuf: RegisterBank::with_size(
                "TXMBUF",
                memory_map::TXMBUF_BASE,
                memory_map::TXMBUF_SIZE,
            ),
            sdbcache: RegisterBank::with_size(
                "SDBCACHE",
                memory_map::SDBCACHE_BASE,
                memory_map::SDBCACHE_SIZE,
            ),
            rx_port1: RegisterBank::new(
                "RX_PORT1",
                memory_map::RX_PORT1_BASE,
                memory_map::RX_PORT1_ENTRIES,
            ),
        }
    }

    /// Binds every bank to `backend`.
    ///
    /// Attaching again replaces the bank-wide strategies; per-entry bindings
    /// are kept.
    pub fn attach(&mut self, backend: &dyn Backend) {
        for bank in self.banks_mut() {
            bind_bank(bank, backend);
        }
        tracing::debug!(via = backend.name(), "chip attached");
    }

    /// Returns the four regions cleared before programming, in clearing order.
    pub const fn zero_fill_regions(&mut self) -> [&mut RegisterBank; 4] {
        [
            &mut self.general,
            &mut self.rxmbuf,
            &mut self.txmbuf,
            &mut self.sdbcache,
        ]
    }

    const fn banks_mut(&mut self) -> [&mut RegisterBank; 6] {
        [
            &mut self.device,
            &mut self.general,
            &mut self.rxmbuf,
            &mut self.txmbuf,
            &mut self.sdbcache,
            &mut self.rx_port1,
        ]
    }
}

impl Default for Chip {
    fn default() -> Self {
        Self::new()
    }
}
