//! Device trait for simulated register windows.

use super::devices::DeviceBlock;
use crate::common::PhysAddr;

/// A component attached to the simulated bus.
///
/// Offsets passed to the access methods are relative to the device base and
/// word aligned. Devices are moved onto the executor thread, so they must be
/// `Send`.
pub trait Device: Send {
    /// Returns a short name for this device (e.g. `"DEVICE"`, `"GEN"`).
    fn name(&self) -> &str;
    /// Returns `(base, size_in_bytes)` of the window this device answers.
    fn address_range(&self) -> (PhysAddr, u32);
    /// Reads the word at `offset`.
    fn read_u32(&mut self, offset: u32) -> u32;
    /// Writes the word at `offset`.
    fn write_u32(&mut self, offset: u32, val: u32);

    /// Returns this device as the DEVICE block model, if it is one.
    fn as_device_block(&self) -> Option<&DeviceBlock> {
        None
    }
}
