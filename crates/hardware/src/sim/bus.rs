//! Simulated bus.
//!
//! Routes absolute addresses to the device whose window contains them, with a
//! last-device hint since bring-up tends to hit the same block repeatedly.
//! Accesses nobody claims read as zero and discard writes.

use std::fmt;

use super::device::Device;
use super::devices::DeviceBlock;
use crate::common::PhysAddr;

/// Bus connecting the mailbox executor to simulated devices.
#[derive(Default)]
pub struct SimBus {
    devices: Vec<Box<dyn Device>>,
    last_device_idx: usize,
}

impl SimBus {
    /// Creates an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a device; devices are sorted by base address for lookup.
    pub fn add_device(&mut self, dev: Box<dyn Device>) {
        let (base, size) = dev.address_range();
        tracing::debug!(device = dev.name(), %base, size, "attached simulated device");
        self.devices.push(dev);
        self.devices.sort_by_key(|d| d.address_range().0);
        self.last_device_idx = 0;
    }

    /// Returns the number of attached devices.
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Returns `true` if no device is attached.
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Returns whether some device's window contains `addr`.
    pub fn is_valid_address(&self, addr: PhysAddr) -> bool {
        self.devices.iter().any(|d| contains(d.as_ref(), addr).is_some())
    }

    /// Returns the DEVICE block model, if one is attached.
    pub fn device_block(&self) -> Option<&DeviceBlock> {
        self.devices.iter().find_map(|d| d.as_device_block())
    }

    fn find_device(&mut self, addr: PhysAddr) -> Option<(&mut Box<dyn Device>, u32)> {
        if let Some(offset) = self
            .devices
            .get(self.last_device_idx)
            .and_then(|d| contains(d.as_ref(), addr))
        {
            return Some((&mut self.devices[self.last_device_idx], offset));
        }

        for (i, dev) in self.devices.iter_mut().enumerate() {
            if let Some(offset) = contains(dev.as_ref(), addr) {
                self.last_device_idx = i;
                return Some((dev, offset));
            }
        }
        None
    }

    /// Reads the word at `addr`; returns 0 if no device claims it.
    pub fn read_u32(&mut self, addr: PhysAddr) -> u32 {
        if let Some((dev, offset)) = self.find_device(addr) {
            dev.read_u32(offset)
        } else {
            tracing::warn!(%addr, "simulated read of unclaimed address");
            0
        }
    }

    /// Writes the word at `addr`; no-op if no device claims it.
    pub fn write_u32(&mut self, addr: PhysAddr, val: u32) {
        if let Some((dev, offset)) = self.find_device(addr) {
            dev.write_u32(offset, val);
        } else {
            tracing::warn!(%addr, val, "simulated write to unclaimed address");
        }
    }
}

fn contains(dev: &dyn Device, addr: PhysAddr) -> Option<u32> {
    let (base, size) = dev.address_range();
    let offset = addr.val().checked_sub(base.val())?;
    (offset < size).then_some(offset)
}

impl fmt::Debug for SimBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimBus")
            .field(
                "devices",
                &self.devices.iter().map(|d| d.name()).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}
