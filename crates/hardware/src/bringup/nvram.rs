//! NVRAM-derived configuration consumed by bring-up.
//!
//! Only the fields bring-up programs are modelled. The record is loaded from
//! JSON, with every field defaulting to zero.

use serde::Deserialize;

use super::power::split_power_budgets;
use crate::common::Result;
use crate::regs::device::{MAC_ADDRESSES, PCI_POWER_BUDGETS};

/// Values read from NVRAM that bring-up writes into the DEVICE block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NvramConfig {
    /// MAC address of each port, in the low 48 bits.
    pub mac_addresses: [u64; MAC_ADDRESSES],
    /// PCI power consumption info word.
    pub power_consumed: u32,
    /// PCI power dissipated info word.
    pub power_dissipated: u32,
    /// Power budget words, each holding two 16-bit entries.
    pub power_budget: [u32; 4],
}

impl NvramConfig {
    /// Parses a JSON record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::common::Error::Config) if the document is malformed.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Returns the eight raw power budget entries.
    pub const fn power_budget_entries(&self) -> [u16; PCI_POWER_BUDGETS] {
        split_power_budgets(self.power_budget)
    }
}
