//! BCM5719 APE bring-up library.
//!
//! This crate brings up the APE coprocessor of a BCM5719 network controller
//! and lets the same bring-up code run against real hardware or a simulator:
//! 1. **Access:** Register and bank bindings that route every access through a strategy.
//! 2. **Mailbox:** The shared-memory command protocol used to reach a simulated chip.
//! 3. **Bring-up:** The ordered sequencer, select-then-verify loops, and power budget translation.
//! 4. **Simulation:** A simulated bus and DEVICE block served by the mailbox executor.
//! 5. **Support:** Register map, configuration, polling, and statistics.

/// Register access indirection (strategies, bindings, banks, MMIO backend).
pub mod access;
/// Bring-up sequencer, MDIO access, and power budget translation.
pub mod bringup;
/// Owned register banks of one controller.
pub mod chip;
/// Common types (addresses, access kinds, errors, polling).
pub mod common;
/// Run configuration (poll bounds, zero-fill).
pub mod config;
/// Shared-memory mailbox protocol and executor.
pub mod mailbox;
/// Register offsets and bit fields.
pub mod regs;
/// Simulated bus and devices.
pub mod sim;
/// Mailbox traffic statistics.
pub mod stats;

/// Bring-up entry points; construct a `Sequencer` and call `run`.
pub use crate::bringup::{BringupReport, NvramConfig, Sequencer, Step, translate_power_budget};
/// Owned chip handle; attach it to a backend before bring-up.
pub use crate::chip::Chip;
/// Crate-wide error and result types.
pub use crate::common::{CancelToken, Error, PhysAddr, PollPolicy, Result};
/// Root configuration type; use `Config::default()` or `Config::from_json`.
pub use crate::config::Config;
