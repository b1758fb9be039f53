//! Simulated components.
//!
//! * `SparseRam` backs the plain memory regions.
//! * `DeviceBlock` models the DEVICE register block, its straps, and the MDIO controller.

/// DEVICE register block.
pub mod device_block;

/// Sparse word-addressed memory.
pub mod ram;

pub use device_block::{Board, DeviceBlock};
pub use ram::SparseRam;
