//! DEVICE register block model.
//!
//! Registers are plain sparse storage except for:
//! 1. **Straps:** `STATUS` is preset from the board description (VMAIN, function number).
//! 2. **MDIO:** Writing `MI_COMMUNICATION` with the start bit runs a clause 22
//!    transaction against a per-PHY register file. The start bit stays set for
//!    a configurable number of reads before the result is posted.
//! 3. **Block select:** PHY registers 0x10-0x1E are banked by the value written
//!    to register 0x1F.
//! 4. **Fault injection:** A number of block-select writes can be dropped to
//!    exercise the select-then-verify loops.

use std::collections::HashMap;

use crate::common::PhysAddr;
use crate::regs::{device, memory_map, mii};
use crate::sim::Device;

/// PHY addresses answered on the MDIO bus: the SERDES at 0 and one PHY per
/// PCI function at 1-4.
const PHYS: usize = 5;

/// Power-on value of the MII control register: full duplex, 1000 Mb/s,
/// auto-negotiation off.
const MII_CONTROL_RESET: u16 = 0x0140;

/// Straps sampled by the hardware at power-on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Board {
    /// `true` for a stand-alone NIC (VMAIN present), `false` for LAN-on-motherboard.
    pub nic: bool,
    /// PCI function number of the port, 0-3.
    pub function: u8,
}

impl Default for Board {
    fn default() -> Self {
        Self {
            nic: true,
            function: 0,
        }
    }
}

#[derive(Clone, Debug)]
struct Phy {
    regs: [u16; mii::REGISTERS],
    banked: HashMap<(u16, u8), u16>,
    block: u16,
}

impl Phy {
    fn new() -> Self {
        let mut regs = [0; mii::REGISTERS];
        regs[mii::CONTROL as usize] = MII_CONTROL_RESET;
        Self {
            regs,
            banked: HashMap::new(),
            block: mii::BLOCK_0,
        }
    }

    fn read(&self, reg: u8) -> u16 {
        match reg {
            mii::BLOCK_SELECT => self.block,
            r if r >= mii::FIRST_BANKED => self.banked.get(&(self.block, r)).copied().unwrap_or(0),
            r => self.regs[r as usize],
        }
    }

    fn write(&mut self, reg: u8, value: u16) {
        match reg {
            mii::BLOCK_SELECT => self.block = value,
            r if r >= mii::FIRST_BANKED => {
                let _ = self.banked.insert((self.block, r), value);
            }
            r => self.regs[r as usize] = value,
        }
    }
}

/// The simulated DEVICE register block.
#[derive(Clone, Debug)]
pub struct DeviceBlock {
    board: Board,
    words: HashMap<u32, u32>,
    phys: Vec<Phy>,
    mdio_latency: u32,
    mdio_busy: u32,
    flaky_block: u16,
    selects_to_drop: u32,
    dropped_selects: u32,
}

impl DeviceBlock {
    /// Creates a block strapped for `board`.
    pub fn new(board: Board) -> Self {
        let mut status = 0;
        if board.nic {
            status = device::STATUS_VMAIN_POWER.assert(status);
        }
        status = device::STATUS_FUNCTION_NUMBER.set(status, u32::from(board.function));

        let mut words = HashMap::new();
        let _ = words.insert(device::STATUS, status);
        Self {
            board,
            words,
            phys: vec![Phy::new(); PHYS],
            mdio_latency: 0,
            mdio_busy: 0,
            flaky_block: mii::BLOCK_0,
            selects_to_drop: 0,
            dropped_selects: 0,
        }
    }

    /// Keeps the MDIO start bit set for `reads` reads of `MI_COMMUNICATION`
    /// after each transaction starts.
    #[must_use]
    pub const fn with_mdio_latency(mut self, reads: u32) -> Self {
        self.mdio_latency = reads;
        self
    }

    /// Drops the first `count` writes that select `block`, on any PHY.
    /// `u32::MAX` drops them all.
    #[must_use]
    pub const fn with_dropped_selects(mut self, block: u16, count: u32) -> Self {
        self.flaky_block = block;
        self.selects_to_drop = count;
        self
    }

    /// Returns the board straps.
    pub const fn board(&self) -> Board {
        self.board
    }

    /// Returns the number of block-select writes dropped so far.
    pub const fn dropped_selects(&self) -> u32 {
        self.dropped_selects
    }

    /// Returns the stored word at `offset` without side effects.
    pub fn word(&self, offset: u32) -> u32 {
        self.words.get(&offset).copied().unwrap_or(0)
    }

    /// Returns PHY register `reg` as seen with `block` selected.
    pub fn phy_register(&self, phy: u8, block: u16, reg: u8) -> Option<u16> {
        let phy = self.phys.get(phy as usize)?;
        Some(match reg {
            mii::BLOCK_SELECT => phy.block,
            r if r >= mii::FIRST_BANKED => phy.banked.get(&(block, r)).copied().unwrap_or(0),
            r => *phy.regs.get(r as usize)?,
        })
    }

    fn mdio_transaction(&mut self, command: u32) -> u32 {
        let phy = device::MI_COM_PHY.get(command) as usize;
        let reg = device::MI_COM_REGISTER.get(command) as u8;
        let op = device::MI_COM_COMMAND.get(command);
        let mut result = device::MI_COM_START_BUSY.clear(command);

        let Some(target) = self.phys.get_mut(phy) else {
            tracing::trace!(phy, reg, "MDIO access to absent PHY");
            return device::MI_COM_READ_FAILED.assert(result);
        };

        match op {
            device::MI_COM_COMMAND_WRITE => {
                let value = device::MI_COM_DATA.get(command) as u16;
                if reg == mii::BLOCK_SELECT && value == self.flaky_block && self.selects_to_drop > 0 {
                    if self.selects_to_drop != u32::MAX {
                        self.selects_to_drop -= 1;
                    }
                    self.dropped_selects = self.dropped_selects.saturating_add(1);
                    tracing::trace!(phy, block = value, "dropped block select");
                } else {
                    target.write(reg, value);
                }
            }
            device::MI_COM_COMMAND_READ => {
                result = device::MI_COM_DATA.set(result, u32::from(target.read(reg)));
            }
            _ => result = device::MI_COM_READ_FAILED.assert(result),
        }
        result
    }
}

impl Device for DeviceBlock {
    fn name(&self) -> &str {
        "DEVICE"
    }

    fn address_range(&self) -> (PhysAddr, u32) {
        (memory_map::DEVICE_BASE, memory_map::DEVICE_SIZE)
    }

    fn read_u32(&mut self, offset: u32) -> u32 {
        let word = self.word(offset);
        if offset == device::MI_COMMUNICATION && self.mdio_busy > 0 {
            self.mdio_busy -= 1;
            return device::MI_COM_START_BUSY.assert(word);
        }
        word
    }

    fn write_u32(&mut self, offset: u32, val: u32) {
        let stored = match offset {
            // Straps are read-only.
            device::STATUS => return,
            device::MI_COMMUNICATION if device::MI_COM_START_BUSY.is_set(val) => {
                self.mdio_busy = self.mdio_latency;
                self.mdio_transaction(val)
            }
            _ => val,
        };
        let _ = self.words.insert(offset, stored);
    }

    fn as_device_block(&self) -> Option<&DeviceBlock> {
        Some(self)
    }
}
