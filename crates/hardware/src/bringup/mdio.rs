//! MII register access through the MI communication register.
//!
//! One transaction at a time: compose the command word, write it with the
//! start bit set, then poll until the controller clears the busy bit.

use super::Step;
use crate::access::RegisterBank;
use crate::common::{CancelToken, Error, PollPolicy, Result, Retry, retry};
use crate::regs::{device, mii};

/// MDIO master driving the DEVICE block's MI communication register.
#[derive(Debug)]
pub struct Mdio<'a> {
    device: &'a mut RegisterBank,
    policy: PollPolicy,
    cancel: Option<&'a CancelToken>,
    step: Step,
}

impl<'a> Mdio<'a> {
    /// Creates a master over `device`. Busy waits are bounded by `policy` and
    /// reported as a timeout of `step`.
    pub const fn new(device: &'a mut RegisterBank, policy: PollPolicy, step: Step) -> Self {
        Self {
            device,
            policy,
            cancel: None,
            step,
        }
    }

    /// Abandons busy waits with [`Error::Cancelled`] once `cancel` is raised.
    #[must_use]
    pub const fn with_cancel(mut self, cancel: Option<&'a CancelToken>) -> Self {
        self.cancel = cancel;
        self
    }

    fn transact(&mut self, command: u32, phy: u8, reg: u8, data: u16) -> Result<u32> {
        let mut word = device::MI_COM_START_BUSY.assert(0);
        word = device::MI_COM_COMMAND.set(word, command);
        word = device::MI_COM_PHY.set(word, u32::from(phy));
        word = device::MI_COM_REGISTER.set(word, u32::from(reg));
        word = device::MI_COM_DATA.set(word, u32::from(data));
        let _ = self.device.write_at(device::MI_COMMUNICATION, word)?;

        let bank = &*self.device;
        let outcome = retry(&self.policy, self.cancel, |_| {
            let status = bank.read_at(device::MI_COMMUNICATION)?;
            Ok((!device::MI_COM_START_BUSY.is_set(status)).then_some(status))
        })?;
        match outcome {
            Retry::Converged { value, .. } => Ok(value),
            Retry::Cancelled { .. } => Err(Error::Cancelled { step: self.step }),
            Retry::Exhausted { attempts } => {
                tracing::warn!(phy, reg, attempts, "MDIO transaction stuck busy");
                Err(Error::SequenceTimeout {
                    step: self.step,
                    attempts,
                })
            }
        }
    }

    /// Reads MII register `reg` of `phy`.
    ///
    /// # Errors
    ///
    /// [`Error::MdioReadFailed`] if the PHY did not answer, a timeout if the
    /// controller stays busy, or any register access error.
    pub fn read(&mut self, phy: u8, reg: u8) -> Result<u16> {
        let status = self.transact(device::MI_COM_COMMAND_READ, phy, reg, 0)?;
        if device::MI_COM_READ_FAILED.is_set(status) {
            return Err(Error::MdioReadFailed { phy, reg });
        }
        let value = device::MI_COM_DATA.get(status) as u16;
        tracing::trace!(phy, reg, value, "MII read");
        Ok(value)
    }

    /// Writes `value` to MII register `reg` of `phy`.
    ///
    /// # Errors
    ///
    /// A timeout if the controller stays busy, or any register access error.
    pub fn write(&mut self, phy: u8, reg: u8, value: u16) -> Result<()> {
        let _ = self.transact(device::MI_COM_COMMAND_WRITE, phy, reg, value)?;
        tracing::trace!(phy, reg, value, "MII write");
        Ok(())
    }

    /// Read-modify-writes MII register `reg` of `phy`, returning the value written.
    ///
    /// # Errors
    ///
    /// As for [`read`](Self::read) and [`write`](Self::write).
    pub fn modify(&mut self, phy: u8, reg: u8, f: impl FnOnce(u16) -> u16) -> Result<u16> {
        let value = f(self.read(phy, reg)?);
        self.write(phy, reg, value)?;
        Ok(value)
    }

    /// Selects register block `block` on `phy`.
    ///
    /// # Errors
    ///
    /// As for [`write`](Self::write).
    pub fn select_block(&mut self, phy: u8, block: u16) -> Result<()> {
        self.write(phy, mii::BLOCK_SELECT, block)
    }

    /// Returns the block currently selected on `phy`.
    ///
    /// # Errors
    ///
    /// As for [`read`](Self::read).
    pub fn block(&mut self, phy: u8) -> Result<u16> {
        self.read(phy, mii::BLOCK_SELECT)
    }
}
