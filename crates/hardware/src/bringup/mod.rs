//! APE bring-up sequencer.
//!
//! Bring-up is a fixed list of steps run once, in order, and fail-stop: the
//! first error aborts the run and nothing already written is rolled back.
//! Steps come in three shapes:
//! 1. **Unconditional set:** Read-modify-write a control register.
//! 2. **Strap branch:** Pick a bit pattern from the NIC/LOM strap.
//! 3. **Select-then-verify:** Rewrite a selector until a read-back agrees.
//!
//! Every step runs against an owned [`Chip`], so the sequencer never knows
//! whether its banks are bound to mapped memory or to the mailbox.

/// MII access through the MDIO controller.
pub mod mdio;

/// NVRAM-derived configuration.
pub mod nvram;

/// Power budget translation.
pub mod power;

/// Select-then-verify loops.
pub mod verify;

use std::fmt;

use crate::chip::Chip;
use crate::common::{CancelToken, Error, Result};
use crate::config::SequenceConfig;
use crate::regs::{device, mii};

pub use mdio::Mdio;
pub use nvram::NvramConfig;
pub use power::{split_power_budgets, translate_power_budget};
pub use verify::{VerifyState, select_then_verify};

/// The bring-up steps, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Step {
    /// Enable memory arbitration.
    EnableMemoryArbiter,
    /// Disable the RX RISC data cache.
    DisableDataCache,
    /// Set the APE control, shared memory, and program space write enables.
    UnlockApeRegions,
    /// Power up the GPHY and pick the TLP clock source from the strap.
    ConfigureGphy,
    /// Clear the GEN, RXMBUF, TXMBUF and SDBCACHE regions.
    ZeroFill,
    /// Program the four MAC address register pairs.
    LoadMacAddresses,
    /// Program power consumption, dissipation and the eight budgets.
    LoadPower,
    /// Literal writes to undocumented registers plus DMA, ECC, LED and MDIO setup.
    MiscRegisters,
    /// Function 0 PHY workaround involving blocks 0x8010 and 0x8610.
    MiiFunction0,
    /// Enable auto-negotiation on this function's PHY.
    MiiAutoNegotiation,
}

impl Step {
    /// Every step, in execution order.
    pub const ALL: [Self; 10] = [
        Self::EnableMemoryArbiter,
        Self::DisableDataCache,
        Self::UnlockApeRegions,
        Self::ConfigureGphy,
        Self::ZeroFill,
        Self::LoadMacAddresses,
        Self::LoadPower,
        Self::MiscRegisters,
        Self::MiiFunction0,
        Self::MiiAutoNegotiation,
    ];

    /// Returns the step's name as used in logs.
    pub const fn name(self) -> &'static str {
        match self {
            Self::EnableMemoryArbiter => "enable-memory-arbiter",
            Self::DisableDataCache => "disable-data-cache",
            Self::UnlockApeRegions => "unlock-ape-regions",
            Self::ConfigureGphy => "configure-gphy",
            Self::ZeroFill => "zero-fill",
            Self::LoadMacAddresses => "load-mac-addresses",
            Self::LoadPower => "load-power",
            Self::MiscRegisters => "misc-registers",
            Self::MiiFunction0 => "mii-function0",
            Self::MiiAutoNegotiation => "mii-auto-negotiation",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Board operating mode, from the VMAIN strap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Stand-alone network card.
    Nic,
    /// LAN-on-motherboard.
    Lom,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nic => f.write_str("NIC"),
            Self::Lom => f.write_str("LOM"),
        }
    }
}

/// What a completed bring-up run observed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BringupReport {
    /// Operating mode read from the strap.
    pub mode: Option<Mode>,
    /// PHY that had auto-negotiation enabled.
    pub phy: Option<u8>,
    /// Steps that ran, in order.
    pub completed: Vec<Step>,
    /// Steps skipped by configuration.
    pub skipped: Vec<Step>,
    /// Rounds the 0x8610 block select took to stick.
    pub block_select_attempts: u32,
    /// Rounds the register 0x15 mode write took to stick.
    pub mode_write_attempts: u32,
}

impl BringupReport {
    /// Prints the report.
    pub fn print(&self) {
        let mode = self.mode.map_or_else(|| "-".to_string(), |m| m.to_string());
        let phy = self.phy.map_or_else(|| "-".to_string(), |p| p.to_string());
        println!("\n==========================================================");
        println!("APE BRING-UP REPORT");
        println!("==========================================================");
        println!("  mode             {mode:>12}");
        println!("  phy              {phy:>12}");
        println!("  steps completed  {:>12}", self.completed.len());
        for step in &self.skipped {
            println!("  skipped          {:>12}", step.name());
        }
        println!("  block select     {:>12}  rounds", self.block_select_attempts);
        println!("  mode write       {:>12}  rounds", self.mode_write_attempts);
    }
}

enum Outcome {
    Done,
    Skipped,
}

/// Runs the bring-up steps against a chip.
#[derive(Debug)]
pub struct Sequencer<'a> {
    chip: &'a mut Chip,
    nvram: &'a NvramConfig,
    config: SequenceConfig,
    cancel: Option<CancelToken>,
}

impl<'a> Sequencer<'a> {
    /// Creates a sequencer.
    ///
    /// # Arguments
    ///
    /// * `chip` - Must already be attached to a backend; unbound banks fail
    ///   the first step that touches them.
    /// * `nvram` - MAC addresses and power fields to program.
    /// * `config` - Bounds for every wait the steps make.
    pub const fn new(chip: &'a mut Chip, nvram: &'a NvramConfig, config: SequenceConfig) -> Self {
        Self {
            chip,
            nvram,
            config,
            cancel: None,
        }
    }

    /// Aborts the run with [`Error::Cancelled`] once `token` is raised.
    #[must_use]
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }

    /// Runs every step in order.
    ///
    /// # Errors
    ///
    /// Returns the first error any step produces; later steps do not run.
    pub fn run(mut self) -> Result<BringupReport> {
        tracing::info!(steps = Step::ALL.len(), "APE bring-up starting");
        let mut report = BringupReport::default();
        for step in Step::ALL {
            if self.is_cancelled() {
                return Err(Error::Cancelled { step });
            }
            let span = tracing::debug_span!("step", %step);
            let _enter = span.enter();
            match self.run_step(step, &mut report) {
                Ok(Outcome::Done) => {
                    tracing::debug!("step complete");
                    report.completed.push(step);
                }
                Ok(Outcome::Skipped) => {
                    tracing::debug!("step skipped");
                    report.skipped.push(step);
                }
                Err(Error::MailboxCancelled { command, address }) => {
                    tracing::warn!(%command, %address, "bring-up cancelled during a mailbox wait");
                    return Err(Error::Cancelled { step });
                }
                Err(err) => {
                    tracing::error!(%err, "bring-up aborted");
                    return Err(err);
                }
            }
        }
        tracing::info!(
            mode = ?report.mode,
            completed = report.completed.len(),
            "APE bring-up complete"
        );
        Ok(report)
    }

    fn run_step(&mut self, step: Step, report: &mut BringupReport) -> Result<Outcome> {
        match step {
            Step::EnableMemoryArbiter => self.set_bits(
                device::MEMORY_ARBITER_MODE,
                device::MEMORY_ARBITER_ENABLE.mask(),
                0,
            )?,
            Step::DisableDataCache => self.set_bits(
                device::RX_RISC_MODE,
                0,
                device::RX_RISC_ENABLE_DATA_CACHE.mask(),
            )?,
            Step::UnlockApeRegions => self.set_bits(
                device::PCI_STATE,
                device::PCI_STATE_APE_CONTROL_WRITE_ENABLE.mask()
                    | device::PCI_STATE_APE_SHARED_MEMORY_WRITE_ENABLE.mask()
                    | device::PCI_STATE_APE_PROGRAM_SPACE_WRITE_ENABLE.mask(),
                0,
            )?,
            Step::ConfigureGphy => report.mode = Some(self.configure_gphy()?),
            Step::ZeroFill => return self.zero_fill(),
            Step::LoadMacAddresses => self.load_mac_addresses()?,
            Step::LoadPower => self.load_power()?,
            Step::MiscRegisters => self.misc_registers()?,
            Step::MiiFunction0 => self.mii_function0(report)?,
            Step::MiiAutoNegotiation => report.phy = Some(self.mii_auto_negotiation()?),
        }
        Ok(Outcome::Done)
    }

    fn set_bits(&mut self, offset: u32, set: u32, clear: u32) -> Result<()> {
        let _ = self
            .chip
            .device
            .modify_at(offset, |word| (word & !clear) | set)?;
        Ok(())
    }

    fn configure_gphy(&mut self) -> Result<Mode> {
        let status = self.chip.device.read_at(device::STATUS)?;
        let mode = if device::STATUS_VMAIN_POWER.is_set(status) {
            Mode::Nic
        } else {
            Mode::Lom
        };
        tracing::debug!(%mode, "strap sampled");

        let _ = self
            .chip
            .device
            .modify_at(device::GPHY_CONTROL_STATUS, |word| {
                let word = device::GPHY_CONTROL_GPHY_IDDQ.clear(word);
                let word = device::GPHY_CONTROL_BIAS_IDDQ.clear(word);
                let word = device::GPHY_CONTROL_SGMII_PCS_POWER_DOWN.clear(word);
                device::GPHY_CONTROL_TLP_CLOCK_SOURCE.set(word, u32::from(mode == Mode::Nic))
            })?;
        Ok(mode)
    }

    fn zero_fill(&mut self) -> Result<Outcome> {
        if !self.config.zero_fill {
            return Ok(Outcome::Skipped);
        }
        let cancel = self.cancel.clone();
        for region in self.chip.zero_fill_regions() {
            let written = region.fill(0, || {
                !cancel.as_ref().is_some_and(CancelToken::is_cancelled)
            })?;
            if written < region.len() {
                return Err(Error::Cancelled {
                    step: Step::ZeroFill,
                });
            }
            tracing::trace!(region = region.name(), words = written, "region cleared");
        }
        Ok(Outcome::Done)
    }

    fn load_mac_addresses(&mut self) -> Result<()> {
        for (index, mac) in self.nvram.mac_addresses.iter().enumerate() {
            let (high, low) = device::mac_address(index);
            let _ = self.chip.device.write_at(high, (mac >> 32) as u32)?;
            let _ = self.chip.device.write_at(low, *mac as u32)?;
        }
        Ok(())
    }

    fn load_power(&mut self) -> Result<()> {
        let device_bank = &mut self.chip.device;
        let _ = device_bank.write_at(device::PCI_POWER_CONSUMPTION_INFO, self.nvram.power_consumed)?;
        let _ = device_bank.write_at(device::PCI_POWER_DISSIPATED_INFO, self.nvram.power_dissipated)?;
        for (index, raw) in self.nvram.power_budget_entries().into_iter().enumerate() {
            let _ = device_bank.write_at(device::power_budget(index), translate_power_budget(raw))?;
        }
        Ok(())
    }

    fn misc_registers(&mut self) -> Result<()> {
        let bank = &mut self.chip.device;
        let _ = bank.modify_at(device::REG_64C0, |w| (w & !0x7FF) | 0x10)?;
        let _ = bank.write_at(device::REG_64C8, 0x0000_1004)?;

        // Written whole: only the MAC override bit survives.
        let _ = bank.write_at(
            device::CLOCK_SPEED_OVERRIDE_POLICY,
            device::CLOCK_SPEED_OVERRIDE_MAC.assert(0),
        )?;

        let _ = bank.modify_at(device::REG_64DC, |w| (w & !0xF) | 0x1)?;
        let _ = bank.modify_at(device::REG_64DC, |w| w & !0xC00)?;

        let _ = bank.modify_at(device::LSO_NONLSO_BD_READ_DMA, |w| {
            let w = device::BD_READ_DMA_BURST_LENGTH.set(w, device::READ_DMA_BURST_4K);
            device::NONLSO_READ_DMA_BURST_LENGTH.set(w, device::READ_DMA_BURST_4K)
        })?;

        let _ = bank.modify_at(device::GPHY_STRAP, |w| {
            let w = device::GPHY_STRAP_TXMBUF_ECC.clear(w);
            let w = device::GPHY_STRAP_RXMBUF_ECC.clear(w);
            device::GPHY_STRAP_RXCPU_SPAD_ECC.clear(w)
        })?;

        let _ = bank.modify_at(device::LED_CONTROL, |w| {
            device::LED_CONTROL_MODE.set(w, device::LED_MODE_PHY_1)
        })?;

        let _ = bank.modify_at(device::MI_MODE, |w| {
            device::MI_MODE_CONSTANT_MDC_CLOCK.assert(w)
        })?;
        Ok(())
    }

    fn mii_function0(&mut self, report: &mut BringupReport) -> Result<()> {
        const PHY: u8 = 0;
        let policy = self.config.select_verify.policy();
        let cancel = self.cancel.clone();
        let mut mdio = Mdio::new(
            &mut self.chip.device,
            self.config.mdio.policy(),
            Step::MiiFunction0,
        )
        .with_cancel(cancel.as_ref());

        mdio.select_block(PHY, mii::BLOCK_8010)?;
        let reg_1a = mdio.modify(PHY, mii::REG_1A, |v| v | mii::REG_1A_BIT_14)?;

        report.block_select_attempts = select_then_verify(
            Step::MiiFunction0,
            &policy,
            cancel.as_ref(),
            &mut mdio,
            |mdio| mdio.select_block(PHY, mii::BLOCK_8610),
            |mdio| Ok(mdio.block(PHY)? == mii::BLOCK_8610),
        )?;

        report.mode_write_attempts = select_then_verify(
            Step::MiiFunction0,
            &policy,
            cancel.as_ref(),
            &mut mdio,
            |mdio| {
                let _ = mdio.modify(PHY, mii::REG_15, |v| {
                    mii::REG_15_MODE.set(u32::from(v), mii::REG_15_MODE_VALUE) as u16
                })?;
                Ok(())
            },
            |mdio| {
                let value = mdio.read(PHY, mii::REG_15)?;
                Ok(mii::REG_15_MODE.get(u32::from(value)) == mii::REG_15_MODE_VALUE)
            },
        )?;

        mdio.select_block(PHY, mii::BLOCK_8010)?;
        mdio.write(PHY, mii::REG_1A, reg_1a & !mii::REG_1A_BIT_14)?;
        mdio.select_block(PHY, mii::BLOCK_0)
    }

    fn mii_auto_negotiation(&mut self) -> Result<u8> {
        let status = self.chip.device.read_at(device::STATUS)?;
        let phy = device::STATUS_FUNCTION_NUMBER.get(status) as u8 + 1;
        let mut mdio = Mdio::new(
            &mut self.chip.device,
            self.config.mdio.policy(),
            Step::MiiAutoNegotiation,
        )
        .with_cancel(self.cancel.as_ref());
        let _ = mdio.modify(phy, mii::CONTROL, |v| {
            mii::CONTROL_AUTO_NEGOTIATION_ENABLE.assert(u32::from(v)) as u16
        })?;
        tracing::debug!(phy, "auto-negotiation enabled");
        Ok(phy)
    }
}
