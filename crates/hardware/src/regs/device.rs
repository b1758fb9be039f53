//! DEVICE block register offsets and fields.
//!
//! Only the registers bring-up reads or writes are listed. Offsets are
//! relative to [`DEVICE_BASE`](super::memory_map::DEVICE_BASE). Registers
//! named `REG_64xx` have no documented meaning and are programmed with
//! literal values.

use super::Field;

/// PCI state.
pub const PCI_STATE: u32 = 0x0070;
/// Allows the APE to write its control registers.
pub const PCI_STATE_APE_CONTROL_WRITE_ENABLE: Field = Field::bit(16);
/// Allows the APE to write shared memory.
pub const PCI_STATE_APE_SHARED_MEMORY_WRITE_ENABLE: Field = Field::bit(17);
/// Allows the APE to write program space.
pub const PCI_STATE_APE_PROGRAM_SPACE_WRITE_ENABLE: Field = Field::bit(18);

/// Device status.
pub const STATUS: u32 = 0x0404;
/// Set when VMAIN is present, i.e. the board is a NIC rather than LOM.
pub const STATUS_VMAIN_POWER: Field = Field::bit(27);
/// PCI function this port answers as.
pub const STATUS_FUNCTION_NUMBER: Field = Field::new(30, 2);

/// LED control.
pub const LED_CONTROL: u32 = 0x040C;
/// LED mode.
pub const LED_CONTROL_MODE: Field = Field::new(11, 2);
/// LED mode: driven by the PHY, mode 1.
pub const LED_MODE_PHY_1: u32 = 1;

/// First EMAC MAC address register (high word of address 0).
pub const MAC_ADDRESS_0_HIGH: u32 = 0x0410;
/// Distance between consecutive MAC address register pairs.
pub const MAC_ADDRESS_STRIDE: u32 = 8;
/// Number of MAC address register pairs.
pub const MAC_ADDRESSES: usize = 4;

/// Returns the (high, low) register offsets of MAC address `index`.
pub const fn mac_address(index: usize) -> (u32, u32) {
    let high = MAC_ADDRESS_0_HIGH + index as u32 * MAC_ADDRESS_STRIDE;
    (high, high + 4)
}

/// MI (MDIO) communication.
pub const MI_COMMUNICATION: u32 = 0x044C;
/// Data to write, or data read.
pub const MI_COM_DATA: Field = Field::new(0, 16);
/// MII register number.
pub const MI_COM_REGISTER: Field = Field::new(16, 5);
/// PHY address.
pub const MI_COM_PHY: Field = Field::new(21, 5);
/// Transaction command.
pub const MI_COM_COMMAND: Field = Field::new(26, 2);
/// [`MI_COM_COMMAND`] value for a write.
pub const MI_COM_COMMAND_WRITE: u32 = 1;
/// [`MI_COM_COMMAND`] value for a read.
pub const MI_COM_COMMAND_READ: u32 = 2;
/// Set by the controller when a read got no response.
pub const MI_COM_READ_FAILED: Field = Field::bit(28);
/// Written as 1 to start a transaction; reads 1 while it is in progress.
pub const MI_COM_START_BUSY: Field = Field::bit(29);

/// MI mode.
pub const MI_MODE: u32 = 0x0454;
/// Keeps the MDC clock at a constant rate.
pub const MI_MODE_CONSTANT_MDC_CLOCK: Field = Field::bit(15);

/// Clock speed override policy.
pub const CLOCK_SPEED_OVERRIDE_POLICY: u32 = 0x3624;
/// Enables the MAC clock speed override.
pub const CLOCK_SPEED_OVERRIDE_MAC: Field = Field::bit(31);

/// GPHY control and status.
pub const GPHY_CONTROL_STATUS: u32 = 0x3658;
/// GPHY power-down.
pub const GPHY_CONTROL_GPHY_IDDQ: Field = Field::bit(0);
/// Bias power-down.
pub const GPHY_CONTROL_BIAS_IDDQ: Field = Field::bit(1);
/// SGMII PCS power-down.
pub const GPHY_CONTROL_SGMII_PCS_POWER_DOWN: Field = Field::bit(2);
/// TLP clock source: 1 for the NIC oscillator, 0 for the PCIe SERDES.
pub const GPHY_CONTROL_TLP_CLOCK_SOURCE: Field = Field::bit(3);

/// GPHY strap.
pub const GPHY_STRAP: u32 = 0x365C;
/// Transmit mbuf ECC enable.
pub const GPHY_STRAP_TXMBUF_ECC: Field = Field::bit(2);
/// Receive mbuf ECC enable.
pub const GPHY_STRAP_RXMBUF_ECC: Field = Field::bit(3);
/// RX CPU scratchpad ECC enable.
pub const GPHY_STRAP_RXCPU_SPAD_ECC: Field = Field::bit(4);

/// Memory arbiter mode.
pub const MEMORY_ARBITER_MODE: u32 = 0x4000;
/// Memory arbiter enable.
pub const MEMORY_ARBITER_ENABLE: Field = Field::bit(1);

/// LSO/non-LSO BD read DMA corruption enable control.
pub const LSO_NONLSO_BD_READ_DMA: u32 = 0x4910;
/// PCI request burst length for the BD read DMA engine.
pub const BD_READ_DMA_BURST_LENGTH: Field = Field::new(16, 2);
/// PCI request burst length for the non-LSO read DMA engine.
pub const NONLSO_READ_DMA_BURST_LENGTH: Field = Field::new(18, 2);
/// Burst length code for 4K.
pub const READ_DMA_BURST_4K: u32 = 3;

/// RX RISC mode.
pub const RX_RISC_MODE: u32 = 0x5000;
/// RX RISC data cache enable.
pub const RX_RISC_ENABLE_DATA_CACHE: Field = Field::bit(3);

/// PCI power consumption info.
pub const PCI_POWER_CONSUMPTION_INFO: u32 = 0x6410;
/// PCI power dissipated info.
pub const PCI_POWER_DISSIPATED_INFO: u32 = 0x6414;
/// First of the eight PCI power budget registers.
pub const PCI_POWER_BUDGET_0: u32 = 0x6428;
/// Number of PCI power budget registers.
pub const PCI_POWER_BUDGETS: usize = 8;

/// Returns the offset of PCI power budget register `index`.
pub const fn power_budget(index: usize) -> u32 {
    PCI_POWER_BUDGET_0 + index as u32 * 4
}

/// Power budget: base power.
pub const POWER_BUDGET_BASE_POWER: Field = Field::new(0, 8);
/// Power budget: data scale.
pub const POWER_BUDGET_DATA_SCALE: Field = Field::new(8, 2);
/// Power budget: PM sub-state. Always zero.
pub const POWER_BUDGET_PM_SUB_STATE: Field = Field::new(10, 3);
/// Power budget: PM state.
pub const POWER_BUDGET_PM_STATE: Field = Field::new(13, 2);
/// Power budget: type.
pub const POWER_BUDGET_TYPE: Field = Field::new(15, 3);
/// Power budget: power rail.
pub const POWER_BUDGET_POWER_RAIL: Field = Field::new(18, 3);
/// [`POWER_BUDGET_DATA_SCALE`] code for a 0.1x scale, the "1x" code of the
/// NVRAM encoding.
pub const DATA_SCALE_0_1X: u32 = 1;

/// Undocumented.
pub const REG_64C0: u32 = 0x64C0;
/// Undocumented.
pub const REG_64C8: u32 = 0x64C8;
/// Undocumented.
pub const REG_64DC: u32 = 0x64DC;
