//! PCI power budget translation.
//!
//! NVRAM packs each power budget entry into 16 bits; the PCI power budget
//! registers want the PCIe capability layout. The translation is a pure
//! repacking of four fields plus a fixed data scale.

use crate::regs::device::{
    DATA_SCALE_0_1X, PCI_POWER_BUDGETS, POWER_BUDGET_BASE_POWER, POWER_BUDGET_DATA_SCALE,
    POWER_BUDGET_PM_STATE, POWER_BUDGET_POWER_RAIL, POWER_BUDGET_TYPE,
};

/// Translates one raw NVRAM power budget entry into a power budget register
/// value.
///
/// A raw value of zero means the entry is unused and translates to zero.
/// Otherwise the base power, PM state, type, and power rail fields are moved
/// into place and the data scale is set to the fixed NVRAM scale.
///
/// # Arguments
///
/// * `raw` - One 16-bit entry: base power in bits 0-7, PM state in 8-9,
///   type in 10-12, power rail in 13-15.
///
/// # Returns
///
/// The 32-bit value for a `PCI_POWER_BUDGET` register.
///
/// # Examples
///
/// ```
/// use apeboot_core::bringup::translate_power_budget;
///
/// assert_eq!(translate_power_budget(0), 0);
/// assert_eq!(translate_power_budget(0x2107), 0x0004_2107);
/// ```
pub const fn translate_power_budget(raw: u16) -> u32 {
    if raw == 0 {
        return 0;
    }
    let raw = raw as u32;
    let mut word = 0;
    word = POWER_BUDGET_BASE_POWER.set(word, raw & 0xFF);
    word = POWER_BUDGET_DATA_SCALE.set(word, DATA_SCALE_0_1X);
    word = POWER_BUDGET_PM_STATE.set(word, (raw & 0x0300) >> 8);
    word = POWER_BUDGET_TYPE.set(word, (raw & 0x1C00) >> 10);
    word = POWER_BUDGET_POWER_RAIL.set(word, (raw & 0xE000) >> 13);
    word
}

/// Splits four NVRAM power budget words into their eight 16-bit entries,
/// low half first.
pub const fn split_power_budgets(words: [u32; 4]) -> [u16; PCI_POWER_BUDGETS] {
    let mut raw = [0; PCI_POWER_BUDGETS];
    let mut i = 0;
    while i < PCI_POWER_BUDGETS {
        raw[i] = (words[i / 2] >> (16 * (i % 2))) as u16;
        i += 1;
    }
    raw
}
