//! Power budget translation tests.

use apeboot_core::bringup::{split_power_budgets, translate_power_budget};
use apeboot_core::regs::device::{
    DATA_SCALE_0_1X, POWER_BUDGET_BASE_POWER, POWER_BUDGET_DATA_SCALE, POWER_BUDGET_PM_STATE,
    POWER_BUDGET_PM_SUB_STATE, POWER_BUDGET_POWER_RAIL, POWER_BUDGET_TYPE,
};
use proptest::prelude::*;
use rstest::rstest;

#[test]
fn zero_is_disabled() {
    assert_eq!(translate_power_budget(0), 0);
}

#[test]
fn talos_entry_0x2107() {
    let word = translate_power_budget(0x2107);
    assert_eq!(POWER_BUDGET_BASE_POWER.get(word), 0x07);
    assert_eq!(POWER_BUDGET_PM_STATE.get(word), 1);
    assert_eq!(POWER_BUDGET_TYPE.get(word), 0);
    assert_eq!(POWER_BUDGET_POWER_RAIL.get(word), 1);
    assert_eq!(POWER_BUDGET_DATA_SCALE.get(word), DATA_SCALE_0_1X);
    assert_eq!(word, 0x0004_2107);
}

#[rstest]
#[case(0x0001, 0x0000_0101)]
#[case(0x00FF, 0x0000_01FF)]
#[case(0x0300, 0x0000_6100)]
#[case(0x1C00, 0x0003_8100)]
#[case(0xE000, 0x001C_0100)]
#[case(0xFFFF, 0x001F_E1FF)]
fn fields_land_in_place(#[case] raw: u16, #[case] expected: u32) {
    assert_eq!(translate_power_budget(raw), expected);
}

#[test]
fn entries_split_low_half_first() {
    assert_eq!(
        split_power_budgets([0x0000_2107, 0x0001_0000, 0, 0xFFFF_FFFF]),
        [0x2107, 0, 0, 1, 0, 0, 0xFFFF, 0xFFFF]
    );
}

proptest! {
    #[test]
    fn nonzero_entries_decompose(raw in 1u16..) {
        let raw32 = u32::from(raw);
        let word = translate_power_budget(raw);
        prop_assert_eq!(POWER_BUDGET_BASE_POWER.get(word), raw32 & 0xFF);
        prop_assert_eq!(POWER_BUDGET_PM_STATE.get(word), (raw32 >> 8) & 0x3);
        prop_assert_eq!(POWER_BUDGET_TYPE.get(word), (raw32 >> 10) & 0x7);
        prop_assert_eq!(POWER_BUDGET_POWER_RAIL.get(word), (raw32 >> 13) & 0x7);
        prop_assert_eq!(POWER_BUDGET_DATA_SCALE.get(word), DATA_SCALE_0_1X);
        prop_assert_eq!(POWER_BUDGET_PM_SUB_STATE.get(word), 0);
        prop_assert_eq!(word >> 21, 0);
    }
}
