//! Error formatting tests.

use apeboot_core::bringup::Step;
use apeboot_core::common::{AccessKind, PhysAddr};
use apeboot_core::mailbox::{Command, Request};
use apeboot_core::Error;
use rstest::rstest;

#[rstest]
#[case(
    Error::UnboundAccess { address: PhysAddr::new(0xC000_4000), kind: AccessKind::Read },
    "unbound read access at 0xc0004000"
)]
#[case(
    Error::MailboxTimeout { command: Command::WriteMem, address: PhysAddr::new(0xC000_0070), attempts: 9 },
    "mailbox write-mem of 0xc0000070 not acknowledged after 9 polls"
)]
#[case(
    Error::MailboxBusy {
        outstanding: Request::Write { address: PhysAddr::new(0xC000_0070), value: 1 },
        attempts: 10,
    },
    "mailbox still busy with write-mem of 0xc0000070 (0x00000001) after 10 polls"
)]
#[case(
    Error::MailboxBusy { outstanding: Request::Unknown { code: 0x7 }, attempts: 2 },
    "mailbox still busy with unknown command 0x7 after 2 polls"
)]
#[case(
    Error::MailboxCancelled { command: Command::ReadMem, address: PhysAddr::new(0xC001_0B50) },
    "mailbox read-mem of 0xc0010b50 abandoned on cancellation"
)]
#[case(
    Error::BadOffset { bank: "DEVICE", offset: 0x8002 },
    "offset 0x8002 is unaligned or outside bank DEVICE"
)]
#[case(
    Error::SequenceTimeout { step: Step::MiiFunction0, attempts: 64 },
    "bring-up step mii-function0 did not converge after 64 attempts"
)]
#[case(
    Error::Cancelled { step: Step::ZeroFill },
    "bring-up cancelled during zero-fill"
)]
#[case(
    Error::AccessFault { address: PhysAddr::new(0x1000), kind: AccessKind::Write },
    "write access fault at 0x00001000: no mapped window"
)]
#[case(
    Error::MdioReadFailed { phy: 3, reg: 0x15 },
    "MDIO read of PHY 3 register 0x15 failed"
)]
fn display(#[case] err: Error, #[case] expected: &str) {
    assert_eq!(err.to_string(), expected);
}

#[test]
fn step_is_reported_for_sequencer_errors() {
    assert_eq!(
        Error::SequenceTimeout { step: Step::LoadPower, attempts: 1 }.step(),
        Some(Step::LoadPower)
    );
    assert_eq!(
        Error::Cancelled { step: Step::ZeroFill }.step(),
        Some(Step::ZeroFill)
    );
    assert_eq!(Error::MdioReadFailed { phy: 0, reg: 0 }.step(), None);
}
