//! Mailbox protocol tests.
//!
//! Verifies the round trip through a live executor, that the command word is
//! idle whenever a call returns successfully, and that a silent executor
//! produces a bounded timeout.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use apeboot_core::Error;
use apeboot_core::common::{CancelToken, PhysAddr, PollPolicy};
use apeboot_core::mailbox::client::{remote_read, remote_write};
use apeboot_core::mailbox::{Command, Executor, Mailbox, Request, Wait};
use apeboot_core::sim::{SimBus, SparseRam};
use apeboot_core::stats::MailboxStats;
use pretty_assertions::assert_eq;
use rstest::rstest;

const RAM_BASE: PhysAddr = PhysAddr::new(0x2000_0000);

fn ram_bus() -> SimBus {
    let mut bus = SimBus::new();
    bus.add_device(Box::new(SparseRam::new("RAM", RAM_BASE, 0x1000)));
    bus
}

#[test]
fn layout_is_three_words() {
    assert_eq!(std::mem::size_of::<Mailbox>(), 12);
    assert_eq!(Command::Idle.code(), 0);
    assert_eq!(Command::from_code(Command::WriteMem.code()), Some(Command::WriteMem));
    assert_eq!(Command::from_code(7), None);
}

#[rstest]
#[case(0x0, 0xDEAD_BEEF)]
#[case(0x4, 0)]
#[case(0xFFC, u32::MAX)]
fn write_then_read_round_trips(#[case] offset: u32, #[case] value: u32) {
    let mailbox = Arc::new(Mailbox::new());
    let stats = Arc::new(MailboxStats::new());
    let executor = Executor::new(Arc::clone(&mailbox), ram_bus(), Arc::clone(&stats)).spawn();
    let policy = PollPolicy::default();
    let wait = Wait::new(&policy, &stats);
    let address = RAM_BASE.offset(offset);

    assert_eq!(remote_write(&mailbox, address, value, &wait).unwrap(), value);
    assert!(mailbox.is_idle());
    assert_eq!(remote_read(&mailbox, address, &wait).unwrap(), value);
    assert!(mailbox.is_idle());

    drop(executor);
    let snapshot = stats.snapshot();
    assert_eq!(snapshot.reads, 1);
    assert_eq!(snapshot.writes, 1);
    assert_eq!(snapshot.serviced, 2);
    assert_eq!(snapshot.timeouts, 0);
}

#[test]
fn command_is_idle_after_every_exchange() {
    let mailbox = Arc::new(Mailbox::new());
    let stats = Arc::new(MailboxStats::new());
    let executor = Executor::new(Arc::clone(&mailbox), ram_bus(), Arc::clone(&stats)).spawn();
    let policy = PollPolicy::default();

    for i in 0..256u32 {
        let address = RAM_BASE.offset(i * 4);
        let _ = remote_write(&mailbox, address, i, &Wait::new(&policy, &stats)).unwrap();
        assert!(mailbox.is_idle());
        assert_eq!(remote_read(&mailbox, address, &Wait::new(&policy, &stats)).unwrap(), i);
        assert_eq!(mailbox.command_word(), Command::Idle.code());
    }

    let bus = executor.join().unwrap().into_bus();
    assert_eq!(bus.len(), 1);
}

#[test]
fn silent_executor_times_out() {
    let mailbox = Mailbox::new();
    let stats = MailboxStats::new();
    let address = RAM_BASE.offset(0x10);

    let policy = PollPolicy::spin(100);
    let err = remote_write(&mailbox, address, 1, &Wait::new(&policy, &stats)).unwrap_err();
    match err {
        Error::MailboxTimeout {
            command,
            address: at,
            attempts,
        } => {
            assert_eq!(command, Command::WriteMem);
            assert_eq!(at, address);
            assert_eq!(attempts, 100);
        }
        other => panic!("expected MailboxTimeout, got {other:?}"),
    }
    assert!(!mailbox.is_idle());
    assert_eq!(stats.snapshot().timeouts, 1);
}

#[test]
fn stale_command_blocks_next_request() {
    let mailbox = Mailbox::new();
    let stats = MailboxStats::new();
    let policy = PollPolicy::spin(10);
    let _ = remote_write(&mailbox, RAM_BASE, 1, &Wait::new(&policy, &stats)).unwrap_err();
    assert_eq!(mailbox.arg1(), 1);

    // The new read is never posted; the error names the write still in the slot.
    let err = remote_read(&mailbox, RAM_BASE.offset(4), &Wait::new(&policy, &stats)).unwrap_err();
    match err {
        Error::MailboxBusy {
            outstanding,
            attempts,
        } => {
            assert_eq!(
                outstanding,
                Request::Write {
                    address: RAM_BASE,
                    value: 1
                }
            );
            assert_eq!(attempts, 10);
        }
        other => panic!("expected MailboxBusy, got {other:?}"),
    }
    assert_eq!(mailbox.arg0(), RAM_BASE.val());
    assert_eq!(stats.snapshot().timeouts, 2);
}

#[test]
fn cancellation_interrupts_a_pending_wait() {
    let mailbox = Mailbox::new();
    let stats = MailboxStats::new();
    let token = CancelToken::new();
    // Bounded at well over a minute; only the token can end it early.
    let policy = PollPolicy::new(100_000, Duration::from_millis(1));
    let address = RAM_BASE.offset(0x20);

    let canceller = {
        let token = token.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            token.cancel();
        })
    };
    let started = Instant::now();
    let wait = Wait::new(&policy, &stats).with_cancel(Some(&token));
    let err = remote_read(&mailbox, address, &wait).unwrap_err();
    canceller.join().unwrap();

    assert!(started.elapsed() < Duration::from_secs(10));
    match err {
        Error::MailboxCancelled {
            command,
            address: at,
        } => {
            assert_eq!(command, Command::ReadMem);
            assert_eq!(at, address);
        }
        other => panic!("expected MailboxCancelled, got {other:?}"),
    }
    assert_eq!(stats.snapshot().reads, 0);
}

#[test]
fn executor_services_one_command_at_a_time() {
    let mailbox = Arc::new(Mailbox::new());
    let stats = Arc::new(MailboxStats::new());
    let mut executor = Executor::new(Arc::clone(&mailbox), ram_bus(), Arc::clone(&stats));
    assert!(!executor.service_one());

    let requester = {
        let mailbox = Arc::clone(&mailbox);
        let stats = Arc::clone(&stats);
        thread::spawn(move || {
            let policy = PollPolicy::default();
            remote_write(&mailbox, RAM_BASE.offset(8), 42, &Wait::new(&policy, &stats))
        })
    };
    while !executor.service_one() {
        std::hint::spin_loop();
    }
    assert_eq!(requester.join().unwrap().unwrap(), 42);
    assert!(mailbox.is_idle());
    assert_eq!(executor.into_bus().read_u32(RAM_BASE.offset(8)), 42);
}
