//! Direct MMIO strategy tests over anonymous windows.

use std::sync::Arc;

use apeboot_core::access::{self, MmioBackend, MmioBus, MmioWindow, RegisterBank};
use apeboot_core::common::{AccessKind, PhysAddr};
use apeboot_core::Error;

const BASE: PhysAddr = PhysAddr::new(0xC000_0000);

fn backend() -> MmioBackend {
    let mut bus = MmioBus::new();
    bus.add_window(MmioWindow::anonymous(BASE, 0x1000).unwrap());
    MmioBackend::new(Arc::new(bus))
}

#[test]
fn anonymous_window_starts_zeroed() {
    let window = MmioWindow::anonymous(BASE, 0x100).unwrap();
    assert_eq!(window.read_u32(0), 0);
    assert_eq!(window.read_u32(0xFC), 0);
    assert_eq!(window.offset_of(BASE.offset(0xFC)), Some(0xFC));
    assert_eq!(window.offset_of(BASE.offset(0xFD)), None);
    assert_eq!(window.offset_of(BASE.offset(0x2)), None);
    assert_eq!(window.offset_of(PhysAddr::new(0x1000)), None);
}

#[test]
fn bank_writes_land_in_window() {
    let backend = backend();
    let mut bank = RegisterBank::with_size("DEVICE", BASE, 0x1000);
    access::bind_bank(&mut bank, &backend);

    let _ = bank.write_at(0x70, 0x0007_0000).unwrap();
    assert_eq!(bank.read_at(0x70).unwrap(), 0x0007_0000);
    assert_eq!(backend.bus().read_u32(BASE.offset(0x70)).unwrap(), 0x0007_0000);

    let _ = bank.modify_at(0x70, |w| w | 1).unwrap();
    assert_eq!(backend.bus().read_u32(BASE.offset(0x70)).unwrap(), 0x0007_0001);
}

#[test]
fn unmapped_address_faults() {
    let backend = backend();
    let mut bank = RegisterBank::with_size("DEVICE", BASE, 0x2000);
    access::bind_bank(&mut bank, &backend);

    match bank.read_at(0x1000).unwrap_err() {
        Error::AccessFault { address, kind } => {
            assert_eq!(address, BASE.offset(0x1000));
            assert_eq!(kind, AccessKind::Read);
        }
        other => panic!("expected AccessFault, got {other:?}"),
    }
    assert!(matches!(
        bank.write_at(0x1FFC, 1),
        Err(Error::AccessFault {
            kind: AccessKind::Write,
            ..
        })
    ));
}

#[test]
fn windows_route_by_base() {
    let mut bus = MmioBus::new();
    bus.add_window(MmioWindow::anonymous(PhysAddr::new(0xC003_0000), 0x100).unwrap());
    bus.add_window(MmioWindow::anonymous(PhysAddr::new(0xC002_0000), 0x100).unwrap());
    assert_eq!(bus.len(), 2);

    bus.write_u32(PhysAddr::new(0xC002_0004), 2).unwrap();
    bus.write_u32(PhysAddr::new(0xC003_0004), 3).unwrap();
    assert_eq!(bus.read_u32(PhysAddr::new(0xC002_0004)).unwrap(), 2);
    assert_eq!(bus.read_u32(PhysAddr::new(0xC003_0004)).unwrap(), 3);
}

#[test]
fn unaligned_bus_access_faults() {
    let backend = backend();
    assert!(matches!(
        backend.bus().read_u32(BASE.offset(0x6)),
        Err(Error::AccessFault {
            kind: AccessKind::Read,
            ..
        })
    ));
    assert!(matches!(
        backend.bus().write_u32(BASE.offset(0x6), 1),
        Err(Error::AccessFault {
            kind: AccessKind::Write,
            ..
        })
    ));
}

#[test]
fn borrowed_window_writes_through_to_caller_memory() {
    let mut words = vec![0u32; 16];
    // SAFETY: `words` is word aligned, 64 bytes long, and outlives the window.
    let window = unsafe { MmioWindow::from_raw(BASE, words.as_mut_ptr().cast(), 64) };
    window.write_u32(0x8, 0xDEAD_BEEF);
    assert_eq!(window.read_u32(0x8), 0xDEAD_BEEF);
    assert_eq!(window.offset_of(BASE.offset(0x40)), None);
    drop(window);

    // Dropping a borrowed window leaves the memory alone.
    assert_eq!(words[2], 0xDEAD_BEEF);
    assert_eq!(words.iter().filter(|w| **w != 0).count(), 1);
}
