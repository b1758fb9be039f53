//! Direct memory-mapped access.
//!
//! The strategy used when register accesses go straight to mapped memory. It provides:
//! 1. **Windows:** `MmioWindow`, a mapped region at a physical base with volatile 32-bit access.
//! 2. **Routing:** `MmioBus`, which resolves an absolute address to the window covering it.
//! 3. **Strategy:** `MmioAccess`, the `RegisterAccess` implementation over a bus.
//!
//! Windows are either borrowed from a real mapping or allocated anonymously.
//! Anonymous windows use `mmap` on Unix so that large, sparsely touched
//! regions only cost the pages that are actually written.

use std::fmt;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{Backend, RegisterAccess};
use crate::common::{AccessKind, Error, PhysAddr, Result};

/// A mapped region at a fixed physical base.
pub struct MmioWindow {
    base: PhysAddr,
    ptr: *mut u8,
    size: usize,
    owned: bool,
}

// SAFETY: the window owns (or was handed exclusive use of) its mapping, which
// is process-wide; moving it between threads does not invalidate it.
unsafe impl Send for MmioWindow {}
// SAFETY: all access is through volatile loads and stores of naturally aligned
// words, bounds-checked against `size`.
unsafe impl Sync for MmioWindow {}

impl MmioWindow {
    /// Allocates a zeroed anonymous window of `size` bytes at `base`.
    ///
    /// # Arguments
    ///
    /// * `base` - Physical address the first byte of the window stands for.
    /// * `size` - Length in bytes. Pages are only committed once touched.
    ///
    /// # Returns
    ///
    /// An owned window, unmapped again on drop.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the mapping cannot be created.
    pub fn anonymous(base: PhysAddr, size: usize) -> io::Result<Self> {
        #[cfg(unix)]
        {
            // SAFETY: anonymous private mapping with no address hint; the
            // result is checked against MAP_FAILED before use.
            let ptr = unsafe {
                libc::mmap(
                    std::ptr::null_mut(),
                    size,
                    libc::PROT_READ | libc::PROT_WRITE,
                    libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
                    -1,
                    0,
                )
            };
            if ptr == libc::MAP_FAILED {
                return Err(io::Error::last_os_error());
            }
            Ok(Self {
                base,
                ptr: ptr as *mut u8,
                size,
                owned: true,
            })
        }

        #[cfg(not(unix))]
        {
            // u32 elements keep the allocation word aligned.
            let mut words = vec![0u32; size.div_ceil(4)];
            let ptr = words.as_mut_ptr() as *mut u8;
            std::mem::forget(words);
            Ok(Self {
                base,
                ptr,
                size,
                owned: true,
            })
        }
    }

    /// Wraps an existing mapping of `size` bytes at `ptr` that represents
    /// physical addresses starting at `base`.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for volatile reads and writes of `size` bytes, word
    /// aligned, and must outlive the window. The window never unmaps it.
    pub const unsafe fn from_raw(base: PhysAddr, ptr: *mut u8, size: usize) -> Self {
        Self {
            base,
            ptr,
            size,
            owned: false,
        }
    }

    /// Returns the physical base address of the window.
    pub const fn base(&self) -> PhysAddr {
        self.base
    }

    /// Returns the size of the window in bytes.
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Returns the window-relative offset of `addr`, if `addr` is word
    /// aligned and the window covers a full word there.
    pub fn offset_of(&self, addr: PhysAddr) -> Option<usize> {
        let offset = addr.val().checked_sub(self.base.val())? as usize;
        (offset % 4 == 0 && offset + 4 <= self.size).then_some(offset)
    }

    /// Reads the 32-bit word at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if `offset + 4` exceeds the window or `offset` is unaligned.
    pub fn read_u32(&self, offset: usize) -> u32 {
        assert!(offset + 4 <= self.size, "MMIO read out of bounds");
        assert!(offset % 4 == 0, "MMIO read unaligned");
        // SAFETY: in bounds and aligned per the asserts; `ptr` is valid for
        // `size` bytes for the window's lifetime.
        unsafe { std::ptr::read_volatile(self.ptr.add(offset).cast::<u32>()) }
    }

    /// Writes the 32-bit word at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if `offset + 4` exceeds the window or `offset` is unaligned.
    pub fn write_u32(&self, offset: usize, value: u32) {
        assert!(offset + 4 <= self.size, "MMIO write out of bounds");
        assert!(offset % 4 == 0, "MMIO write unaligned");
        // SAFETY: as in `read_u32`.
        unsafe { std::ptr::write_volatile(self.ptr.add(offset).cast::<u32>(), value) }
    }
}

impl fmt::Debug for MmioWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MmioWindow")
            .field("base", &self.base)
            .field("ptr", &format_args!("{:p}", self.ptr))
            .field("size", &self.size)
            .field("owned", &self.owned)
            .finish()
    }
}

impl Drop for MmioWindow {
    fn drop(&mut self) {
        if !self.owned {
            return;
        }
        #[cfg(unix)]
        // SAFETY: `ptr`/`size` came from the mmap in `anonymous`; drop runs once.
        unsafe {
            let _ = libc::munmap(self.ptr.cast(), self.size);
        }
        #[cfg(not(unix))]
        // SAFETY: reconstructs the Vec forgotten in `anonymous`.
        unsafe {
            let words = self.size.div_ceil(4);
            drop(Vec::from_raw_parts(self.ptr.cast::<u32>(), words, words));
        }
    }
}

/// Routes absolute addresses to the window that covers them.
#[derive(Debug, Default)]
pub struct MmioBus {
    windows: Vec<MmioWindow>,
    last_hit: AtomicUsize,
}

impl MmioBus {
    /// Creates a bus with no windows.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a window; windows are kept sorted by base address.
    pub fn add_window(&mut self, window: MmioWindow) {
        tracing::debug!(base = %window.base(), size = window.size(), "mapped MMIO window");
        self.windows.push(window);
        self.windows.sort_by_key(MmioWindow::base);
        self.last_hit.store(0, Ordering::Relaxed);
    }

    /// Returns the number of windows on the bus.
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    /// Returns `true` if the bus has no windows.
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    fn find(&self, addr: PhysAddr) -> Option<(&MmioWindow, usize)> {
        let hint = self.last_hit.load(Ordering::Relaxed);
        if let Some(window) = self.windows.get(hint) {
            if let Some(offset) = window.offset_of(addr) {
                return Some((window, offset));
            }
        }
        self.windows.iter().enumerate().find_map(|(i, window)| {
            let offset = window.offset_of(addr)?;
            self.last_hit.store(i, Ordering::Relaxed);
            Some((window, offset))
        })
    }

    /// Reads the word at `addr`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AccessFault`] if `addr` is unaligned or no window
    /// covers it.
    pub fn read_u32(&self, addr: PhysAddr) -> Result<u32> {
        let (window, offset) = self.find(addr).ok_or(Error::AccessFault {
            address: addr,
            kind: AccessKind::Read,
        })?;
        Ok(window.read_u32(offset))
    }

    /// Writes the word at `addr`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AccessFault`] if `addr` is unaligned or no window
    /// covers it.
    pub fn write_u32(&self, addr: PhysAddr, value: u32) -> Result<()> {
        let (window, offset) = self.find(addr).ok_or(Error::AccessFault {
            address: addr,
            kind: AccessKind::Write,
        })?;
        window.write_u32(offset, value);
        Ok(())
    }
}

/// Access strategy that reads and writes mapped memory directly.
#[derive(Debug, Clone)]
pub struct MmioAccess {
    bus: Arc<MmioBus>,
    base: PhysAddr,
}

impl MmioAccess {
    /// Creates a strategy for the bank at `base`.
    pub const fn new(bus: Arc<MmioBus>, base: PhysAddr) -> Self {
        Self { bus, base }
    }
}

impl RegisterAccess for MmioAccess {
    fn name(&self) -> &str {
        "mmio"
    }

    fn base(&self) -> PhysAddr {
        self.base
    }

    fn read(&self, _cached: u32, offset: u32) -> Result<u32> {
        self.bus.read_u32(self.base.offset(offset))
    }

    fn write(&self, value: u32, offset: u32) -> Result<u32> {
        self.bus.write_u32(self.base.offset(offset), value)?;
        Ok(value)
    }
}

/// Backend handing out [`MmioAccess`] strategies over one shared bus.
#[derive(Debug, Clone)]
pub struct MmioBackend {
    bus: Arc<MmioBus>,
}

impl MmioBackend {
    /// Creates a backend over `bus`.
    pub const fn new(bus: Arc<MmioBus>) -> Self {
        Self { bus }
    }

    /// Returns the underlying bus.
    pub const fn bus(&self) -> &Arc<MmioBus> {
        &self.bus
    }
}

impl Backend for MmioBackend {
    fn name(&self) -> &str {
        "mmio"
    }

    fn access(&self, base: PhysAddr) -> Arc<dyn RegisterAccess> {
        Arc::new(MmioAccess::new(Arc::clone(&self.bus), base))
    }
}
