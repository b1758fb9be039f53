//! Registers and register banks.
//!
//! A register is an offset from its bank's base plus a pair of bindings. A
//! bank is a fixed-size run of 32-bit registers sharing one base address and,
//! once bound, one access strategy.

use std::fmt;
use std::sync::Arc;

use super::RegisterAccess;
use crate::common::{AccessKind, Error, PhysAddr, Result};

/// Distance in bytes between consecutive bank entries.
pub const WORD_STRIDE: u32 = 4;

/// A read slot and a write slot, each holding an optional strategy.
///
/// Installing into a slot replaces whatever was there; nothing is notified and
/// the previous strategy is simply dropped from this binding.
#[derive(Clone, Default)]
pub struct Binding {
    read: Option<Arc<dyn RegisterAccess>>,
    write: Option<Arc<dyn RegisterAccess>>,
}

impl Binding {
    /// Installs `handler` as the read strategy.
    pub fn install_read(&mut self, handler: Arc<dyn RegisterAccess>) {
        self.read = Some(handler);
    }

    /// Installs `handler` as the write strategy.
    pub fn install_write(&mut self, handler: Arc<dyn RegisterAccess>) {
        self.write = Some(handler);
    }

    /// Installs `handler` into both slots.
    pub fn install(&mut self, handler: &Arc<dyn RegisterAccess>) {
        self.install_read(Arc::clone(handler));
        self.install_write(Arc::clone(handler));
    }

    /// Returns `true` if neither slot is populated.
    pub const fn is_empty(&self) -> bool {
        self.read.is_none() && self.write.is_none()
    }

    fn slot(&self, kind: AccessKind) -> Option<&Arc<dyn RegisterAccess>> {
        match kind {
            AccessKind::Read => self.read.as_ref(),
            AccessKind::Write => self.write.as_ref(),
        }
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("read", &self.read.as_ref().map(|h| h.name().to_owned()))
            .field("write", &self.write.as_ref().map(|h| h.name().to_owned()))
            .finish()
    }
}

/// A single 32-bit register.
#[derive(Debug)]
pub struct Register {
    base: PhysAddr,
    offset: u32,
    /// Last value acknowledged by a write strategy.
    value: u32,
    binding: Binding,
}

impl Register {
    /// Creates an unbound register at `base + offset`.
    pub const fn new(base: PhysAddr, offset: u32) -> Self {
        Self {
            base,
            offset,
            value: 0,
            binding: Binding {
                read: None,
                write: None,
            },
        }
    }

    /// Returns the register's offset from its bank base.
    pub const fn offset(&self) -> u32 {
        self.offset
    }

    /// Returns the effective address, `base + offset`.
    pub const fn address(&self) -> PhysAddr {
        self.base.offset(self.offset)
    }

    /// Returns the last value acknowledged by a write.
    pub const fn cached(&self) -> u32 {
        self.value
    }

    /// Returns the register's own binding.
    pub const fn binding(&self) -> &Binding {
        &self.binding
    }

    /// Installs a read strategy on this register only.
    pub fn install_read(&mut self, handler: Arc<dyn RegisterAccess>) {
        self.binding.install_read(handler);
    }

    /// Installs a write strategy on this register only.
    pub fn install_write(&mut self, handler: Arc<dyn RegisterAccess>) {
        self.binding.install_write(handler);
    }

    /// Reads the register through its read strategy.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnboundAccess`] if no read strategy is installed, or
    /// whatever the strategy returns.
    pub fn read(&self) -> Result<u32> {
        self.read_via(None)
    }

    /// Writes the register through its write strategy and returns the
    /// acknowledged value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnboundAccess`] if no write strategy is installed, or
    /// whatever the strategy returns.
    pub fn write(&mut self, value: u32) -> Result<u32> {
        self.write_via(None, value)
    }

    fn handler<'a>(
        &'a self,
        fallback: Option<&'a Binding>,
        kind: AccessKind,
    ) -> Result<&'a Arc<dyn RegisterAccess>> {
        self.binding
            .slot(kind)
            .or_else(|| fallback.and_then(|b| b.slot(kind)))
            .ok_or_else(|| Error::UnboundAccess {
                address: self.address(),
                kind,
            })
    }

    fn read_via(&self, fallback: Option<&Binding>) -> Result<u32> {
        let handler = self.handler(fallback, AccessKind::Read)?;
        let value = handler.read(self.value, self.offset)?;
        tracing::trace!(address = %self.address(), value, via = handler.name(), "read");
        Ok(value)
    }

    fn write_via(&mut self, fallback: Option<&Binding>, value: u32) -> Result<u32> {
        let handler = self.handler(fallback, AccessKind::Write)?;
        let acked = handler.write(value, self.offset)?;
        tracing::trace!(address = %self.address(), value, acked, via = handler.name(), "write");
        self.value = acked;
        Ok(acked)
    }
}

/// A fixed-size bank of 32-bit registers sharing one base address.
///
/// Entry `i` lives at byte offset `i * WORD_STRIDE`. A strategy installed on
/// the bank serves every entry that has no binding of its own.
#[derive(Debug)]
pub struct RegisterBank {
    name: &'static str,
    base: PhysAddr,
    binding: Binding,
    entries: Vec<Register>,
}

impl RegisterBank {
    /// Creates an unbound bank of `len` registers starting at `base`.
    pub fn new(name: &'static str, base: PhysAddr, len: usize) -> Self {
        let entries = (0..len)
            .map(|i| Register::new(base, i as u32 * WORD_STRIDE))
            .collect();
        Self {
            name,
            base,
            binding: Binding::default(),
            entries,
        }
    }

    /// Creates an unbound bank covering `size` bytes starting at `base`.
    pub fn with_size(name: &'static str, base: PhysAddr, size: u32) -> Self {
        Self::new(name, base, (size / WORD_STRIDE) as usize)
    }

    /// Returns the bank's name.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the bank's base address.
    pub const fn base(&self) -> PhysAddr {
        self.base
    }

    /// Returns the number of registers in the bank.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the bank holds no registers.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the byte offset of entry `index`.
    pub const fn offset(index: usize) -> u32 {
        index as u32 * WORD_STRIDE
    }

    /// Returns the bank-wide binding.
    pub const fn binding(&self) -> &Binding {
        &self.binding
    }

    /// Installs a read strategy for every entry of the bank.
    pub fn install_read(&mut self, handler: Arc<dyn RegisterAccess>) {
        self.binding.install_read(handler);
    }

    /// Installs a write strategy for every entry of the bank.
    pub fn install_write(&mut self, handler: Arc<dyn RegisterAccess>) {
        self.binding.install_write(handler);
    }

    /// Installs `handler` as both the bank-wide read and write strategy.
    pub fn install(&mut self, handler: &Arc<dyn RegisterAccess>) {
        self.binding.install(handler);
    }

    /// Returns entry `index`, if it exists.
    pub fn entry(&self, index: usize) -> Option<&Register> {
        self.entries.get(index)
    }

    /// Returns entry `index` mutably, e.g. to give it its own binding.
    pub fn entry_mut(&mut self, index: usize) -> Option<&mut Register> {
        self.entries.get_mut(index)
    }

    /// Reads entry `index`.
    ///
    /// # Arguments
    ///
    /// * `index` - Entry number, not a byte offset.
    ///
    /// # Returns
    ///
    /// The value the effective read strategy produced. The entry's own
    /// binding wins over the bank's.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadOffset`] if `index` is outside the bank,
    /// [`Error::UnboundAccess`] if neither the entry nor the bank has a read
    /// strategy, or whatever the strategy returns.
    pub fn read(&self, index: usize) -> Result<u32> {
        let entry = self.entries.get(index).ok_or_else(|| self.bad_index(index))?;
        entry.read_via(Some(&self.binding))
    }

    /// Writes entry `index` and returns the acknowledged value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadOffset`] if `index` is outside the bank,
    /// [`Error::UnboundAccess`] if neither the entry nor the bank has a write
    /// strategy, or whatever the strategy returns.
    pub fn write(&mut self, index: usize, value: u32) -> Result<u32> {
        let bad = self.bad_index(index);
        let entry = self.entries.get_mut(index).ok_or(bad)?;
        entry.write_via(Some(&self.binding), value)
    }

    /// Reads the register at byte `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadOffset`] if `offset` is unaligned or outside the
    /// bank; otherwise see [`read`](Self::read).
    pub fn read_at(&self, offset: u32) -> Result<u32> {
        self.read(self.index_of(offset)?)
    }

    /// Writes the register at byte `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadOffset`] if `offset` is unaligned or outside the
    /// bank; otherwise see [`write`](Self::write).
    pub fn write_at(&mut self, offset: u32, value: u32) -> Result<u32> {
        let index = self.index_of(offset)?;
        self.write(index, value)
    }

    /// Read-modify-writes the register at byte `offset`.
    ///
    /// # Errors
    ///
    /// Fails on a bad offset, or if either the read or the write fails. A
    /// failed read leaves the register unwritten.
    pub fn modify_at(&mut self, offset: u32, f: impl FnOnce(u32) -> u32) -> Result<u32> {
        let current = self.read_at(offset)?;
        self.write_at(offset, f(current))
    }

    /// Writes `value` to every entry, in order.
    ///
    /// `keep_going` is consulted before each write; returning `false` stops the
    /// fill and yields the number of entries written so far.
    ///
    /// # Errors
    ///
    /// Stops at the first failing write.
    pub fn fill(&mut self, value: u32, mut keep_going: impl FnMut() -> bool) -> Result<usize> {
        for index in 0..self.entries.len() {
            if !keep_going() {
                return Ok(index);
            }
            let _ = self.write(index, value)?;
        }
        Ok(self.entries.len())
    }

    fn index_of(&self, offset: u32) -> Result<usize> {
        let index = (offset / WORD_STRIDE) as usize;
        if offset % WORD_STRIDE != 0 || index >= self.entries.len() {
            return Err(Error::BadOffset {
                bank: self.name,
                offset,
            });
        }
        Ok(index)
    }

    fn bad_index(&self, index: usize) -> Error {
        Error::BadOffset {
            bank: self.name,
            offset: u32::try_from(index).map_or(u32::MAX, |i| i.saturating_mul(WORD_STRIDE)),
        }
    }
}
