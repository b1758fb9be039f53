//! Sparse word-addressed RAM.
//!
//! Only words that have been written are stored; everything else reads as
//! zero. Regions are small enough that a hash map is plenty.

use std::collections::HashMap;

use crate::common::PhysAddr;
use crate::sim::Device;

/// A memory region that persists written words.
#[derive(Debug)]
pub struct SparseRam {
    name: &'static str,
    base: PhysAddr,
    size: u32,
    words: HashMap<u32, u32>,
    writes: u64,
}

impl SparseRam {
    /// Creates an empty region of `size` bytes at `base`.
    pub fn new(name: &'static str, base: PhysAddr, size: u32) -> Self {
        Self {
            name,
            base,
            size,
            words: HashMap::new(),
            writes: 0,
        }
    }

    /// Returns the number of word writes the region has taken.
    pub const fn writes(&self) -> u64 {
        self.writes
    }
}

impl Device for SparseRam {
    fn name(&self) -> &str {
        self.name
    }

    fn address_range(&self) -> (PhysAddr, u32) {
        (self.base, self.size)
    }

    fn read_u32(&mut self, offset: u32) -> u32 {
        self.words.get(&offset).copied().unwrap_or(0)
    }

    fn write_u32(&mut self, offset: u32, val: u32) {
        self.writes += 1;
        if val == 0 {
            let _ = self.words.remove(&offset);
        } else {
            let _ = self.words.insert(offset, val);
        }
    }
}
