//! Bit field descriptor for 32-bit register words.

/// A contiguous bit field inside a 32-bit word.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Field {
    /// Position of the least significant bit.
    pub shift: u32,
    /// Number of bits in the field.
    pub width: u32,
}

impl Field {
    /// Creates a field of `width` bits starting at `shift`.
    pub const fn new(shift: u32, width: u32) -> Self {
        Self { shift, width }
    }

    /// Creates a single-bit field.
    pub const fn bit(shift: u32) -> Self {
        Self::new(shift, 1)
    }

    /// Returns the in-place mask covering the field.
    pub const fn mask(self) -> u32 {
        (((1u64 << self.width) - 1) as u32) << self.shift
    }

    /// Extracts the field from `word`.
    pub const fn get(self, word: u32) -> u32 {
        (word & self.mask()) >> self.shift
    }

    /// Returns `word` with the field replaced by `value`, truncated to the
    /// field width.
    pub const fn set(self, word: u32, value: u32) -> u32 {
        (word & !self.mask()) | ((value << self.shift) & self.mask())
    }

    /// Returns `word` with every bit of the field set.
    pub const fn assert(self, word: u32) -> u32 {
        word | self.mask()
    }

    /// Returns `word` with every bit of the field cleared.
    pub const fn clear(self, word: u32) -> u32 {
        word & !self.mask()
    }

    /// Returns `true` if any bit of the field is set in `word`.
    pub const fn is_set(self, word: u32) -> bool {
        word & self.mask() != 0
    }
}
