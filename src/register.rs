//! Volatile register cells
//!
//! A [`Reg`] is one 32-bit memory-mapped register. The helpers mirror the
//! bit manipulation primitives used throughout the low-layer drivers:
//! `SET_BIT`, `CLEAR_BIT`, `READ_BIT` and `MODIFY_REG`.

use vcell::VolatileCell;

/// A 32-bit read-write register
#[repr(transparent)]
pub struct Reg {
    value: VolatileCell<u32>,
}

impl Reg {
    /// Read the whole register
    #[inline(always)]
    pub fn read(&self) -> u32 {
        self.value.get()
    }

    /// Write the whole register
    #[inline(always)]
    pub fn write(&self, value: u32) {
        self.value.set(value)
    }

    /// Read-modify-write the register with `f`
    #[inline(always)]
    pub fn modify<F>(&self, f: F)
    where
        F: FnOnce(u32) -> u32,
    {
        self.write(f(self.read()))
    }

    /// Set the bits of `mask`
    #[inline(always)]
    pub fn set_bits(&self, mask: u32) {
        self.modify(|r| r | mask)
    }

    /// Clear the bits of `mask`
    #[inline(always)]
    pub fn clear_bits(&self, mask: u32) {
        self.modify(|r| r & !mask)
    }

    /// Returns the bits of `mask` that are set
    #[inline(always)]
    pub fn read_bits(&self, mask: u32) -> u32 {
        self.read() & mask
    }

    /// True when every bit of `mask` is set
    #[inline(always)]
    pub fn is_set(&self, mask: u32) -> bool {
        self.read_bits(mask) == mask
    }

    /// Clear the bits of `clear`, then set the bits of `set`
    #[inline(always)]
    pub fn modify_bits(&self, clear: u32, set: u32) {
        self.modify(|r| (r & !clear) | set)
    }

    /// Read the field of `width` bits starting at bit `pos`
    #[inline(always)]
    pub fn read_field(&self, pos: u8, width: u8) -> u32 {
        (self.read() >> pos) & field_mask(width)
    }

    /// Write the field of `width` bits starting at bit `pos`. Bits of `value`
    /// above the field width are discarded
    #[inline(always)]
    pub fn write_field(&self, pos: u8, width: u8, value: u32) {
        let mask = field_mask(width);
        self.modify_bits(mask << pos, (value & mask) << pos)
    }
}

#[inline(always)]
const fn field_mask(width: u8) -> u32 {
    if width >= 32 {
        u32::MAX
    } else {
        (1 << width) - 1
    }
}
