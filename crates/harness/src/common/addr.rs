//! Bus address type.
//!
//! The core drives raw byte addresses onto the bus. The memory model never faults on them:
//! 1. **Wrapping:** Addresses are reduced modulo the memory size.
//! 2. **Alignment:** The wrapped address is masked down to the bus word boundary.
//! 3. **Error flag:** Addresses at or beyond the memory size are still reported as bus errors.

/// A raw byte address as driven on the core's `mem_addr` pins.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct BusAddr(pub u64);

impl BusAddr {
    /// Creates a bus address from a raw pin value.
    ///
    /// # Arguments
    ///
    /// * `addr` - The raw address value.
    ///
    /// # Returns
    ///
    /// A new `BusAddr` wrapping the provided value.
    #[inline(always)]
    pub const fn new(addr: u64) -> Self {
        Self(addr)
    }

    /// Returns the raw address value.
    #[inline(always)]
    pub const fn val(self) -> u64 {
        self.0
    }

    /// Returns the address that is actually used to access memory.
    ///
    /// The address is taken modulo `mem_size` and then aligned down to `word_bytes`.
    ///
    /// # Arguments
    ///
    /// * `mem_size` - Memory size in bytes; must be non-zero.
    /// * `word_bytes` - Bus word size in bytes; must be a power of two.
    ///
    /// # Returns
    ///
    /// The wrapped, word-aligned byte offset into the memory image.
    #[inline(always)]
    pub const fn effective(self, mem_size: u64, word_bytes: u64) -> u64 {
        (self.0 % mem_size) & !(word_bytes - 1)
    }

    /// Returns `true` if the raw address lies outside the memory image.
    ///
    /// Such accesses are serviced at their wrapped address but answered with `mem_err` set.
    #[inline(always)]
    pub const fn is_out_of_range(self, mem_size: u64) -> bool {
        self.0 >= mem_size
    }

    /// Returns `true` for the completion sentinel (any access to address zero).
    #[inline(always)]
    pub const fn is_sentinel(self) -> bool {
        self.0 == 0
    }
}

impl From<u64> for BusAddr {
    fn from(addr: u64) -> Self {
        Self(addr)
    }
}

impl std::fmt::LowerHex for BusAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::LowerHex::fmt(&self.0, f)
    }
}
