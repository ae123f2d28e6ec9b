//! Harness-wide constants.

/// Number of clock cycles the core is held in reset before each test case.
pub const RESET_CYCLES: u64 = 10;

/// Size in bytes of a word in program images and dump files.
///
/// Image and dump files are always 32-bit word streams, independent of the bus width.
pub const FILE_WORD_BYTES: u64 = 4;

/// Widest supported bus word, in bits.
pub const MAX_BUS_WIDTH: u32 = 64;

/// Number of whitespace-separated fields on a manifest line.
pub const MANIFEST_FIELDS: usize = 7;
