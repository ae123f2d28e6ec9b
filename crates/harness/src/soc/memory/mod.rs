//! Simulated Memory Image.
//!
//! This module implements the flat memory the core sees through the bus. It provides:
//! 1. **Image:** A fixed-size byte buffer, allocated once and cleared for every test case.
//! 2. **Lanes:** Little-endian bus-word reads and byte-enabled writes for the bus adapter.
//! 3. **Files:** Loading hex program images and dumping address ranges as hex words.
//! 4. **Controller:** The fixed-latency response pipeline (see [`controller`]).

/// Fixed-latency response pipeline.
pub mod controller;

/// Hex image and dump text formats.
pub mod hex;

use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::{debug, trace};

use self::hex::parse_image_line;
use crate::common::constants::FILE_WORD_BYTES;
use crate::common::{HarnessError, Result};

/// Summary of a program image load.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Number of words written.
    pub words: usize,
    /// One past the highest byte address written (zero for an empty image).
    pub end: u64,
}

/// Byte-addressable memory backing the simulated bus.
#[derive(Clone, Debug)]
pub struct MemoryImage {
    bytes: Vec<u8>,
}

impl MemoryImage {
    /// Allocates a zeroed image of `size` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Allocation`] if the host cannot provide the buffer.
    pub fn new(size: usize) -> Result<Self> {
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(size)
            .map_err(|_| HarnessError::Allocation {
                what: "memory image",
                bytes: size,
            })?;
        bytes.resize(size, 0);
        Ok(Self { bytes })
    }

    /// Returns the image size in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` for a zero-sized image.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns the raw image contents.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Zeroes the whole image.
    pub fn clear(&mut self) {
        self.bytes.fill(0);
    }

    /// Reads a little-endian word of `lanes` bytes starting at `addr`.
    ///
    /// The caller guarantees `addr + lanes <= len()`; the bus adapter only passes wrapped,
    /// word-aligned addresses into an image whose size is a multiple of the word size.
    #[inline]
    pub fn read_lanes(&self, addr: u64, lanes: usize) -> u64 {
        let base = addr as usize;
        self.bytes[base..base + lanes]
            .iter()
            .rev()
            .fold(0u64, |acc, &b| (acc << 8) | u64::from(b))
    }

    /// Writes the byte lanes of `data` selected by `byte_enable` starting at `addr`.
    ///
    /// Lane `i` carries bits `8*i..8*i+8` of `data` and is written to `addr + i` only if bit
    /// `i` of `byte_enable` is set.
    #[inline]
    pub fn write_lanes(&mut self, addr: u64, data: u64, byte_enable: u8, lanes: usize) {
        let base = addr as usize;
        for lane in 0..lanes {
            if byte_enable & (1 << lane) != 0 {
                self.bytes[base + lane] = (data >> (lane * 8)) as u8;
            }
        }
    }

    /// Reads a little-endian 32-bit word, or `None` if it does not fit in the image.
    pub fn read_u32_le(&self, addr: u64) -> Option<u32> {
        let base = usize::try_from(addr).ok()?;
        let bytes = self.bytes.get(base..base.checked_add(4)?)?;
        Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn write_u32_le(&mut self, addr: u64, val: u32) -> bool {
        let Ok(base) = usize::try_from(addr) else {
            return false;
        };
        match base
            .checked_add(4)
            .and_then(|end| self.bytes.get_mut(base..end))
        {
            Some(slot) => {
                slot.copy_from_slice(&val.to_le_bytes());
                true
            }
            None => false,
        }
    }

    /// Clears the image and loads a hex program file.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::FileOpen`] if the file cannot be read and
    /// [`HarnessError::Format`] if a word would land outside the image.
    pub fn load_hex(&mut self, path: &Path) -> Result<LoadSummary> {
        let raw = fs::read(path).map_err(|e| HarnessError::open(path, e))?;
        self.load_hex_str(&String::from_utf8_lossy(&raw), path)
    }

    /// Clears the image and loads a hex program from text.
    ///
    /// Each `@` directive moves the write cursor to `index * 4`; each data word is stored
    /// little-endian at the cursor, which then advances by four bytes.
    ///
    /// # Arguments
    ///
    /// * `text` - The image contents.
    /// * `origin` - Path reported in format errors.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Format`] if a directive is negative or a word does not fit.
    pub fn load_hex_str(&mut self, text: &str, origin: &Path) -> Result<LoadSummary> {
        self.clear();
        let mut summary = LoadSummary::default();
        let mut cursor: u64 = 0;

        for (idx, line) in text.lines().enumerate() {
            let Some(parsed) = parse_image_line(line) else {
                continue;
            };
            let format_error = |reason: String| HarnessError::Format {
                path: origin.to_path_buf(),
                line: idx + 1,
                reason,
            };

            if let Some(index) = parsed.origin {
                cursor = u64::try_from(index)
                    .ok()
                    .and_then(|i| i.checked_mul(FILE_WORD_BYTES))
                    .ok_or_else(|| format_error(format!("invalid origin @{index:x}")))?;
            }
            for word in parsed.words {
                if !self.write_u32_le(cursor, word) {
                    return Err(format_error(format!(
                        "word at {cursor:#x} is beyond the {:#x}-byte memory",
                        self.len()
                    )));
                }
                cursor += FILE_WORD_BYTES;
                summary.words += 1;
                summary.end = summary.end.max(cursor);
            }
        }

        debug!(
            path = %origin.display(),
            words = summary.words,
            end = summary.end,
            "program image loaded"
        );
        Ok(summary)
    }

    /// Checks that every word of the dump range `[start, end)` lies inside the image.
    fn check_range(&self, start: u64, end: u64) -> Result<()> {
        if start >= end {
            return Ok(());
        }
        let words = (end - start).div_ceil(FILE_WORD_BYTES);
        let last_end = (words - 1)
            .checked_mul(FILE_WORD_BYTES)
            .and_then(|off| start.checked_add(off))
            .and_then(|last| last.checked_add(FILE_WORD_BYTES));
        match last_end {
            Some(limit) if limit <= self.len() as u64 => Ok(()),
            _ => Err(HarnessError::DumpRange {
                start,
                end,
                size: self.len() as u64,
            }),
        }
    }

    /// Writes the words of `[start, end)` in dump format.
    ///
    /// Words are read every four bytes from `start`; `start` need not be aligned.
    /// An empty or inverted range produces no output.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::DumpRange`] if the range does not fit, or the writer's error
    /// wrapped as [`HarnessError::FileIo`] against `label`.
    pub fn dump_hex<W: Write>(&self, out: W, start: u64, end: u64, label: &Path) -> Result<()> {
        self.check_range(start, end)?;
        let words = (start..end)
            .step_by(FILE_WORD_BYTES as usize)
            .map(|addr| self.read_u32_le(addr).unwrap_or_default());
        hex::write_dump(out, words).map_err(|e| HarnessError::io(label, e))
    }

    /// Dumps `[start, end)` to a file, creating or truncating it.
    ///
    /// The range is validated before the file is touched.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::DumpRange`], [`HarnessError::FileOpen`] or
    /// [`HarnessError::FileIo`].
    pub fn dump_to_file(&self, path: &Path, start: u64, end: u64) -> Result<()> {
        self.check_range(start, end)?;
        let file = fs::File::create(path).map_err(|e| HarnessError::open(path, e))?;
        self.dump_hex(BufWriter::new(file), start, end, path)?;
        trace!(path = %path.display(), start, end, "memory dumped");
        Ok(())
    }
}
