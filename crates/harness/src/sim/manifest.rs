//! Test manifest parsing.
//!
//! A manifest lists one test case per line as seven whitespace-separated fields:
//!
//! ```text
//! program_path reference_path ref_start ref_end dump_path dump_start dump_end
//! ```
//!
//! Address fields are hex. Lines with any other field count, or with a malformed address
//! field, are skipped without complaint.

use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::common::constants::MANIFEST_FIELDS;
use crate::common::{HarnessError, Result};
use crate::soc::memory::hex::parse_hex_field;

/// One test case from a manifest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestCase {
    /// Hex program image loaded before reset.
    pub program: PathBuf,
    /// File receiving a dump of `ref_range` taken right after loading.
    pub reference: PathBuf,
    /// Byte range written to `reference`.
    pub ref_range: Range<u64>,
    /// File receiving a dump of `dump_range` taken after the run.
    pub dump: PathBuf,
    /// Byte range written to `dump`.
    pub dump_range: Range<u64>,
}

impl TestCase {
    /// Parses one manifest line.
    ///
    /// # Returns
    ///
    /// `None` unless the line has exactly seven fields with valid hex address fields.
    pub fn parse_line(line: &str) -> Option<Self> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != MANIFEST_FIELDS {
            return None;
        }
        let [program, reference, ref_start, ref_end, dump, dump_start, dump_end] =
            fields.as_slice()
        else {
            return None;
        };
        Some(Self {
            program: PathBuf::from(program),
            reference: PathBuf::from(reference),
            ref_range: parse_hex_field(ref_start)?..parse_hex_field(ref_end)?,
            dump: PathBuf::from(dump),
            dump_range: parse_hex_field(dump_start)?..parse_hex_field(dump_end)?,
        })
    }
}

/// Parses every usable line of a manifest.
pub fn parse_manifest(text: &str) -> Vec<TestCase> {
    text.lines()
        .enumerate()
        .filter_map(|(idx, line)| {
            let case = TestCase::parse_line(line);
            if case.is_none() && !line.trim().is_empty() {
                trace!(line = idx + 1, "manifest line skipped");
            }
            case
        })
        .collect()
}

/// Reads and parses a manifest file.
///
/// # Errors
///
/// Returns [`HarnessError::FileOpen`] if the manifest cannot be read.
pub fn load_manifest(path: &Path) -> Result<Vec<TestCase>> {
    let raw = fs::read(path).map_err(|e| HarnessError::open(path, e))?;
    Ok(parse_manifest(&String::from_utf8_lossy(&raw)))
}
