//! Harness error definitions.
//!
//! Every fallible operation returns [`HarnessError`]. The sequencer decides per variant
//! whether a failure aborts the whole run or only skips the current test case:
//! 1. **Fatal:** Bad parameters, allocation failure, waveform output failure.
//! 2. **Per case:** Program, reference and dump file problems, dump ranges, watchdog expiry.
//!
//! Fatal errors map to distinct process exit statuses through [`HarnessError::exit_code`].

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias for results carrying a [`HarnessError`].
pub type Result<T> = std::result::Result<T, HarnessError>;

/// Errors raised by the memory model, sequencer and configuration layer.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// A process parameter is missing, non-numeric or out of its valid range.
    #[error("invalid {name} argument: {reason}")]
    Config {
        /// Parameter name as shown in the usage text (e.g. `MEM_W`).
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// A file could not be opened or created.
    #[error("opening `{}': {}", .path.display(), .source)]
    FileOpen {
        /// The path that failed to open.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// Reading or writing an already opened file failed.
    #[error("accessing `{}': {}", .path.display(), .source)]
    FileIo {
        /// The file being accessed.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// A buffer could not be allocated.
    #[error("allocating {bytes} bytes for the {what}")]
    Allocation {
        /// Which buffer failed (memory image, latency pipeline).
        what: &'static str,
        /// Requested size in bytes.
        bytes: usize,
    },

    /// An input file is structurally unusable.
    #[error("{}:{}: {}", .path.display(), .line, .reason)]
    Format {
        /// The offending file.
        path: PathBuf,
        /// One-based line number, or zero when the whole file is affected.
        line: usize,
        /// Description of the problem.
        reason: String,
    },

    /// A dump or reference range does not fit inside the memory image.
    #[error("dump range [{start:#x}, {end:#x}) exceeds memory size {size:#x}")]
    DumpRange {
        /// First byte address of the range.
        start: u64,
        /// One past the last byte address of the range.
        end: u64,
        /// Memory image size in bytes.
        size: u64,
    },

    /// The core never signalled completion within the configured cycle limit.
    #[error("no completion sentinel within {limit} cycles")]
    CycleLimit {
        /// Configured watchdog limit.
        limit: u64,
    },

    /// The waveform trace could not be written.
    #[error("writing waveform: {source}")]
    Waveform {
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

impl HarnessError {
    /// Wraps an I/O error that happened while opening `path`.
    pub fn open(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::FileOpen {
            path: path.into(),
            source,
        }
    }

    /// Wraps an I/O error that happened while reading or writing `path`.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::FileIo {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` if the error must abort the whole run.
    ///
    /// Per-case file and range problems are reported and the sequencer moves on to the
    /// next test case.
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Config { .. } | Self::Allocation { .. } | Self::Waveform { .. }
        )
    }

    /// Returns the process exit status for this failure class.
    ///
    /// | Class | Status |
    /// |---|---|
    /// | configuration, format, range, watchdog | 1 |
    /// | file open / access (e.g. the manifest) | 2 |
    /// | allocation | 3 |
    /// | waveform output | 4 |
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::FileOpen { .. } | Self::FileIo { .. } => 2,
            Self::Allocation { .. } => 3,
            Self::Waveform { .. } => 4,
            Self::Config { .. }
            | Self::Format { .. }
            | Self::DumpRange { .. }
            | Self::CycleLimit { .. } => 1,
        }
    }
}
