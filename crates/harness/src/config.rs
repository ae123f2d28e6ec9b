//! Configuration for the test harness.
//!
//! This module defines the process parameters that shape the memory model. It provides:
//! 1. **Defaults:** A 32-bit bus, 1 MiB of memory and a 10-cycle reset window.
//! 2. **Structure:** A flat `HarnessConfig` deserializable from JSON.
//! 3. **Validation:** Checks applied before any buffer is allocated or cycle is simulated.
//!
//! The CLI builds the config from positional arguments through [`parse_numeric`]; embedders
//! (for example a generated model binding) may supply JSON through [`HarnessConfig::from_json`].

use std::path::PathBuf;

use serde::Deserialize;

use crate::common::constants::{MAX_BUS_WIDTH, RESET_CYCLES};
use crate::common::{HarnessError, Result};

/// Default configuration constants for the harness.
mod defaults {
    /// Bus word width in bits.
    pub const MEM_WIDTH: u32 = 32;

    /// Memory image size in bytes (1 MiB).
    pub const MEM_SIZE: usize = 1024 * 1024;

    /// Cycles between a request and the core observing its response.
    pub const MEM_LATENCY: usize = 1;

    /// Cycles simulated after the completion sentinel.
    pub const EXTRA_CYCLES: u64 = 0;
}

/// Harness configuration.
///
/// # Examples
///
/// ```
/// use tbsim_core::config::HarnessConfig;
///
/// let json = r#"{ "mem_width": 32, "mem_size": 1024, "mem_latency": 2, "extra_cycles": 5 }"#;
/// let config = HarnessConfig::from_json(json).unwrap();
/// assert_eq!(config.word_bytes(), 4);
/// assert_eq!(config.reset_cycles, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HarnessConfig {
    /// Bus word width in bits (8, 16, 32 or 64).
    #[serde(default = "HarnessConfig::default_mem_width")]
    pub mem_width: u32,

    /// Memory image size in bytes.
    #[serde(default = "HarnessConfig::default_mem_size")]
    pub mem_size: usize,

    /// Fixed response latency in cycles; zero answers within the request cycle.
    #[serde(default = "HarnessConfig::default_mem_latency")]
    pub mem_latency: usize,

    /// Cycles to keep simulating after the completion sentinel is seen.
    #[serde(default)]
    pub extra_cycles: u64,

    /// Cycles the core is held in reset before each test case.
    #[serde(default = "HarnessConfig::default_reset_cycles")]
    pub reset_cycles: u64,

    /// Optional watchdog: abandon a test case that runs this many cycles without completing.
    #[serde(default)]
    pub cycle_limit: Option<u64>,

    /// Optional VCD waveform output path.
    #[serde(default)]
    pub waveform: Option<PathBuf>,
}

impl HarnessConfig {
    fn default_mem_width() -> u32 {
        defaults::MEM_WIDTH
    }

    fn default_mem_size() -> usize {
        defaults::MEM_SIZE
    }

    fn default_mem_latency() -> usize {
        defaults::MEM_LATENCY
    }

    fn default_reset_cycles() -> u64 {
        RESET_CYCLES
    }

    /// Parses and validates a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Config`] if the JSON is malformed or a value is out of range.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| HarnessError::Config {
            name: "CONFIG",
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Returns the bus word size in bytes (the number of byte lanes).
    #[inline]
    pub const fn word_bytes(&self) -> usize {
        (self.mem_width / 8) as usize
    }

    /// Checks that the parameters describe a usable memory model.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Config`] naming the first offending parameter.
    pub fn validate(&self) -> Result<()> {
        if self.mem_width < 8 || self.mem_width > MAX_BUS_WIDTH || !self.mem_width.is_power_of_two()
        {
            return Err(HarnessError::Config {
                name: "MEM_W",
                reason: format!("{} is not one of 8, 16, 32, 64", self.mem_width),
            });
        }
        if self.mem_size == 0 {
            return Err(HarnessError::Config {
                name: "MEM_SZ",
                reason: "memory size must be non-zero".to_string(),
            });
        }
        if self.mem_size % self.word_bytes() != 0 {
            return Err(HarnessError::Config {
                name: "MEM_SZ",
                reason: format!(
                    "{} is not a multiple of the {}-byte bus word",
                    self.mem_size,
                    self.word_bytes()
                ),
            });
        }
        if self.cycle_limit == Some(0) {
            return Err(HarnessError::Config {
                name: "CYCLE_LIMIT",
                reason: "limit must be non-zero".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            mem_width: defaults::MEM_WIDTH,
            mem_size: defaults::MEM_SIZE,
            mem_latency: defaults::MEM_LATENCY,
            extra_cycles: defaults::EXTRA_CYCLES,
            reset_cycles: RESET_CYCLES,
            cycle_limit: None,
            waveform: None,
        }
    }
}

/// Parses a decimal process parameter.
///
/// The whole string must be a base-10 unsigned integer; surrounding whitespace is not accepted.
///
/// # Arguments
///
/// * `name` - Parameter name used in the error message (e.g. `"MEM_LATENCY"`).
/// * `text` - The raw argument.
///
/// # Errors
///
/// Returns [`HarnessError::Config`] if `text` is empty or not a valid number.
pub fn parse_numeric(name: &'static str, text: &str) -> Result<u64> {
    text.parse::<u64>().map_err(|e| HarnessError::Config {
        name,
        reason: format!("`{text}': {e}"),
    })
}
