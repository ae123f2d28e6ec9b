//! Cycle-accurate memory-bus test harness.
//!
//! This crate drives a pin-level CPU core model through a simple memory bus and provides:
//! 1. **Memory:** A flat byte image with hex program loading and hex dumps.
//! 2. **Timing:** A fixed-latency response pipeline modelling a single-port memory.
//! 3. **Bus:** The per-cycle adapter that services requests and clocks the core.
//! 4. **Sequencing:** Reset, warmup, run-until-sentinel and drain for each test case.
//! 5. **Support:** Configuration, errors, waveform tracing, statistics and a scripted core model.

/// Common types and constants (bus addresses, errors).
pub mod common;
/// Harness configuration (bus width, memory size, latency, drain cycles).
pub mod config;
/// Core models shipped with the harness (scripted bus-functional model).
pub mod core;
/// Test manifest, sequencer and tracing.
pub mod sim;
/// Memory image, latency pipeline, bus adapter and the core pin interface.
pub mod soc;
/// Run statistics collection and reporting.
pub mod stats;

/// Error type returned by every fallible harness operation.
pub use crate::common::HarnessError;
/// Root configuration type; use `HarnessConfig::default()` or deserialize from JSON.
pub use crate::config::HarnessConfig;
/// Test sequencer; owns the core model and memory image for a run.
pub use crate::sim::TestSequencer;
/// Pin-level interface implemented by every core model.
pub use crate::soc::CoreModel;
