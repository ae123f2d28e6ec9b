/// Test manifest parsing.
pub mod manifest;

/// Test sequencer state machine.
pub mod simulator;

/// Simulation clock and waveform tracing.
pub mod trace;

pub use manifest::{TestCase, load_manifest, parse_manifest};
pub use simulator::{
    CaseOutcome, CaseReport, CycleReport, RunSummary, SequencerState, TestSequencer,
};
pub use trace::{SimClock, Tracer, VcdTracer};
