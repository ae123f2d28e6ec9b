//! Test sequencer: owns the core, the memory image and the bus for a batch of test cases.
//!
//! Every test case walks the same state machine:
//! 1. **Reset:** The image is reloaded, the reference range captured and the pipeline cleared.
//! 2. **Warmup:** `rst_n` is held low for `reset_cycles` clock cycles with no bus traffic.
//! 3. **Running:** The bus adapter steps once per cycle until the core requests address zero.
//! 4. **Draining:** Exactly `extra_cycles` further cycles are simulated.
//! 5. **Done:** The reference and dump files are written and the next case starts over.
//!
//! Per-case failures are logged and the case is skipped or flagged; errors for which
//! [`HarnessError::is_fatal`] holds abort the whole run.

use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info};

use super::manifest::{TestCase, load_manifest};
use super::trace::{SimClock, Tracer};
use crate::common::{HarnessError, Result};
use crate::config::HarnessConfig;
use crate::soc::interconnect::{BusAdapter, BusTransaction};
use crate::soc::memory::MemoryImage;
use crate::soc::traits::CoreModel;
use crate::stats::SimStats;

/// Where the sequencer is within the current test case.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SequencerState {
    /// Pipeline cleared, reset about to be asserted.
    Reset,
    /// Core held in reset while the clock runs.
    Warmup,
    /// Reset released; waiting for the completion sentinel.
    Running,
    /// Sentinel seen; `remaining` cycles left before the dump.
    Draining {
        /// Cycles still to simulate.
        remaining: u64,
    },
    /// Simulation of the current case has finished.
    Done,
}

/// Cycle counts from one [`TestSequencer::run_to_completion`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Cycles simulated after reset was released, drain included.
    pub cycles: u64,
    /// Cycle (one-based) after which the sentinel request was first seen.
    pub sentinel_cycle: u64,
}

/// Result of one completed test case.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaseReport {
    /// Program image the case ran.
    pub program: PathBuf,
    /// Cycles simulated after reset was released.
    pub cycles: u64,
    /// Cycle after which the sentinel was first seen.
    pub sentinel_cycle: u64,
    /// Whether the reference dump was written.
    pub reference_written: bool,
    /// Whether the final dump was written.
    pub dump_written: bool,
}

/// What happened to one manifest entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CaseOutcome {
    /// The case ran to completion.
    Completed(CaseReport),
    /// The case was abandoned after a non-fatal error.
    Skipped {
        /// Program image of the abandoned case.
        program: PathBuf,
        /// Rendered error.
        reason: String,
    },
}

/// Outcomes of a batch of test cases, in manifest order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// One entry per test case.
    pub outcomes: Vec<CaseOutcome>,
}

impl RunSummary {
    /// Returns the reports of the cases that completed.
    pub fn completed(&self) -> impl Iterator<Item = &CaseReport> {
        self.outcomes.iter().filter_map(|o| match o {
            CaseOutcome::Completed(report) => Some(report),
            CaseOutcome::Skipped { .. } => None,
        })
    }

    /// Returns the number of skipped cases.
    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, CaseOutcome::Skipped { .. }))
            .count()
    }
}

/// Drives a [`CoreModel`] through a batch of test cases.
#[derive(Debug)]
pub struct TestSequencer<C: CoreModel> {
    core: C,
    memory: MemoryImage,
    bus: BusAdapter,
    config: HarnessConfig,
    state: SequencerState,
    rst_n: bool,
    clock: SimClock,
    tracer: Option<Box<dyn Tracer>>,
    stats: SimStats,
}

impl<C: CoreModel> TestSequencer<C> {
    /// Validates `config` and allocates the memory image and response pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Config`] or [`HarnessError::Allocation`].
    pub fn new(core: C, config: HarnessConfig) -> Result<Self> {
        config.validate()?;
        let memory = MemoryImage::new(config.mem_size)?;
        let bus = BusAdapter::new(&config)?;
        Ok(Self {
            core,
            memory,
            bus,
            config,
            state: SequencerState::Reset,
            rst_n: false,
            clock: SimClock::default(),
            tracer: None,
            stats: SimStats::default(),
        })
    }

    /// Attaches a tracer sampled once per simulated cycle.
    #[must_use]
    pub fn with_tracer(mut self, tracer: Box<dyn Tracer>) -> Self {
        self.tracer = Some(tracer);
        self
    }

    /// Returns the current state.
    pub fn state(&self) -> SequencerState {
        self.state
    }

    /// Returns the memory image.
    pub fn memory(&self) -> &MemoryImage {
        &self.memory
    }

    /// Returns the memory image mutably, e.g. to load a program without a manifest.
    pub fn memory_mut(&mut self) -> &mut MemoryImage {
        &mut self.memory
    }

    /// Returns the core model.
    pub fn core(&self) -> &C {
        &self.core
    }

    /// Returns the core model mutably.
    pub fn core_mut(&mut self) -> &mut C {
        &mut self.core
    }

    /// Returns the statistics accumulated so far.
    pub fn stats(&self) -> &SimStats {
        &self.stats
    }

    /// Returns the simulation clock.
    pub fn clock(&self) -> SimClock {
        self.clock
    }

    /// Loads a manifest and runs every case in it.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::FileOpen`] if the manifest cannot be read, or the first fatal
    /// error raised by a case.
    pub fn run_manifest(&mut self, path: &Path) -> Result<RunSummary> {
        let cases = load_manifest(path)?;
        info!(path = %path.display(), cases = cases.len(), "manifest loaded");
        self.run_cases(&cases)
    }

    /// Runs `cases` in order, restarting simulation time at zero.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error; non-fatal errors skip their case.
    pub fn run_cases(&mut self, cases: &[TestCase]) -> Result<RunSummary> {
        self.clock.reset();
        let mut summary = RunSummary::default();
        for case in cases {
            match self.run_case(case) {
                Ok(report) => {
                    self.stats.cases_run += 1;
                    summary.outcomes.push(CaseOutcome::Completed(report));
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    error!(program = %case.program.display(), "test case skipped: {e}");
                    self.stats.cases_skipped += 1;
                    summary.outcomes.push(CaseOutcome::Skipped {
                        program: case.program.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        info!(
            completed = self.stats.cases_run,
            skipped = self.stats.cases_skipped,
            "run finished"
        );
        Ok(summary)
    }

    /// Runs a single test case: load, reference dump, reset, run, drain, dump.
    ///
    /// The reference range is captured right after loading but written only once the run
    /// completes, so a skipped case leaves neither file behind.
    ///
    /// Reference and final dump failures are logged and reported in the returned
    /// [`CaseReport`] without failing the case.
    ///
    /// # Errors
    ///
    /// Returns the program load error, [`HarnessError::CycleLimit`], or a fatal error.
    pub fn run_case(&mut self, case: &TestCase) -> Result<CaseReport> {
        info!(program = %case.program.display(), "running test case");
        self.state = SequencerState::Reset;
        let _ = self.memory.load_hex(&case.program)?;
        let reference = self.snapshot_reference(case);

        self.reset_core()?;
        let run = self.run_to_completion();
        self.stats.absorb_bus(self.bus.counters());
        let run = run?;

        let reference_written = reference.is_some_and(|words| {
            let written = fs::write(&case.reference, words)
                .map_err(|e| HarnessError::open(&case.reference, e));
            Self::report_dump("reference", written)
        });
        let dump_written = self.write_dump("dump", &case.dump, &case.dump_range);
        info!(
            program = %case.program.display(),
            cycles = run.cycles,
            sentinel = run.sentinel_cycle,
            "test case done"
        );
        Ok(CaseReport {
            program: case.program.clone(),
            cycles: run.cycles,
            sentinel_cycle: run.sentinel_cycle,
            reference_written,
            dump_written,
        })
    }

    /// Renders the reference range as loaded, before the core runs.
    ///
    /// The text is written out only once the case completes.
    fn snapshot_reference(&self, case: &TestCase) -> Option<Vec<u8>> {
        let mut words = Vec::new();
        let range = &case.ref_range;
        let rendered = self
            .memory
            .dump_hex(&mut words, range.start, range.end, &case.reference);
        Self::report_dump("reference", rendered).then_some(words)
    }

    fn write_dump(&self, what: &'static str, path: &Path, range: &Range<u64>) -> bool {
        Self::report_dump(what, self.memory.dump_to_file(path, range.start, range.end))
    }

    fn report_dump(what: &'static str, result: Result<()>) -> bool {
        match result {
            Ok(()) => true,
            Err(e) => {
                error!(kind = what, "memory dump failed: {e}");
                false
            }
        }
    }

    /// Clears the response pipeline and holds the core in reset for the warmup window.
    ///
    /// During warmup the response pins are idle and no requests are serviced. On return
    /// reset has been released and the sequencer is [`SequencerState::Running`].
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Waveform`] if the tracer fails.
    pub fn reset_core(&mut self) -> Result<()> {
        self.state = SequencerState::Reset;
        self.bus.reset();
        self.rst_n = false;
        self.core.set_rst_n(false);
        self.bus.drive_idle(&mut self.core);
        self.core.set_clk(false);
        self.core.eval();

        self.set_state(SequencerState::Warmup);
        for _ in 0..self.config.reset_cycles {
            self.core.set_clk(true);
            self.core.eval();
            self.core.set_clk(false);
            self.core.eval();
            self.stats.reset_cycles += 1;
            self.sample()?;
        }

        self.rst_n = true;
        self.core.set_rst_n(true);
        self.core.eval();
        self.set_state(SequencerState::Running);
        Ok(())
    }

    /// Steps the bus until the sentinel has been seen and the drain window has elapsed.
    ///
    /// Starts with [`TestSequencer::reset_core`] if reset has not been run yet. A sentinel
    /// with `extra_cycles == 0` finishes on the cycle that raised it.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::CycleLimit`] if a limit is configured and the sentinel does not
    /// appear in time, or [`HarnessError::Waveform`] if the tracer fails.
    pub fn run_to_completion(&mut self) -> Result<CycleReport> {
        if matches!(self.state, SequencerState::Reset | SequencerState::Warmup) {
            self.reset_core()?;
        }
        let mut report = CycleReport::default();

        while self.state != SequencerState::Done {
            if let (SequencerState::Running, Some(limit)) = (self.state, self.config.cycle_limit) {
                if report.cycles >= limit {
                    return Err(HarnessError::CycleLimit { limit });
                }
            }

            let _ = self.bus.step(&mut self.core, &mut self.memory);
            report.cycles += 1;
            self.stats.cycles += 1;
            self.sample()?;

            let next = match self.state {
                SequencerState::Running if BusTransaction::sample(&self.core).is_sentinel() => {
                    report.sentinel_cycle = report.cycles;
                    match self.config.extra_cycles {
                        0 => SequencerState::Done,
                        remaining => SequencerState::Draining { remaining },
                    }
                }
                SequencerState::Draining { remaining } if remaining <= 1 => SequencerState::Done,
                SequencerState::Draining { remaining } => SequencerState::Draining {
                    remaining: remaining - 1,
                },
                other => other,
            };
            self.set_state(next);
        }
        Ok(report)
    }

    fn set_state(&mut self, next: SequencerState) {
        if next == self.state {
            return;
        }
        // Drain countdown steps are not logged.
        if !matches!(
            (self.state, next),
            (SequencerState::Draining { .. }, SequencerState::Draining { .. })
        ) {
            debug!(from = ?self.state, to = ?next, time = self.clock.now(), "sequencer state");
        }
        self.state = next;
    }

    fn sample(&mut self) -> Result<()> {
        let time = self.clock.tick();
        if let Some(tracer) = self.tracer.as_mut() {
            let pins = self.bus.snapshot(&self.core, self.rst_n);
            tracer
                .sample(time, &pins)
                .map_err(|source| HarnessError::Waveform { source })?;
        }
        Ok(())
    }

    /// Finalizes the core and closes the tracer, returning the core.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Waveform`] if the tracer cannot be flushed.
    pub fn finish(mut self) -> Result<C> {
        self.core.finalize();
        if let Some(tracer) = self.tracer.as_mut() {
            tracer
                .close()
                .map_err(|source| HarnessError::Waveform { source })?;
        }
        Ok(self.core)
    }
}
