//! Run statistics collection and reporting.
//!
//! This module tracks what the harness did during a run. It provides:
//! 1. **Cases:** Test cases completed and skipped.
//! 2. **Cycles:** Warmup cycles spent in reset and cycles simulated with reset released.
//! 3. **Bus:** Reads, writes, error responses and responses delivered to the core.

use std::io::{self, Write};
use std::time::Instant;

use crate::soc::interconnect::BusCounters;

/// Run statistics accumulated by the sequencer across all test cases.
#[derive(Clone, Debug)]
pub struct SimStats {
    start_time: Instant,
    /// Test cases that ran to completion.
    pub cases_run: u64,
    /// Test cases skipped after a per-case error.
    pub cases_skipped: u64,

    /// Cycles spent with the core held in reset.
    pub reset_cycles: u64,
    /// Cycles simulated with reset released, drain included.
    pub cycles: u64,

    /// Read requests serviced.
    pub bus_reads: u64,
    /// Write requests serviced.
    pub bus_writes: u64,
    /// Responses carrying `mem_err`.
    pub bus_errors: u64,
    /// Valid responses driven to the core.
    pub responses_delivered: u64,
}

impl Default for SimStats {
    fn default() -> Self {
        Self {
            start_time: Instant::now(),
            cases_run: 0,
            cases_skipped: 0,
            reset_cycles: 0,
            cycles: 0,
            bus_reads: 0,
            bus_writes: 0,
            bus_errors: 0,
            responses_delivered: 0,
        }
    }
}

/// Section names for selective stats output.
///
/// Valid section identifiers: `"summary"`, `"cases"`, `"bus"`.
/// Pass an empty slice to `print_sections` to print all sections.
pub const STATS_SECTIONS: &[&str] = &["summary", "cases", "bus"];

impl SimStats {
    /// Adds one test case's bus traffic.
    pub fn absorb_bus(&mut self, counters: BusCounters) {
        self.bus_reads += counters.reads;
        self.bus_writes += counters.writes;
        self.bus_errors += counters.errors;
        self.responses_delivered += counters.delivered;
    }

    /// Writes the requested sections to `out`.
    ///
    /// # Errors
    ///
    /// Returns any error from `out`.
    pub fn write_sections<W: Write>(&self, out: &mut W, sections: &[String]) -> io::Result<()> {
        let want = |s: &str| sections.is_empty() || sections.iter().any(|x| x == s);
        let seconds = self.start_time.elapsed().as_secs_f64();
        let total = self.cycles + self.reset_cycles;

        if want("summary") {
            let khz = if seconds > 0.0 {
                (total as f64 / seconds) / 1000.0
            } else {
                0.0
            };
            writeln!(out, "\n==========================================================")?;
            writeln!(out, "TEST HARNESS STATISTICS")?;
            writeln!(out, "==========================================================")?;
            writeln!(out, "host_seconds             {seconds:.4} s")?;
            writeln!(out, "sim_cycles               {}", self.cycles)?;
            writeln!(out, "reset_cycles             {}", self.reset_cycles)?;
            writeln!(out, "sim_freq                 {khz:.2} kHz")?;
            writeln!(out, "----------------------------------------------------------")?;
        }
        if want("cases") {
            writeln!(out, "TEST CASES")?;
            writeln!(out, "  cases.completed        {}", self.cases_run)?;
            writeln!(out, "  cases.skipped          {}", self.cases_skipped)?;
            writeln!(out, "----------------------------------------------------------")?;
        }
        if want("bus") {
            let requests = self.bus_reads + self.bus_writes;
            let pct = |n: u64| {
                if requests == 0 {
                    0.0
                } else {
                    (n as f64 / requests as f64) * 100.0
                }
            };
            writeln!(out, "MEMORY BUS")?;
            writeln!(
                out,
                "  bus.reads              {} ({:.2}%)",
                self.bus_reads,
                pct(self.bus_reads)
            )?;
            writeln!(
                out,
                "  bus.writes             {} ({:.2}%)",
                self.bus_writes,
                pct(self.bus_writes)
            )?;
            writeln!(
                out,
                "  bus.errors             {} ({:.2}%)",
                self.bus_errors,
                pct(self.bus_errors)
            )?;
            writeln!(out, "  bus.delivered          {}", self.responses_delivered)?;
            writeln!(out, "==========================================================")?;
        }
        Ok(())
    }

    /// Prints only the requested statistics sections to stdout.
    pub fn print_sections(&self, sections: &[String]) {
        let mut out = io::stdout().lock();
        // Write errors on stdout are ignored.
        let _ = self.write_sections(&mut out, sections);
    }

    /// Prints all statistics sections to stdout.
    pub fn print(&self) {
        self.print_sections(&[]);
    }
}
