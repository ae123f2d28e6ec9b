//! Simulation time and waveform tracing.
//!
//! 1. **Clock:** `SimClock` counts simulated cycles for one run and restarts with each run.
//! 2. **Tracer:** An optional collaborator sampled once per cycle with the current pin values.
//! 3. **VCD:** `VcdTracer` writes the bus pins as a Value Change Dump.
//!
//! Tracers only observe; attaching or detaching one never changes simulation results.

use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::common::{HarnessError, Result};
use crate::soc::traits::PinSnapshot;

/// Cycle counter used to timestamp trace samples.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SimClock {
    time: u64,
}

impl SimClock {
    /// Advances time by one cycle and returns the new timestamp.
    #[inline]
    pub fn tick(&mut self) -> u64 {
        self.time += 1;
        self.time
    }

    /// Returns the current timestamp.
    #[inline]
    pub fn now(&self) -> u64 {
        self.time
    }

    /// Restarts time at zero.
    pub fn reset(&mut self) {
        self.time = 0;
    }
}

/// Receives one pin sample per simulated cycle.
pub trait Tracer: fmt::Debug {
    /// Records the pins at `time`; timestamps are strictly increasing within a run.
    ///
    /// # Errors
    ///
    /// Returns any error from the underlying sink.
    fn sample(&mut self, time: u64, pins: &PinSnapshot) -> io::Result<()>;

    /// Flushes and closes the trace.
    ///
    /// # Errors
    ///
    /// Returns any error from the underlying sink.
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Signal table: VCD identifier, name, width in bits.
const SIGNALS: [(char, &str, u32); 9] = [
    ('!', "rst_n", 1),
    ('"', "mem_req", 1),
    ('#', "mem_we", 1),
    ('$', "mem_addr", 64),
    ('%', "mem_be", 8),
    ('&', "mem_wdata", 64),
    ('\'', "mem_rvalid", 1),
    ('(', "mem_rdata", 64),
    (')', "mem_err", 1),
];

fn values(pins: &PinSnapshot) -> [u64; 9] {
    [
        u64::from(pins.rst_n),
        u64::from(pins.mem_req),
        u64::from(pins.mem_we),
        pins.mem_addr,
        u64::from(pins.mem_be),
        pins.mem_wdata,
        u64::from(pins.mem_rvalid),
        pins.mem_rdata,
        u64::from(pins.mem_err),
    ]
}

/// Writes bus pins as a Value Change Dump.
#[derive(Debug)]
pub struct VcdTracer<W: Write> {
    out: W,
    last: Option<[u64; 9]>,
}

impl VcdTracer<BufWriter<File>> {
    /// Creates a VCD file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Waveform`] if the file cannot be created or the header written.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|source| HarnessError::Waveform { source })?;
        Self::new(BufWriter::new(file)).map_err(|source| HarnessError::Waveform { source })
    }
}

impl<W: Write> VcdTracer<W> {
    /// Wraps `out` and writes the VCD header.
    ///
    /// # Errors
    ///
    /// Returns any error from writing the header.
    pub fn new(mut out: W) -> io::Result<Self> {
        writeln!(out, "$timescale 1ns $end")?;
        writeln!(out, "$scope module tb $end")?;
        for (id, name, width) in SIGNALS {
            writeln!(out, "$var wire {width} {id} {name} $end")?;
        }
        writeln!(out, "$upscope $end")?;
        writeln!(out, "$enddefinitions $end")?;
        Ok(Self { out, last: None })
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_value(&mut self, idx: usize, value: u64) -> io::Result<()> {
        let (id, _, width) = SIGNALS[idx];
        if width == 1 {
            writeln!(self.out, "{value}{id}")
        } else {
            writeln!(self.out, "b{value:b} {id}")
        }
    }
}

impl<W: Write + fmt::Debug> Tracer for VcdTracer<W> {
    fn sample(&mut self, time: u64, pins: &PinSnapshot) -> io::Result<()> {
        let current = values(pins);
        writeln!(self.out, "#{time}")?;
        match self.last {
            None => {
                writeln!(self.out, "$dumpvars")?;
                for (idx, &value) in current.iter().enumerate() {
                    self.write_value(idx, value)?;
                }
                writeln!(self.out, "$end")?;
            }
            Some(previous) => {
                for (idx, (&value, &old)) in current.iter().zip(previous.iter()).enumerate() {
                    if value != old {
                        self.write_value(idx, value)?;
                    }
                }
            }
        }
        self.last = Some(current);
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}
