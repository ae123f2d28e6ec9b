//! Bus adapter between the core's memory pins and the memory image.
//!
//! Each simulated cycle the adapter:
//! 1. **Samples** the request pins (`mem_req`, `mem_we`, `mem_addr`, `mem_be`, `mem_wdata`).
//! 2. **Services** the request at the wrapped, word-aligned address: byte-enabled write first,
//!    then a full-word read that feeds the latency pipeline.
//! 3. **Clocks** the core: rising edge, response pins from the pipeline, falling edge, with
//!    an `eval` after each change.

use tracing::trace;

pub use super::memory::controller::BusResponse;
use super::memory::MemoryImage;
use super::memory::controller::LatencyPipeline;
use super::traits::{CoreModel, PinSnapshot};
use crate::common::{BusAddr, Result};
use crate::config::HarnessConfig;

/// One cycle's request as sampled from the core's outputs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BusTransaction {
    /// `mem_req`: a request is issued this cycle.
    pub request: bool,
    /// `mem_we`: the request is a write.
    pub write: bool,
    /// `mem_addr`: raw byte address.
    pub address: BusAddr,
    /// `mem_be`: byte lanes stored by a write.
    pub byte_enable: u8,
    /// `mem_wdata`: write data.
    pub write_data: u64,
}

impl BusTransaction {
    /// Samples the request pins of `core`.
    pub fn sample<C: CoreModel + ?Sized>(core: &C) -> Self {
        Self {
            request: core.mem_req(),
            write: core.mem_we(),
            address: BusAddr::new(core.mem_addr()),
            byte_enable: core.mem_be(),
            write_data: core.mem_wdata(),
        }
    }

    /// Returns `true` if this is a write request.
    #[inline]
    pub const fn is_write(&self) -> bool {
        self.request && self.write
    }

    /// Returns `true` if this is the completion sentinel (any request to address zero).
    #[inline]
    pub const fn is_sentinel(&self) -> bool {
        self.request && self.address.is_sentinel()
    }
}

/// Running counts of serviced bus traffic.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BusCounters {
    /// Read requests serviced.
    pub reads: u64,
    /// Write requests serviced.
    pub writes: u64,
    /// Requests answered with `mem_err` set.
    pub errors: u64,
    /// Valid responses driven to the core.
    pub delivered: u64,
}

/// Services one request per cycle against a [`MemoryImage`].
#[derive(Debug)]
pub struct BusAdapter {
    pipeline: LatencyPipeline,
    mem_size: u64,
    word_bytes: usize,
    driven: BusResponse,
    counters: BusCounters,
}

impl BusAdapter {
    /// Creates an adapter for the bus described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::HarnessError::Config`] if `config` fails validation, or
    /// [`crate::HarnessError::Allocation`] if the pipeline cannot be allocated.
    pub fn new(config: &HarnessConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            pipeline: LatencyPipeline::new(config.mem_latency)?,
            mem_size: config.mem_size as u64,
            word_bytes: config.word_bytes(),
            driven: BusResponse::IDLE,
            counters: BusCounters::default(),
        })
    }

    /// Returns the response currently driven onto the core's inputs.
    pub fn driven(&self) -> BusResponse {
        self.driven
    }

    /// Returns the traffic counters accumulated since the last [`BusAdapter::reset`].
    pub fn counters(&self) -> BusCounters {
        self.counters
    }

    /// Drops all in-flight responses and clears the counters.
    pub fn reset(&mut self) {
        self.pipeline.reset();
        self.driven = BusResponse::IDLE;
        self.counters = BusCounters::default();
    }

    /// Drives an idle response (no `rvalid`, zero data, no error) onto the core.
    pub fn drive_idle<C: CoreModel + ?Sized>(&mut self, core: &mut C) {
        self.drive(core, BusResponse::IDLE);
    }

    fn drive<C: CoreModel + ?Sized>(&mut self, core: &mut C, response: BusResponse) {
        core.set_mem_rvalid(response.valid);
        core.set_mem_rdata(response.data);
        core.set_mem_err(response.error);
        self.driven = response;
    }

    /// Performs the memory access for `txn` and builds its response.
    ///
    /// Writes honor `byte_enable`; the read that follows always returns the whole bus word
    /// and therefore observes a write made in the same cycle.
    pub fn service(&mut self, memory: &mut MemoryImage, txn: &BusTransaction) -> BusResponse {
        let effective = txn
            .address
            .effective(self.mem_size, self.word_bytes as u64);

        if txn.is_write() {
            memory.write_lanes(effective, txn.write_data, txn.byte_enable, self.word_bytes);
            self.counters.writes += 1;
        } else if txn.request {
            self.counters.reads += 1;
        }

        let response = BusResponse {
            valid: txn.request,
            data: memory.read_lanes(effective, self.word_bytes),
            error: txn.address.is_out_of_range(self.mem_size),
        };
        if response.valid && response.error {
            self.counters.errors += 1;
        }
        if txn.request {
            trace!(
                addr = format_args!("{:#x}", txn.address),
                effective = format_args!("{effective:#x}"),
                write = txn.write,
                be = txn.byte_enable,
                data = format_args!("{:#x}", response.data),
                error = response.error,
                "bus request"
            );
        }
        response
    }

    /// Simulates one full clock cycle of the bus.
    ///
    /// Samples the core's request, services it, pushes the response into the pipeline and
    /// drives the pipeline's output back while toggling the clock high then low.
    ///
    /// # Returns
    ///
    /// The transaction sampled at the start of the cycle.
    pub fn step<C: CoreModel + ?Sized>(
        &mut self,
        core: &mut C,
        memory: &mut MemoryImage,
    ) -> BusTransaction {
        let txn = BusTransaction::sample(core);
        let response = self.service(memory, &txn);
        let delivered = self.pipeline.step(response);

        if self.pipeline.is_combinational() {
            self.drive(core, delivered);
            core.eval();
        }

        core.set_clk(true);
        core.eval();

        if !self.pipeline.is_combinational() {
            self.drive(core, delivered);
            core.eval();
        }

        core.set_clk(false);
        core.eval();

        if delivered.valid {
            self.counters.delivered += 1;
        }
        txn
    }

    /// Captures the pins of `core` together with the response currently driven.
    pub fn snapshot<C: CoreModel + ?Sized>(&self, core: &C, rst_n: bool) -> PinSnapshot {
        PinSnapshot {
            rst_n,
            mem_req: core.mem_req(),
            mem_we: core.mem_we(),
            mem_addr: core.mem_addr(),
            mem_be: core.mem_be(),
            mem_wdata: core.mem_wdata(),
            mem_rvalid: self.driven.valid,
            mem_rdata: self.driven.data,
            mem_err: self.driven.error,
        }
    }
}
