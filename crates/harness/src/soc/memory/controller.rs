//! Fixed-latency response pipeline.
//!
//! The memory answers every request after the same number of cycles and never reorders:
//! 1. **Entry:** A response is the `rvalid`/`rdata`/`err` triple driven back to the core.
//! 2. **Pipeline:** A ring of `latency` slots; slot 0 is this cycle's response, the oldest
//!    slot is the one delivered this cycle.
//! 3. **Combinational:** A latency of zero bypasses the ring entirely.

use crate::common::{HarnessError, Result};

/// A response travelling back to the core (one latency-queue entry).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BusResponse {
    /// Drives `mem_rvalid`; set iff a request was issued in the originating cycle.
    pub valid: bool,
    /// Drives `mem_rdata`; the full bus word at the effective address.
    pub data: u64,
    /// Drives `mem_err`; set when the raw request address was outside the image.
    pub error: bool,
}

impl BusResponse {
    /// The response driven while nothing is in flight.
    pub const IDLE: Self = Self {
        valid: false,
        data: 0,
        error: false,
    };
}

/// Ring buffer of in-flight responses modelling constant-latency memory.
///
/// Each [`LatencyPipeline::step`] pushes the response produced this cycle and returns the
/// one the core sees this cycle. With latency `L > 0` the response pushed at step `t` is
/// returned at step `t + L - 1`; the bus adapter drives it after the rising edge, so the
/// core registers it on edge `t + L`. With latency zero the pushed response is returned
/// immediately and driven before the rising edge.
#[derive(Clone, Debug)]
pub struct LatencyPipeline {
    slots: Vec<BusResponse>,
    head: usize,
}

impl LatencyPipeline {
    /// Creates a pipeline of `latency` cycles with every slot invalid.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Allocation`] if the slot buffer cannot be allocated.
    pub fn new(latency: usize) -> Result<Self> {
        let mut slots = Vec::new();
        slots
            .try_reserve_exact(latency)
            .map_err(|_| HarnessError::Allocation {
                what: "latency pipeline",
                bytes: latency.saturating_mul(size_of::<BusResponse>()),
            })?;
        slots.resize(latency, BusResponse::IDLE);
        Ok(Self { slots, head: 0 })
    }

    /// Returns the configured latency in cycles.
    #[inline]
    pub fn latency(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` when responses are delivered in the cycle they are produced.
    #[inline]
    pub fn is_combinational(&self) -> bool {
        self.slots.is_empty()
    }

    /// Invalidates every in-flight response.
    pub fn reset(&mut self) {
        self.slots.fill(BusResponse::IDLE);
        self.head = 0;
    }

    /// Returns the number of valid responses currently held.
    pub fn in_flight(&self) -> usize {
        self.slots.iter().filter(|r| r.valid).count()
    }

    /// Advances the pipeline by one cycle.
    ///
    /// # Arguments
    ///
    /// * `entry` - The response to the request sampled this cycle.
    ///
    /// # Returns
    ///
    /// The response to deliver to the core this cycle.
    #[inline]
    pub fn step(&mut self, entry: BusResponse) -> BusResponse {
        if self.slots.is_empty() {
            return entry;
        }
        let len = self.slots.len();
        self.slots[self.head] = entry;
        self.head = (self.head + 1) % len;
        self.slots[self.head]
    }
}
