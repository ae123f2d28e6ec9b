//! Core model trait for pin-level simulation.
//!
//! This module defines the `CoreModel` trait implemented by every hardware-under-test. It provides:
//! 1. **Inputs:** Clock, active-low reset and the memory response pins.
//! 2. **Outputs:** The memory request pins sampled once per cycle by the bus adapter.
//! 3. **Lifecycle:** `eval` after every input change and a one-time `finalize` at shutdown.
//!
//! Generated model bindings implement this trait by forwarding to the model's port fields.

/// A clocked device exposing the harness memory-bus pins.
///
/// Setters only latch pin values; nothing inside the model changes until [`CoreModel::eval`]
/// is called. Getters report the outputs as of the most recent `eval`.
pub trait CoreModel {
    /// Drives the `clk` input.
    fn set_clk(&mut self, level: bool);
    /// Drives the active-low `rst_n` input.
    fn set_rst_n(&mut self, level: bool);
    /// Drives the `mem_rvalid` response input.
    fn set_mem_rvalid(&mut self, valid: bool);
    /// Drives the `mem_rdata` response input (low `mem_w` bits are significant).
    fn set_mem_rdata(&mut self, data: u64);
    /// Drives the `mem_err` response input.
    fn set_mem_err(&mut self, err: bool);

    /// Returns the `mem_req` output.
    fn mem_req(&self) -> bool;
    /// Returns the `mem_we` output.
    fn mem_we(&self) -> bool;
    /// Returns the `mem_addr` output.
    fn mem_addr(&self) -> u64;
    /// Returns the `mem_be` byte-enable output, one bit per byte lane.
    fn mem_be(&self) -> u8;
    /// Returns the `mem_wdata` output.
    fn mem_wdata(&self) -> u64;

    /// Settles the model's logic after input changes.
    fn eval(&mut self);

    /// Runs end-of-simulation hooks; called exactly once at shutdown.
    fn finalize(&mut self) {}
}

impl<C: CoreModel + ?Sized> CoreModel for Box<C> {
    fn set_clk(&mut self, level: bool) {
        (**self).set_clk(level);
    }
    fn set_rst_n(&mut self, level: bool) {
        (**self).set_rst_n(level);
    }
    fn set_mem_rvalid(&mut self, valid: bool) {
        (**self).set_mem_rvalid(valid);
    }
    fn set_mem_rdata(&mut self, data: u64) {
        (**self).set_mem_rdata(data);
    }
    fn set_mem_err(&mut self, err: bool) {
        (**self).set_mem_err(err);
    }
    fn mem_req(&self) -> bool {
        (**self).mem_req()
    }
    fn mem_we(&self) -> bool {
        (**self).mem_we()
    }
    fn mem_addr(&self) -> u64 {
        (**self).mem_addr()
    }
    fn mem_be(&self) -> u8 {
        (**self).mem_be()
    }
    fn mem_wdata(&self) -> u64 {
        (**self).mem_wdata()
    }
    fn eval(&mut self) {
        (**self).eval();
    }
    fn finalize(&mut self) {
        (**self).finalize();
    }
}

/// Values of every harness-visible pin at one instant, for waveform tracing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PinSnapshot {
    /// `rst_n` input.
    pub rst_n: bool,
    /// `mem_req` output.
    pub mem_req: bool,
    /// `mem_we` output.
    pub mem_we: bool,
    /// `mem_addr` output.
    pub mem_addr: u64,
    /// `mem_be` output.
    pub mem_be: u8,
    /// `mem_wdata` output.
    pub mem_wdata: u64,
    /// `mem_rvalid` input.
    pub mem_rvalid: bool,
    /// `mem_rdata` input.
    pub mem_rdata: u64,
    /// `mem_err` input.
    pub mem_err: bool,
}
