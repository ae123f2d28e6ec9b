//! Scripted bus-functional model.
//!
//! `BusFunctionalModel` stands in for a CPU core by replaying a list of bus operations.
//! It behaves like registered RTL:
//! 1. **Outputs** change only on a rising clock edge while `rst_n` is high.
//! 2. **Inputs** are captured on the rising edge; a captured `mem_rvalid` is recorded as an
//!    [`ObservedResponse`] tagged with the edge number.
//! 3. **Requests** are recorded as [`IssuedRequest`]s on the edge at which the bus samples them.
//! 4. **Reset** (a rising edge with `rst_n` low) restarts the script and clears the records.
//!
//! Edges are counted from one after reset is released, so the delay between a request and its
//! response is `response.edge - request.edge`.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::common::{HarnessError, Result};
use crate::soc::traits::CoreModel;

/// One scripted bus operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum BfmOp {
    /// Issue a read of the word at `addr`.
    Read {
        /// Byte address driven on `mem_addr`.
        addr: u64,
    },
    /// Issue a write of `data` to `addr` with byte enables `be` (all lanes by default).
    Write {
        /// Byte address driven on `mem_addr`.
        addr: u64,
        /// Value driven on `mem_wdata`.
        data: u64,
        /// Value driven on `mem_be`.
        #[serde(default = "BfmOp::all_lanes")]
        be: u8,
    },
    /// Keep `mem_req` low for `cycles` cycles.
    Idle {
        /// Number of idle cycles.
        cycles: u64,
    },
    /// Keep `mem_req` low until every issued request has been answered.
    Wait,
}

impl BfmOp {
    const fn all_lanes() -> u8 {
        0xff
    }
}

/// A list of operations replayed from the start after every reset.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct BfmScript {
    /// Operations in issue order.
    pub ops: Vec<BfmOp>,
}

impl BfmScript {
    /// Parses a script from JSON.
    ///
    /// ```
    /// use tbsim_core::core::{BfmOp, BfmScript};
    /// use std::path::Path;
    ///
    /// let json = r#"{ "ops": [ { "op": "write", "addr": 0, "data": 1 } ] }"#;
    /// let script = BfmScript::from_json(json, Path::new("inline")).unwrap();
    /// assert_eq!(script.ops, vec![BfmOp::Write { addr: 0, data: 1, be: 0xff }]);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Format`] if the JSON does not describe a script.
    pub fn from_json(json: &str, origin: &Path) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| HarnessError::Format {
            path: origin.to_path_buf(),
            line: e.line(),
            reason: e.to_string(),
        })
    }

    /// Reads and parses a JSON script file.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::FileOpen`] or [`HarnessError::Format`].
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| HarnessError::open(path, e))?;
        Self::from_json(&text, path)
    }
}

/// A request as seen by the bus, tagged with the edge that sampled it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IssuedRequest {
    /// Rising edge (since reset release) at which the bus sampled the request.
    pub edge: u64,
    /// `mem_we`.
    pub write: bool,
    /// `mem_addr`.
    pub addr: u64,
    /// `mem_be`.
    pub be: u8,
    /// `mem_wdata`.
    pub data: u64,
}

/// A response captured from the bus, tagged with the edge that registered it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ObservedResponse {
    /// Rising edge (since reset release) at which `mem_rvalid` was captured.
    pub edge: u64,
    /// Captured `mem_rdata`.
    pub data: u64,
    /// Captured `mem_err`.
    pub error: bool,
}

#[derive(Clone, Copy, Debug, Default)]
struct Outputs {
    req: bool,
    we: bool,
    addr: u64,
    be: u8,
    wdata: u64,
}

/// A core model that replays a [`BfmScript`] on the memory bus.
#[derive(Clone, Debug, Default)]
pub struct BusFunctionalModel {
    script: Vec<BfmOp>,
    pc: usize,
    idle_remaining: u64,
    edge: u64,

    clk: bool,
    prev_clk: bool,
    rst_n: bool,
    rvalid: bool,
    rdata: u64,
    err: bool,

    out: Outputs,
    issued: Vec<IssuedRequest>,
    responses: Vec<ObservedResponse>,
    finalized: bool,
}

impl BusFunctionalModel {
    /// Creates a model that will replay `script` after reset.
    pub fn new(script: BfmScript) -> Self {
        Self {
            script: script.ops,
            ..Self::default()
        }
    }

    /// Returns the number of rising edges seen since reset was released.
    pub fn edge(&self) -> u64 {
        self.edge
    }

    /// Returns the requests sampled by the bus since the last reset.
    pub fn issued(&self) -> &[IssuedRequest] {
        &self.issued
    }

    /// Returns the responses captured since the last reset.
    pub fn responses(&self) -> &[ObservedResponse] {
        &self.responses
    }

    /// Returns `true` once every scripted operation has been issued.
    pub fn is_done(&self) -> bool {
        self.pc >= self.script.len() && self.idle_remaining == 0
    }

    /// Returns `true` if [`CoreModel::finalize`] has been called.
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    fn outstanding(&self) -> usize {
        self.issued.len().saturating_sub(self.responses.len())
    }

    fn restart(&mut self) {
        self.pc = 0;
        self.idle_remaining = 0;
        self.edge = 0;
        self.out = Outputs::default();
        self.issued.clear();
        self.responses.clear();
    }

    fn on_rising_edge(&mut self) {
        self.edge += 1;
        if self.rvalid {
            self.responses.push(ObservedResponse {
                edge: self.edge,
                data: self.rdata,
                error: self.err,
            });
        }
        if self.out.req {
            self.issued.push(IssuedRequest {
                edge: self.edge,
                write: self.out.we,
                addr: self.out.addr,
                be: self.out.be,
                data: self.out.wdata,
            });
        }
        self.advance();
    }

    fn advance(&mut self) {
        self.out = Outputs::default();
        if self.idle_remaining > 0 {
            self.idle_remaining -= 1;
            return;
        }
        while let Some(&op) = self.script.get(self.pc) {
            match op {
                BfmOp::Read { addr } => {
                    self.out = Outputs {
                        req: true,
                        addr,
                        ..Outputs::default()
                    };
                    self.pc += 1;
                    return;
                }
                BfmOp::Write { addr, data, be } => {
                    self.out = Outputs {
                        req: true,
                        we: true,
                        addr,
                        be,
                        wdata: data,
                    };
                    self.pc += 1;
                    return;
                }
                BfmOp::Idle { cycles } => {
                    self.pc += 1;
                    if cycles > 0 {
                        self.idle_remaining = cycles - 1;
                        return;
                    }
                }
                BfmOp::Wait => {
                    if self.outstanding() > 0 {
                        return;
                    }
                    self.pc += 1;
                }
            }
        }
    }
}

impl CoreModel for BusFunctionalModel {
    fn set_clk(&mut self, level: bool) {
        self.clk = level;
    }

    fn set_rst_n(&mut self, level: bool) {
        self.rst_n = level;
    }

    fn set_mem_rvalid(&mut self, valid: bool) {
        self.rvalid = valid;
    }

    fn set_mem_rdata(&mut self, data: u64) {
        self.rdata = data;
    }

    fn set_mem_err(&mut self, err: bool) {
        self.err = err;
    }

    fn mem_req(&self) -> bool {
        self.out.req
    }

    fn mem_we(&self) -> bool {
        self.out.we
    }

    fn mem_addr(&self) -> u64 {
        self.out.addr
    }

    fn mem_be(&self) -> u8 {
        self.out.be
    }

    fn mem_wdata(&self) -> u64 {
        self.out.wdata
    }

    fn eval(&mut self) {
        let posedge = self.clk && !self.prev_clk;
        self.prev_clk = self.clk;
        if !posedge {
            return;
        }
        if self.rst_n {
            self.on_rising_edge();
        } else {
            self.restart();
        }
    }

    fn finalize(&mut self) {
        self.finalized = true;
    }
}
