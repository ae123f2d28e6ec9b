//! Bus Adapter Unit Tests.
//!
//! Verifies request servicing (byte enables, wrapping, error flag, read-after-write) and the
//! order in which the adapter toggles the clock and drives response pins.

use std::path::Path;

use mockall::Sequence;
use mockall::predicate::eq;
use rstest::rstest;
use tbsim_core::HarnessError;
use tbsim_core::common::BusAddr;
use tbsim_core::config::HarnessConfig;
use tbsim_core::soc::{BusAdapter, BusResponse, BusTransaction, CoreModel, MemoryImage};

use crate::common::harness::small_config;
use crate::common::mocks::core::MockCore;

fn read(addr: u64) -> BusTransaction {
    BusTransaction {
        request: true,
        address: BusAddr::new(addr),
        ..BusTransaction::default()
    }
}

fn write(addr: u64, data: u64, byte_enable: u8) -> BusTransaction {
    BusTransaction {
        request: true,
        write: true,
        address: BusAddr::new(addr),
        byte_enable,
        write_data: data,
    }
}

fn image(text: &str) -> MemoryImage {
    let mut mem = MemoryImage::new(1024).unwrap();
    let _ = mem.load_hex_str(text, Path::new("inline")).unwrap();
    mem
}

/// Core with fixed request outputs that records the response pins it sees.
#[derive(Debug, Default)]
struct PinCore {
    clk: bool,
    txn: BusTransaction,
    rvalid: bool,
    rdata: u64,
    err: bool,
    /// `rvalid`/`rdata` values present at each rising edge.
    captured: Vec<(bool, u64)>,
}

impl CoreModel for PinCore {
    fn set_clk(&mut self, level: bool) {
        if level && !self.clk {
            self.captured.push((self.rvalid, self.rdata));
        }
        self.clk = level;
    }
    fn set_rst_n(&mut self, _level: bool) {}
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
        self.txn.request
    }
    fn mem_we(&self) -> bool {
        self.txn.write
    }
    fn mem_addr(&self) -> u64 {
        self.txn.address.val()
    }
    fn mem_be(&self) -> u8 {
        self.txn.byte_enable
    }
    fn mem_wdata(&self) -> u64 {
        self.txn.write_data
    }
    fn eval(&mut self) {}
}

// ══════════════════════════════════════════════════════════
// 1. Servicing
// ══════════════════════════════════════════════════════════

#[test]
fn byte_enable_0101_writes_lanes_zero_and_two() {
    let mut bus = BusAdapter::new(&small_config(1, 0)).unwrap();
    let mut mem = image("@4 aabbccdd\n");

    let response = bus.service(&mut mem, &write(0x10, 0x1122_3344, 0b0101));
    assert_eq!(mem.read_u32_le(0x10), Some(0xaa22_cc44));
    assert_eq!(response.data, 0xaa22_cc44);
    assert!(response.valid);
    assert!(!response.error);
}

#[test]
fn read_returns_full_word_regardless_of_byte_enable() {
    let mut bus = BusAdapter::new(&small_config(1, 0)).unwrap();
    let mut mem = image("@4 aabbccdd\n");
    let txn = BusTransaction {
        byte_enable: 0b0001,
        ..read(0x10)
    };
    assert_eq!(bus.service(&mut mem, &txn).data, 0xaabb_ccdd);
}

#[test]
fn out_of_range_address_wraps_and_flags_error() {
    let mut bus = BusAdapter::new(&small_config(1, 0)).unwrap();
    let mut mem = image("@4 12345678\n");

    let response = bus.service(&mut mem, &read(1024 + 0x12));
    assert!(response.valid);
    assert!(response.error);
    assert_eq!(response.data, 0x1234_5678);
    assert_eq!(bus.counters().errors, 1);
}

#[test]
fn wrapped_write_lands_at_wrapped_address() {
    let mut bus = BusAdapter::new(&small_config(1, 0)).unwrap();
    let mut mem = image("");
    let response = bus.service(&mut mem, &write(2048 + 0x20, 0xfeed, 0xf));
    assert!(response.error);
    assert_eq!(mem.read_u32_le(0x20), Some(0xfeed));
}

#[test]
fn unaligned_address_is_masked_to_the_word() {
    let mut bus = BusAdapter::new(&small_config(1, 0)).unwrap();
    let mut mem = image("@1 cafef00d\n");
    assert_eq!(bus.service(&mut mem, &read(0x07)).data, 0xcafe_f00d);
}

#[rstest]
#[case::size_not_word_multiple(32, 1026)]
#[case::zero_size(32, 0)]
#[case::zero_width(0, 1024)]
fn invalid_config_is_rejected(#[case] mem_width: u32, #[case] mem_size: usize) {
    let config = HarnessConfig {
        mem_width,
        mem_size,
        ..small_config(1, 0)
    };
    let err = BusAdapter::new(&config).unwrap_err();
    assert!(matches!(err, HarnessError::Config { .. }), "{err}");
}

#[test]
fn idle_cycle_is_not_valid_and_touches_nothing() {
    let mut bus = BusAdapter::new(&small_config(1, 0)).unwrap();
    let mut mem = image("");
    let txn = BusTransaction {
        write: true,
        byte_enable: 0xf,
        write_data: 0xffff_ffff,
        ..BusTransaction::default()
    };
    let response = bus.service(&mut mem, &txn);
    assert!(!response.valid);
    assert_eq!(mem.read_u32_le(0), Some(0));
    assert_eq!(bus.counters().reads + bus.counters().writes, 0);
}

#[test]
fn sixty_four_bit_bus_uses_eight_lanes() {
    let config = HarnessConfig {
        mem_width: 64,
        ..small_config(1, 0)
    };
    let mut bus = BusAdapter::new(&config).unwrap();
    let mut mem = image("");
    let response = bus.service(&mut mem, &write(0x0c, 0x0102_0304_0506_0708, 0b1000_0001));
    // 0x0c aligns down to 0x08; lanes 0 and 7 only.
    assert_eq!(response.data, 0x0100_0000_0000_0008);
}

#[test]
fn counters_split_reads_and_writes() {
    let mut bus = BusAdapter::new(&small_config(1, 0)).unwrap();
    let mut mem = image("");
    let _ = bus.service(&mut mem, &read(4));
    let _ = bus.service(&mut mem, &read(8));
    let _ = bus.service(&mut mem, &write(8, 1, 0xf));
    let counters = bus.counters();
    assert_eq!((counters.reads, counters.writes, counters.errors), (2, 1, 0));

    bus.reset();
    assert_eq!(bus.counters().reads, 0);
    assert_eq!(bus.driven(), BusResponse::IDLE);
}

// ══════════════════════════════════════════════════════════
// 2. Cycle timing
// ══════════════════════════════════════════════════════════

#[rstest]
#[case(0)]
#[case(1)]
#[case(3)]
fn response_reaches_a_rising_edge_latency_cycles_later(#[case] latency: usize) {
    let mut bus = BusAdapter::new(&small_config(latency, 0)).unwrap();
    let mut mem = image("@4 0000beef\n");
    let mut core = PinCore {
        txn: read(0x10),
        ..PinCore::default()
    };

    let _ = bus.step(&mut core, &mut mem);
    core.txn = BusTransaction::default();
    for _ in 0..latency + 1 {
        let _ = bus.step(&mut core, &mut mem);
    }

    // Edge k (zero-based) is the rising edge of step k.
    let first_valid = core.captured.iter().position(|&(v, _)| v).unwrap();
    assert_eq!(first_valid, latency);
    assert_eq!(core.captured[first_valid], (true, 0xbeef));
    assert_eq!(bus.counters().delivered, 1);
}

#[test]
fn step_returns_the_sampled_transaction() {
    let mut bus = BusAdapter::new(&small_config(1, 0)).unwrap();
    let mut mem = image("");
    let mut core = PinCore {
        txn: write(0x40, 7, 0x3),
        ..PinCore::default()
    };
    let txn = bus.step(&mut core, &mut mem);
    assert_eq!(txn, write(0x40, 7, 0x3));
    assert!(txn.is_write());
    assert!(!txn.is_sentinel());
    assert!(read(0).is_sentinel());
}

#[test]
fn snapshot_reports_driven_response() {
    let mut bus = BusAdapter::new(&small_config(0, 0)).unwrap();
    let mut mem = image("@2 00000055\n");
    let mut core = PinCore {
        txn: read(8),
        ..PinCore::default()
    };
    let _ = bus.step(&mut core, &mut mem);
    let pins = bus.snapshot(&core, true);
    assert!(pins.rst_n);
    assert!(pins.mem_req);
    assert_eq!(pins.mem_addr, 8);
    assert!(pins.mem_rvalid);
    assert_eq!(pins.mem_rdata, 0x55);
}

fn expect_sample(core: &mut MockCore, seq: &mut Sequence) {
    let _ = core
        .expect_mem_req()
        .times(1)
        .in_sequence(seq)
        .return_const(false);
    let _ = core
        .expect_mem_we()
        .times(1)
        .in_sequence(seq)
        .return_const(false);
    let _ = core
        .expect_mem_addr()
        .times(1)
        .in_sequence(seq)
        .return_const(0x20u64);
    let _ = core
        .expect_mem_be()
        .times(1)
        .in_sequence(seq)
        .return_const(0u8);
    let _ = core
        .expect_mem_wdata()
        .times(1)
        .in_sequence(seq)
        .return_const(0u64);
}

fn expect_drive(core: &mut MockCore, seq: &mut Sequence) {
    let _ = core
        .expect_set_mem_rvalid()
        .times(1)
        .in_sequence(seq)
        .return_const(());
    let _ = core
        .expect_set_mem_rdata()
        .times(1)
        .in_sequence(seq)
        .return_const(());
    let _ = core
        .expect_set_mem_err()
        .times(1)
        .in_sequence(seq)
        .return_const(());
}

fn expect_clk(core: &mut MockCore, seq: &mut Sequence, level: bool) {
    let _ = core
        .expect_set_clk()
        .with(eq(level))
        .times(1)
        .in_sequence(seq)
        .return_const(());
}

fn expect_eval(core: &mut MockCore, seq: &mut Sequence) {
    let _ = core
        .expect_eval()
        .times(1)
        .in_sequence(seq)
        .return_const(());
}

#[test]
fn registered_memory_drives_response_after_rising_edge() {
    let mut core = MockCore::new();
    let mut seq = Sequence::new();
    expect_sample(&mut core, &mut seq);
    expect_clk(&mut core, &mut seq, true);
    expect_eval(&mut core, &mut seq);
    expect_drive(&mut core, &mut seq);
    expect_eval(&mut core, &mut seq);
    expect_clk(&mut core, &mut seq, false);
    expect_eval(&mut core, &mut seq);

    let mut bus = BusAdapter::new(&small_config(2, 0)).unwrap();
    let mut mem = image("");
    let _ = bus.step(&mut core, &mut mem);
}

#[test]
fn combinational_memory_drives_response_before_rising_edge() {
    let mut core = MockCore::new();
    let mut seq = Sequence::new();
    expect_sample(&mut core, &mut seq);
    expect_drive(&mut core, &mut seq);
    expect_eval(&mut core, &mut seq);
    expect_clk(&mut core, &mut seq, true);
    expect_eval(&mut core, &mut seq);
    expect_clk(&mut core, &mut seq, false);
    expect_eval(&mut core, &mut seq);

    let mut bus = BusAdapter::new(&small_config(0, 0)).unwrap();
    let mut mem = image("");
    let _ = bus.step(&mut core, &mut mem);
}

#[test]
fn drive_idle_clears_response_pins() {
    let mut core = MockCore::new();
    let _ = core
        .expect_set_mem_rvalid()
        .with(eq(false))
        .times(1)
        .return_const(());
    let _ = core
        .expect_set_mem_rdata()
        .with(eq(0u64))
        .times(1)
        .return_const(());
    let _ = core
        .expect_set_mem_err()
        .with(eq(false))
        .times(1)
        .return_const(());

    let mut bus = BusAdapter::new(&small_config(1, 0)).unwrap();
    bus.drive_idle(&mut core);
}
