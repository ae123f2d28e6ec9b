//! # Configuration Tests
//!
//! Defaults, JSON loading and validation of `HarnessConfig`.

use rstest::rstest;
use tbsim_core::HarnessError;
use tbsim_core::config::{HarnessConfig, parse_numeric};

#[test]
fn defaults_describe_a_32_bit_bus_with_10_reset_cycles() {
    let config = HarnessConfig::default();
    assert_eq!(config.mem_width, 32);
    assert_eq!(config.mem_size, 1024 * 1024);
    assert_eq!(config.mem_latency, 1);
    assert_eq!(config.extra_cycles, 0);
    assert_eq!(config.reset_cycles, 10);
    assert_eq!(config.cycle_limit, None);
    assert_eq!(config.waveform, None);
    assert!(config.validate().is_ok());
}

#[test]
fn json_fills_missing_fields_with_defaults() {
    let config = HarnessConfig::from_json(r#"{ "mem_latency": 4 }"#).unwrap();
    assert_eq!(config.mem_latency, 4);
    assert_eq!(config.mem_width, 32);
    assert_eq!(config.reset_cycles, 10);
}

#[test]
fn json_rejects_unknown_fields() {
    let err = HarnessConfig::from_json(r#"{ "mem_lat": 4 }"#).unwrap_err();
    assert!(matches!(err, HarnessError::Config { name: "CONFIG", .. }));
}

#[test]
fn json_is_validated() {
    let err = HarnessConfig::from_json(r#"{ "mem_width": 24 }"#).unwrap_err();
    assert!(matches!(err, HarnessError::Config { name: "MEM_W", .. }));
}

#[rstest]
#[case(8, 1)]
#[case(16, 2)]
#[case(32, 4)]
#[case(64, 8)]
fn supported_widths(#[case] width: u32, #[case] lanes: usize) {
    let config = HarnessConfig {
        mem_width: width,
        mem_size: 64,
        ..HarnessConfig::default()
    };
    assert!(config.validate().is_ok());
    assert_eq!(config.word_bytes(), lanes);
}

#[rstest]
#[case(0)]
#[case(4)]
#[case(12)]
#[case(128)]
fn unsupported_widths(#[case] width: u32) {
    let config = HarnessConfig {
        mem_width: width,
        ..HarnessConfig::default()
    };
    assert!(matches!(
        config.validate(),
        Err(HarnessError::Config { name: "MEM_W", .. })
    ));
}

#[test]
fn memory_size_must_be_whole_words() {
    let zero = HarnessConfig {
        mem_size: 0,
        ..HarnessConfig::default()
    };
    assert!(matches!(
        zero.validate(),
        Err(HarnessError::Config { name: "MEM_SZ", .. })
    ));

    let ragged = HarnessConfig {
        mem_width: 64,
        mem_size: 1028,
        ..HarnessConfig::default()
    };
    assert!(matches!(
        ragged.validate(),
        Err(HarnessError::Config { name: "MEM_SZ", .. })
    ));
}

#[test]
fn zero_latency_and_zero_drain_are_valid() {
    let config = HarnessConfig {
        mem_latency: 0,
        extra_cycles: 0,
        ..HarnessConfig::default()
    };
    assert!(config.validate().is_ok());
}

#[test]
fn zero_cycle_limit_is_rejected() {
    let config = HarnessConfig {
        cycle_limit: Some(0),
        ..HarnessConfig::default()
    };
    assert!(matches!(
        config.validate(),
        Err(HarnessError::Config {
            name: "CYCLE_LIMIT",
            ..
        })
    ));
}

#[rstest]
#[case("0", Some(0))]
#[case("1048576", Some(1_048_576))]
#[case("", None)]
#[case(" 5", None)]
#[case("5 ", None)]
#[case("0x10", None)]
#[case("12abc", None)]
#[case("-3", None)]
fn numeric_parameters_are_strict(#[case] text: &str, #[case] expected: Option<u64>) {
    assert_eq!(parse_numeric("MEM_SZ", text).ok(), expected);
}

#[test]
fn numeric_error_names_the_parameter() {
    let err = parse_numeric("EXTRA_CYCLES", "ten").unwrap_err();
    assert!(err.to_string().contains("EXTRA_CYCLES"));
    assert!(err.is_fatal());
    assert_eq!(err.exit_code(), 1);
}
