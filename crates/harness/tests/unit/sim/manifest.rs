//! # Manifest Tests
//!
//! Seven-field parsing, hex address fields and silent skipping of malformed lines.

use std::path::PathBuf;

use pretty_assertions::assert_eq;
use tbsim_core::HarnessError;
use tbsim_core::sim::{TestCase, load_manifest, parse_manifest};

use crate::common::harness::TestContext;

#[test]
fn seven_fields_make_a_case() {
    let case = TestCase::parse_line("prog.hex ref.out 0 40 dump.out 100 1a0").unwrap();
    assert_eq!(
        case,
        TestCase {
            program: PathBuf::from("prog.hex"),
            reference: PathBuf::from("ref.out"),
            ref_range: 0..0x40,
            dump: PathBuf::from("dump.out"),
            dump_range: 0x100..0x1a0,
        }
    );
}

#[test]
fn address_fields_accept_0x_prefix_and_any_whitespace() {
    let case = TestCase::parse_line("  p\tr 0x10   0X20 d 0 4 ").unwrap();
    assert_eq!(case.ref_range, 0x10..0x20);
    assert_eq!(case.dump_range, 0..4);
}

#[test]
fn six_or_eight_fields_are_skipped() {
    assert_eq!(TestCase::parse_line("p r 0 4 d 0"), None);
    assert_eq!(TestCase::parse_line("p r 0 4 d 0 4 extra"), None);
}

#[test]
fn malformed_address_is_skipped() {
    assert_eq!(TestCase::parse_line("p r 0 4 d 0 4g"), None);
    assert_eq!(TestCase::parse_line("p r 0x 4 d 0 4"), None);
}

#[test]
fn manifest_keeps_only_usable_lines_in_order() {
    let text = "\
a.hex a.ref 0 4 a.out 0 4
b.hex b.ref 0 4 b.out 0
# comment line with seven tokens here
c.hex c.ref 0 4 c.out 0 4 trailing

d.hex d.ref 0 8 d.out 8 10
";
    let cases = parse_manifest(text);
    let programs: Vec<_> = cases.iter().map(|c| c.program.clone()).collect();
    // The comment line has seven tokens but non-hex address fields.
    assert_eq!(
        programs,
        vec![PathBuf::from("a.hex"), PathBuf::from("d.hex")]
    );
}

#[test]
fn empty_manifest_has_no_cases() {
    assert!(parse_manifest("").is_empty());
    assert!(parse_manifest("\n\n").is_empty());
}

#[test]
fn load_reads_from_disk() {
    let ctx = TestContext::new();
    let path = ctx.write("tests.lst", "p r 0 4 d 0 4\r\n");
    let cases = load_manifest(&path).unwrap();
    assert_eq!(cases.len(), 1);
    assert_eq!(cases[0].dump_range, 0..4);
}

#[test]
fn missing_manifest_is_a_file_open_error() {
    let ctx = TestContext::new();
    let err = load_manifest(&ctx.path("absent.lst")).unwrap_err();
    assert!(matches!(err, HarnessError::FileOpen { .. }));
    assert_eq!(err.exit_code(), 2);
}
