use std::fs::read_to_string;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use assert_cmd::cargo::CommandCargoExt;
use insta::assert_snapshot;
use tempfile::tempdir;

fn program(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/programs")
        .join(name)
}

fn ralloc(args: &[&str], input: &Path, output: Option<&Path>) -> Output {
    let mut cmd = Command::cargo_bin(env!("CARGO_PKG_NAME")).unwrap();
    cmd.args(args).arg(input);
    if let Some(output) = output {
        cmd.arg(output);
    }
    cmd.output().expect("Failed to run allocator")
}

fn stdout(output: &Output) -> String {
    assert!(
        output.status.success(),
        "Allocator error: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn scenario_two_registers() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let out_path = temp_dir.path().join("scenario.out");

    let output = ralloc(&["2"], &program("scenario.iloc"), Some(&out_path));
    assert_eq!(stdout(&output), "");

    let allocated = read_to_string(&out_path).expect("Output file missing");
    assert_snapshot!(allocated, @"store\trb => 4096\nadd\tra, rb => rb\nmul\trb, ra => rb\nload\t4096 => ra\nsub\trb, ra => rb");
}

#[test]
fn scenario_five_registers_to_stdout() {
    let output = ralloc(&["5"], &program("scenario.iloc"), None);
    assert_snapshot!(stdout(&output), @"add\tra, rb => rc\nmul\trc, ra => rd\nsub\trd, rb => re");
}

#[test]
fn reads_stdin() {
    let output = assert_cmd::Command::cargo_bin(env!("CARGO_PKG_NAME"))
        .unwrap()
        .args(["5", "-"])
        .write_stdin("loadI 7 => r1\noutput r1\n")
        .output()
        .expect("Failed to run allocator");
    assert_snapshot!(stdout(&output), @"loadI\t7 => ra\noutput\tra");
}

#[test]
fn label_column_reloads_address_operand() {
    let output = ralloc(
        &["2", "--label-column", "--verify"],
        &program("address.iloc"),
        None,
    );
    assert_snapshot!(stdout(&output), @"loadI\t1024 => ra\nloadI\t4 => rb\nstore\tra => 4096\nloadAO\tra, rb => ra\nadd\tra, rb => ra\nload\t4096 => rb\nstoreAI\tra => rb, 8");
}

#[test]
fn numbered_lines_parse_without_flags() {
    let output = ralloc(&["2", "--verify"], &program("address.iloc"), None);
    assert_snapshot!(stdout(&output), @"loadI\t1024 => ra\nloadI\t4 => rb\nstore\tra => 4096\nloadAO\tra, rb => ra\nadd\tra, rb => ra\nload\t4096 => rb\nstoreAI\tra => rb, 8");
}

#[test]
fn spill_area_flags_move_addresses() {
    let output = ralloc(
        &["2", "--base-address", "0", "--slot-size", "8"],
        &program("scenario.iloc"),
        None,
    );
    assert_snapshot!(stdout(&output), @"store\trb => 0\nadd\tra, rb => rb\nmul\trb, ra => rb\nload\t0 => ra\nsub\trb, ra => rb");
}

#[test]
fn verify_long_program() {
    for registers in ["2", "3", "4", "8"] {
        let output = ralloc(&[registers, "--verify"], &program("long.iloc"), None);
        let allocated = stdout(&output);
        let ops = allocated
            .lines()
            .filter(|line| !line.starts_with("load\t") && !line.starts_with("store\t"))
            .count();
        assert_eq!(ops, 16, "{} registers", registers);
    }
}

#[test]
fn dump_analysis_goes_to_stderr() {
    let output = ralloc(&["5", "--dump-analysis"], &program("scenario.iloc"), None);
    assert!(output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("registers:"));
    assert!(stderr.contains("first use:"));
    assert!(stderr.contains("live: {"), "{}", stderr);
}

#[test]
fn malformed_input_writes_nothing() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let out_path = temp_dir.path().join("malformed.out");

    let output = ralloc(&["3"], &program("malformed.iloc"), Some(&out_path));
    assert_eq!(output.status.code(), Some(1));
    assert!(!out_path.exists());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("malformed instruction at line 2"), "{}", stderr);
}

#[test]
fn rejects_register_count() {
    for count in ["0", "two"] {
        let output = ralloc(&[count], &program("scenario.iloc"), None);
        assert!(!output.status.success());

        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("positive integer"), "{}", stderr);
    }
}

#[test]
fn rejects_zero_slot_size() {
    let output = ralloc(&["2", "--slot-size", "0"], &program("scenario.iloc"), None);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("spill slot size must be a positive integer"), "{}", stderr);
}

#[test]
fn spill_address_overflow_is_an_error() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let out_path = temp_dir.path().join("scenario.out");
    let base = (u64::MAX - 2).to_string();

    let output = ralloc(
        &["1", "--base-address", &base],
        &program("long.iloc"),
        Some(&out_path),
    );
    assert_eq!(output.status.code(), Some(1));
    assert!(!out_path.exists());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no spill address left"), "{}", stderr);
}

#[test]
fn missing_input_is_reported() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let missing = temp_dir.path().join("nowhere.iloc");

    let output = ralloc(&["3"], &missing, None);
    assert_eq!(output.status.code(), Some(1));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("nowhere.iloc"), "{}", stderr);
}
