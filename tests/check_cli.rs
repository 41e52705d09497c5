//! Tests for `barcseek check`.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn barcseek() -> Command {
    Command::cargo_bin("barcseek").unwrap()
}

/// Test a clean barcode file in the default text format
#[test]
fn test_check_clean_barcodes() {
    let dir = TempDir::new().unwrap();
    let barcodes = write(dir.path(), "barcodes.csv", "bc1,ACGT\nbc2,TTRY\n");

    barcseek()
        .arg("check")
        .arg("-b")
        .arg(&barcodes)
        .assert()
        .success()
        .stdout(predicate::str::contains("Barcodes: 2"))
        .stdout(predicate::str::contains("No ambiguous sequences"));
}

/// Test that collisions are reported before the command fails
#[test]
fn test_check_ambiguous_text() {
    let dir = TempDir::new().unwrap();
    let barcodes = write(dir.path(), "barcodes.csv", "b1,AY\nb2,AW\nb3,GG\nb4,GG\n");

    barcseek()
        .arg("check")
        .arg("-b")
        .arg(&barcodes)
        .assert()
        .code(2)
        .stdout(predicate::str::contains("Ambiguous sequences: 2"))
        .stdout(predicate::str::contains("AT (2): b1, b2"))
        .stdout(predicate::str::contains("GG (2): b3, b4"));
}

/// Test the JSON report, including resolved samples
#[test]
fn test_check_json_with_sample_sheet() {
    let dir = TempDir::new().unwrap();
    let barcodes = write(dir.path(), "barcodes.csv", "bc1,TTGY\nbc2,AAAA\n");
    let sheet = write(dir.path(), "samples.txt", "S1 bc1,bc2\nS2 CCCC bc2\n");

    let output = barcseek()
        .arg("check")
        .arg("-b")
        .arg(&barcodes)
        .arg("-s")
        .arg(&sheet)
        .args(["--format", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["barcodes"], 2);
    assert_eq!(report["ambiguous"], false);
    assert_eq!(report["collisions"].as_array().unwrap().len(), 0);

    let samples = report["samples"].as_array().unwrap();
    assert_eq!(samples.len(), 2);
    assert_eq!(samples[0]["name"], "S1");
    assert_eq!(samples[0]["forward_barcodes"], "TTGY,AAAA");
    assert_eq!(samples[0]["forward_sequences"], 3);
    assert_eq!(samples[1]["reverse_barcodes"], "AAAA");
    assert_eq!(samples[1]["reverse_sequences"], 1);
}

/// Test that barcodes shared between samples are reported and fail the check
#[test]
fn test_check_overlapping_samples() {
    let dir = TempDir::new().unwrap();
    let barcodes = write(dir.path(), "barcodes.csv", "bc1,ACGT\n");
    let sheet = write(dir.path(), "samples.txt", "S1 bc1\nS2 ACGT\n");

    let output = barcseek()
        .arg("check")
        .arg("-b")
        .arg(&barcodes)
        .arg("-s")
        .arg(&sheet)
        .args(["--format", "json"])
        .assert()
        .code(2)
        .get_output()
        .stdout
        .clone();

    let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["ambiguous"], false);
    let shared = report["sample_collisions"].as_array().unwrap();
    assert_eq!(shared.len(), 1);
    assert_eq!(shared[0]["sequence"], "ACGT");
    assert_eq!(shared[0]["barcodes"], serde_json::json!(["S1", "S2"]));
}

/// Test the TSV report lists each collision on its own row
#[test]
fn test_check_tsv() {
    let dir = TempDir::new().unwrap();
    let barcodes = write(dir.path(), "barcodes.csv", "b1,AY\nb2,AW\n");

    barcseek()
        .arg("check")
        .arg("-b")
        .arg(&barcodes)
        .args(["--format", "tsv"])
        .assert()
        .code(2)
        .stdout(predicate::str::starts_with("sequence\tcount\tbarcodes\n"))
        .stdout(predicate::str::contains("AT\t2\t"));
}

/// Test configuration failures in the barcode file
#[test]
fn test_check_invalid_barcode_files() {
    let dir = TempDir::new().unwrap();

    barcseek()
        .arg("check")
        .arg("-b")
        .arg(dir.path().join("missing.csv"))
        .assert()
        .code(2);

    let invalid = write(dir.path(), "invalid.csv", "bc1,ACXT\n");
    barcseek()
        .arg("check")
        .arg("-b")
        .arg(&invalid)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("ACXT"));
}
