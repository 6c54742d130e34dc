//! Tests for the `lanemap` binary.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn lanemap() -> Command {
    Command::cargo_bin("lanemap").unwrap()
}

#[test]
fn test_formats_lists_bundled_handlers() {
    lanemap()
        .arg("formats")
        .assert()
        .success()
        .stdout(predicate::str::contains("osm").and(predicate::str::contains(".yaml")));
}

#[test]
fn test_check_clean_map() {
    lanemap()
        .args(["check", "--origin", "49.0,8.4"])
        .arg(fixture("intersection.osm"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Regulatory elements: 5"))
        .stdout(predicate::str::contains("traffic_light: 1"))
        .stdout(predicate::str::contains("No errors"));
}

#[test]
fn test_check_reports_skipped_records() {
    lanemap()
        .arg("check")
        .arg(fixture("three_lights.osm"))
        .assert()
        .failure()
        .stdout(predicate::str::contains("relation 2: "));
}

#[test]
fn test_convert_strict_fails_on_bad_record() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.yaml");
    lanemap()
        .arg("convert")
        .arg(fixture("three_lights.osm"))
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("relation 2"));
    assert!(!output.exists());
}

#[test]
fn test_convert_robust_writes_output() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.yaml");
    lanemap()
        .args(["convert", "--robust"])
        .arg(fixture("three_lights.osm"))
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Skipped records:"));
    assert!(output.exists());
}

#[test]
fn test_convert_rejects_unknown_format() {
    let dir = TempDir::new().unwrap();
    lanemap()
        .arg("convert")
        .arg(fixture("intersection.osm"))
        .arg(dir.path().join("out.pbf"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported format: .pbf"));
}
