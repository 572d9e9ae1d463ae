//! Integration tests for the `gridclear` binary

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const CASE_JSON: &str = r#"{
    "name": "three-node",
    "node_count": 3,
    "capacity": [[0, 100, 100], [100, 0, 100], [100, 100, 0]],
    "susceptance": [[0, 500, 500], [500, 0, 500], [500, 500, 0]],
    "generators": [
        {"id": 0, "location": 0, "max_output": 100, "offer_price": 12},
        {"id": 1, "location": 1, "max_output": 80, "offer_price": 20}
    ],
    "demands": [
        {"id": 0, "location": 1, "max_load": 100, "bid_price": 40},
        {"id": 1, "location": 2, "max_load": 50, "bid_price": 35}
    ]
}"#;

fn write_case(dir: &TempDir, name: &str, body: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, body).unwrap();
    path
}

#[test]
fn test_help_lists_commands() {
    let mut cmd = cargo_bin_cmd!("gridclear");
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("clear"))
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("backends"));
}

#[test]
fn test_clear_help() {
    let mut cmd = cargo_bin_cmd!("gridclear");
    cmd.args(["clear", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--timeout-secs"))
        .stdout(predicate::str::contains("--reference"));
}

#[test]
fn test_backends_lists_clarabel() {
    let mut cmd = cargo_bin_cmd!("gridclear");
    cmd.arg("backends")
        .assert()
        .success()
        .stdout(predicate::str::contains("clarabel"));
}

#[test]
fn test_validate_reports_model_size() {
    let dir = TempDir::new().unwrap();
    let case = write_case(&dir, "case.json", CASE_JSON);

    let mut cmd = cargo_bin_cmd!("gridclear");
    cmd.args(["validate", case.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("three-node: ok"))
        .stdout(predicate::str::contains("13 variables, 10 constraints"));
}

#[test]
fn test_validate_rejects_asymmetric_capacity() {
    let dir = TempDir::new().unwrap();
    let body = CASE_JSON.replace("[[0, 100, 100]", "[[0, 90, 100]");
    let case = write_case(&dir, "bad.json", &body);

    let mut cmd = cargo_bin_cmd!("gridclear");
    cmd.args(["validate", case.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("validating"));
}

#[test]
fn test_clear_writes_report() {
    let dir = TempDir::new().unwrap();
    let case = write_case(&dir, "case.json", CASE_JSON);
    let out = dir.path().join("out/report.json");

    let mut cmd = cargo_bin_cmd!("gridclear");
    cmd.args([
        "clear",
        case.to_str().unwrap(),
        "--backend",
        "clarabel",
        "--out",
        out.to_str().unwrap(),
    ])
    .assert()
    .success()
    .stdout(predicate::str::contains("welfare: 3550"));

    let report: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(report["status"], "optimal");
    assert_eq!(report["backend"], "clarabel");
    assert_eq!(report["nodes"].as_array().unwrap().len(), 3);
    let welfare = report["welfare"].as_f64().unwrap();
    assert!((welfare - 3550.0).abs() < 1e-2, "welfare {welfare}");
}

#[test]
fn test_clear_prints_json_to_stdout() {
    let dir = TempDir::new().unwrap();
    let case = write_case(&dir, "case.json", CASE_JSON);

    let mut cmd = cargo_bin_cmd!("gridclear");
    cmd.args(["clear", case.to_str().unwrap(), "--no-prices", "--reference", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"welfare\""))
        .stdout(predicate::str::contains("\"reference\": 2"));
}

#[test]
fn test_clear_unknown_backend_fails() {
    let dir = TempDir::new().unwrap();
    let case = write_case(&dir, "case.json", CASE_JSON);

    let mut cmd = cargo_bin_cmd!("gridclear");
    cmd.args(["clear", case.to_str().unwrap(), "--backend", "cplex"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cplex"));
}

#[test]
fn test_clear_missing_case_fails() {
    let mut cmd = cargo_bin_cmd!("gridclear");
    cmd.args(["clear", "/nonexistent/case.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("loading case"));
}
