//! Integration tests for the `route` and `edges` subcommands.

use std::fs;
use std::path::PathBuf;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../docs/fixtures/sample_network.json")
        .canonicalize()
        .expect("fixture network present")
}

fn cli() -> Command {
    let mut cmd = cargo_bin_cmd!("roadnav-cli");
    cmd.env("RUST_LOG", "error").arg("--network").arg(fixture_path());
    cmd
}

#[test]
fn route_prints_text_summary() {
    cli()
        .args(["route", "--from", "5,0,0.2", "--to", "19,0,2.25"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Path:"))
        .stdout(predicate::str::contains("- anchor #1"))
        .stdout(predicate::str::contains("- intersection #1"));
}

#[test]
fn route_json_is_parseable() {
    let output = cli()
        .args(["--format", "json", "route", "--from", "4.9,0,0", "--to", "5.1,0,0"])
        .args(["--step-size", "3"])
        .output()
        .expect("command runs");
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(value["points"].as_array().map(Vec::len), Some(2));
    assert!(value["steps"].is_u64());
}

#[test]
fn negative_coordinates_are_accepted() {
    cli()
        .args(["route", "--from", "1,0,-0.4", "--to", "23,0,0.5"])
        .assert()
        .success();
}

#[test]
fn step_limit_is_reported_as_failure() {
    cli()
        .args(["route", "--from", "5,0,0.2", "--to", "19,0,2.25", "--max-steps", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("step limit"));
}

#[test]
fn far_points_snap_to_nearest_road() {
    cli()
        .args(["route", "--from", "-5,0,3", "--to", "500,0,500"])
        .args(["--heuristic", "zero"])
        .assert()
        .success();
}

#[test]
fn unresolvable_point_fails() {
    let dir = tempdir().expect("temp dir");
    let empty = dir.path().join("empty.json");
    fs::write(&empty, "{}").expect("write");
    cargo_bin_cmd!("roadnav-cli")
        .env("RUST_LOG", "error")
        .arg("--network")
        .arg(&empty)
        .args(["route", "--from", "0,0,0", "--to", "1,0,0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no road or anchor"));
}

#[test]
fn edges_lists_every_pair() {
    cli()
        .arg("edges")
        .assert()
        .success()
        .stdout(predicate::str::contains("Graph: 7 nodes, 21 edges"))
        .stdout(predicate::str::contains("radial"))
        .stdout(predicate::str::contains("fallback"));
}

#[test]
fn config_file_overrides_defaults() {
    let dir = tempdir().expect("temp dir");
    let config = dir.path().join("config.json");
    fs::write(&config, r#"{ "max_search_steps": 1 }"#).expect("write");

    cli()
        .arg("--config")
        .arg(&config)
        .args(["route", "--from", "5,0,0.2", "--to", "19,0,2.25"])
        .assert()
        .failure();
}

#[test]
fn missing_network_is_an_error() {
    cargo_bin_cmd!("roadnav-cli")
        .env("RUST_LOG", "error")
        .arg("edges")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--network"));
}

#[test]
fn distance_factor_below_one_fails() {
    cli()
        .args(["route", "--from", "5,0,0.2", "--to", "19,0,2.25"])
        .args(["--distance-factor", "0.5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("distance factor"));
}
