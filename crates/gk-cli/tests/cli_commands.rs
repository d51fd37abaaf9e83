//! Integration tests for the gk CLI.

#![allow(deprecated)] // Command::cargo_bin – macro replacement not yet stable

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const QUEST: &str = r#"{
    "flags": [
        { "key": "gold", "kind": "int", "default": 0, "min": 0, "max": 999 },
        { "key": "met_king", "kind": "bool" }
    ],
    "events": [
        { "name": "door_opened", "kind": "unit" },
        { "name": "speed", "kind": "float" }
    ],
    "conditions": [
        { "name": "rich", "type": "predicate", "flag": "gold", "op": "greater_or_equal", "target": 50 },
        { "name": "met", "type": "predicate", "flag": "met_king", "target": true },
        { "name": "door", "type": "predicate", "event": "door_opened" },
        { "name": "fast", "type": "predicate", "event": "speed", "op": "greater_than", "target": 2.5 },
        { "name": "gate", "type": "composite", "combinator": "and", "children": ["rich", "met"] },
        { "name": "exit", "type": "composite", "combinator": "or", "children": ["gate", "door"] }
    ]
}"#;

/// Write a definition into a fresh temp directory.
fn definition(text: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("quest.json");
    fs::write(&path, text).unwrap();
    (dir, path)
}

fn gk() -> Command {
    let mut cmd = Command::cargo_bin("gk").unwrap();
    cmd.env("NO_COLOR", "1");
    cmd
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

#[test]
fn check_passes_valid_definition() {
    let (_dir, path) = definition(QUEST);
    gk().arg("check")
        .arg(&path)
        .assert()
        .success()
        .stdout(
            predicate::str::contains("All checks passed")
                .and(predicate::str::contains("2 flags, 2 events, 6 conditions (2 roots)")),
        );
}

#[test]
fn check_reports_unknown_child() {
    let (_dir, path) = definition(
        r#"{ "conditions": [
            { "name": "gate", "type": "composite", "combinator": "and", "children": ["ghost"] }
        ] }"#,
    );
    gk().arg("check")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown child \"ghost\""));
}

#[test]
fn check_fails_on_malformed_json() {
    let (_dir, path) = definition("{ this is not json");
    gk().arg("check")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid definition"));
}

#[test]
fn check_fails_on_missing_file() {
    let dir = TempDir::new().unwrap();
    gk().arg("check")
        .arg(dir.path().join("absent.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read"));
}

// ---------------------------------------------------------------------------
// flags
// ---------------------------------------------------------------------------

#[test]
fn flags_lists_definitions() {
    let (_dir, path) = definition(QUEST);
    gk().arg("flags")
        .arg(&path)
        .assert()
        .success()
        .stdout(
            predicate::str::contains("gold")
                .and(predicate::str::contains("0..=999"))
                .and(predicate::str::contains("met_king"))
                .and(predicate::str::contains("2 flags")),
        );
}

#[test]
fn flags_empty_definition() {
    let (_dir, path) = definition("{}");
    gk().arg("flags")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("No flags defined"));
}

// ---------------------------------------------------------------------------
// eval
// ---------------------------------------------------------------------------

#[test]
fn eval_without_actions_fulfills_nothing() {
    let (_dir, path) = definition(QUEST);
    gk().arg("eval")
        .arg(&path)
        .assert()
        .success()
        .stdout(
            predicate::str::contains("(none)")
                .and(predicate::str::contains("[ ] exit: OR"))
                .and(predicate::str::contains("gold = 0")),
        );
}

#[test]
fn eval_flag_writes_open_the_gate() {
    let (_dir, path) = definition(QUEST);
    gk().arg("eval")
        .arg(&path)
        .args(["--set", "gold=75", "--set", "met_king=true"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("* exit")
                .and(predicate::str::contains("[x] gate: AND"))
                .and(predicate::str::contains("[x] rich: flag:gold >= 50")),
        );
}

#[test]
fn eval_raises_events() {
    let (_dir, path) = definition(QUEST);
    gk().arg("eval")
        .arg(&path)
        .args(["--raise", "door_opened", "--raise", "speed=3.0", "--watch", "exit", "--watch", "fast"])
        .assert()
        .success()
        .stdout(predicate::str::contains("* exit").and(predicate::str::contains("* fast")));
}

#[test]
fn eval_force_fulfills_condition() {
    let (_dir, path) = definition(QUEST);
    gk().arg("eval")
        .arg(&path)
        .args(["--force", "door"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[x] exit: OR"));
}

#[test]
fn eval_json_output() {
    let (_dir, path) = definition(QUEST);
    let output = gk()
        .arg("eval")
        .arg(&path)
        .args(["--set", "gold=5000", "--watch", "rich", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["fulfilled"], serde_json::json!(["rich"]));
    assert_eq!(json["flags"]["gold"], 999);
    assert_eq!(json["conditions"][0]["name"], "rich");
    assert_eq!(json["conditions"][0]["value"], true);
    assert_eq!(json["conditions"][0]["detail"]["type"], "predicate");
}

#[test]
fn eval_rejects_bad_arguments() {
    let (_dir, path) = definition(QUEST);
    gk().arg("eval")
        .arg(&path)
        .args(["--set", "gold=lots"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("flag gold expects a int value"));

    gk().arg("eval")
        .arg(&path)
        .args(["--set", "silver=1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown flag: silver"));

    gk().arg("eval")
        .arg(&path)
        .args(["--raise", "speed=fast"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("event speed expects a float value"));

    gk().arg("eval")
        .arg(&path)
        .args(["--watch", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown condition: \"ghost\""));
}
