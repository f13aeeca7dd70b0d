//! # ddev Mutagen Command Integration Tests
//!
//! File: cli/tests/mutagen.rs
//!
//! ## Overview
//!
//! Tests for the `ddev mutagen` surface that works without the mutagen
//! binary: the sync-disabled warnings, plus the streaming commands' exit
//! behavior for environments where mutagen is installed.
//!

mod common;
use common::*;
use predicates::prelude::*;
use std::time::Duration;
use tempfile::tempdir;

/// With sync disabled, `mutagen reset` warns and exits 0 without touching
/// any state.
#[test]
fn test_reset_with_sync_disabled_warns_and_exits_zero() {
    let state = tempdir().unwrap();
    let root = tempdir().unwrap();
    write_project_descriptor(root.path(), "demo");
    ddev_cmd(state.path())
        .args(["mutagen", "reset"])
        .current_dir(root.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Mutagen is not enabled"));
}

#[test]
fn test_status_with_sync_disabled_warns() {
    let state = tempdir().unwrap();
    let root = tempdir().unwrap();
    write_project_descriptor(root.path(), "demo");
    ddev_cmd(state.path())
        .args(["mutagen", "status"])
        .current_dir(root.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Mutagen is not enabled"));
}

#[test]
fn test_monitor_with_sync_disabled_fails() {
    let state = tempdir().unwrap();
    let root = tempdir().unwrap();
    write_project_descriptor(root.path(), "demo");
    ddev_cmd(state.path())
        .args(["mutagen", "monitor"])
        .current_dir(root.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Mutagen is not enabled"));
}

/// `mutagen logs` runs until Ctrl-C and must exit 0 on it, never 130:
/// the command handles the signal itself, cleaning up its foreground
/// child first.
#[test]
#[ignore] // Requires the mutagen binary on PATH.
fn test_logs_exits_zero_on_ctrl_c() {
    let state = tempdir().unwrap();
    let bin = assert_cmd::cargo::cargo_bin("ddev");
    let mut child = std::process::Command::new(bin)
        .args(["mutagen", "logs"])
        .env("DDEV_GLOBAL_DIR", state.path())
        .env("DDEV_NONINTERACTIVE", "1")
        .spawn()
        .expect("spawn ddev mutagen logs");
    std::thread::sleep(Duration::from_secs(2));
    std::process::Command::new("kill")
        .args(["-INT", &child.id().to_string()])
        .status()
        .expect("send SIGINT");
    let status = child.wait().expect("wait for ddev");
    assert_eq!(status.code(), Some(0));
}
