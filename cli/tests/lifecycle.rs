//! # ddev Lifecycle Command Integration Tests
//!
//! File: cli/tests/lifecycle.rs
//!
//! ## Overview
//!
//! Tests for `ddev start`, `stop`, `restart`, `delete`, and `list` up to
//! the point where the container engine would be needed: project
//! location, registry behavior, and the not-found error surface.
//!
//! **Note:** tests that drive real containers require a Docker daemon
//! and are `#[ignore]`d.
//!

mod common;
use common::*;
use predicates::prelude::*;
use tempfile::tempdir;

/// Outside any project, with nothing registered, every lifecycle verb
/// fails with the project-not-found error.
#[test]
fn test_lifecycle_outside_any_project() {
    let state = tempdir().unwrap();
    let nowhere = tempdir().unwrap();
    for verb in ["start", "stop", "restart"] {
        ddev_cmd(state.path())
            .arg(verb)
            .current_dir(nowhere.path())
            .assert()
            .code(1)
            .stderr(predicate::str::contains("was not found"));
    }
}

#[test]
fn test_named_project_not_registered() {
    let state = tempdir().unwrap();
    ddev_cmd(state.path())
        .args(["stop", "no-such-project"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("was not found"))
        .stderr(predicate::str::contains("ddev start"));
}

#[test]
fn test_list_with_empty_registry() {
    let state = tempdir().unwrap();
    ddev_cmd(state.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No projects registered"));
}

/// An invalid project name in the descriptor is rejected before any
/// engine work happens.
#[test]
fn test_start_rejects_invalid_project_name() {
    let state = tempdir().unwrap();
    let root = tempdir().unwrap();
    write_project_descriptor(root.path(), "Bad_Name");
    ddev_cmd(state.path())
        .arg("start")
        .current_dir(root.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("lowercase DNS label"));
}

/// Full start / stop round trip with real containers.
#[test]
#[ignore] // Requires a running Docker daemon and the mutagen binary.
fn test_start_then_stop_round_trip() {
    let state = tempdir().unwrap();
    let root = tempdir().unwrap();
    write_project_descriptor(root.path(), "itest");
    ddev_cmd(state.path())
        .arg("start")
        .current_dir(root.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("running and reachable"));
    ddev_cmd(state.path())
        .arg("stop")
        .current_dir(root.path())
        .assert()
        .success();
}
