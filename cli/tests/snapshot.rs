//! # ddev Snapshot Command Integration Tests
//!
//! File: cli/tests/snapshot.rs
//!
//! ## Overview
//!
//! Tests for the `ddev snapshot` surface that works without a container
//! engine: selector validation for `restore`, listing, and cleanup of
//! on-disk snapshot directories.
//!

mod common;
use common::*;
use predicates::prelude::*;
use std::path::Path;
use tempfile::tempdir;

/// Writes a complete on-disk snapshot (metadata plus completion marker)
/// so list/cleanup have something to chew on without an engine.
fn write_snapshot(root: &Path, project: &str, name: &str, created: &str) {
    let dir = root.join(".config/db_snapshots").join(name);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("snapshot.yaml"),
        format!(
            "name: {}\nproject: {}\nengine: mariadb:10.11\ncreated: {}\n",
            name, project, created
        ),
    )
    .unwrap();
    std::fs::write(dir.join("dump.sql"), "-- dump\n").unwrap();
    std::fs::write(dir.join(".complete"), "").unwrap();
}

/// `restore` needs exactly one of a snapshot name or `--latest`; both
/// and neither are usage errors, even outside any project.
#[test]
fn test_restore_selector_is_validated_before_project_lookup() {
    let state = tempdir().unwrap();
    let nowhere = tempdir().unwrap();
    ddev_cmd(state.path())
        .args(["snapshot", "restore"])
        .current_dir(nowhere.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--latest"));
    ddev_cmd(state.path())
        .args(["snapshot", "restore", "snap", "--latest"])
        .current_dir(nowhere.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("not both"));
}

#[test]
fn test_snapshot_list_empty() {
    let state = tempdir().unwrap();
    let root = tempdir().unwrap();
    write_project_descriptor(root.path(), "demo");
    ddev_cmd(state.path())
        .args(["snapshot", "--list"])
        .current_dir(root.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("has no snapshots"));
}

/// Listing is oldest first and skips snapshots without the completion
/// marker.
#[test]
fn test_snapshot_list_orders_and_filters() {
    let state = tempdir().unwrap();
    let root = tempdir().unwrap();
    write_project_descriptor(root.path(), "demo");
    write_snapshot(root.path(), "demo", "newer", "2026-08-02T10:00:00Z");
    write_snapshot(root.path(), "demo", "older", "2026-08-01T10:00:00Z");
    write_snapshot(root.path(), "demo", "torn", "2026-08-03T10:00:00Z");
    std::fs::remove_file(root.path().join(".config/db_snapshots/torn/.complete")).unwrap();

    let assert = ddev_cmd(state.path())
        .args(["snapshot", "--list"])
        .current_dir(root.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("older"))
        .stdout(predicate::str::contains("newer"));
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(!stdout.contains("torn"));
    let older_at = stdout.find("older").unwrap();
    let newer_at = stdout.find("newer").unwrap();
    assert!(older_at < newer_at, "expected oldest first:\n{}", stdout);
}

#[test]
fn test_snapshot_cleanup_named() {
    let state = tempdir().unwrap();
    let root = tempdir().unwrap();
    write_project_descriptor(root.path(), "demo");
    write_snapshot(root.path(), "demo", "keep", "2026-08-01T10:00:00Z");
    write_snapshot(root.path(), "demo", "drop", "2026-08-02T10:00:00Z");

    ddev_cmd(state.path())
        .args(["snapshot", "--cleanup", "--name", "drop", "--yes"])
        .current_dir(root.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted snapshot drop"));
    assert!(root.path().join(".config/db_snapshots/keep").is_dir());
    assert!(!root.path().join(".config/db_snapshots/drop").exists());
}

#[test]
fn test_snapshot_cleanup_all() {
    let state = tempdir().unwrap();
    let root = tempdir().unwrap();
    write_project_descriptor(root.path(), "demo");
    write_snapshot(root.path(), "demo", "a", "2026-08-01T10:00:00Z");
    write_snapshot(root.path(), "demo", "b", "2026-08-02T10:00:00Z");

    ddev_cmd(state.path())
        .args(["snapshot", "--cleanup", "--all", "--yes"])
        .current_dir(root.path())
        .assert()
        .success();
    assert!(!root.path().join(".config/db_snapshots/a").exists());
    assert!(!root.path().join(".config/db_snapshots/b").exists());
}

/// A snapshot name is a directory name; one that climbs out of
/// `db_snapshots/` must be rejected before anything touches the disk.
#[test]
fn test_snapshot_cleanup_rejects_traversal_names() {
    let state = tempdir().unwrap();
    let root = tempdir().unwrap();
    write_project_descriptor(root.path(), "demo");
    write_snapshot(root.path(), "demo", "keep", "2026-08-01T10:00:00Z");
    let outside = root.path().join("web");
    std::fs::create_dir_all(&outside).unwrap();

    ddev_cmd(state.path())
        .args(["snapshot", "--cleanup", "--name", "../../web", "--yes"])
        .current_dir(root.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("is invalid"));
    assert!(outside.is_dir());
    assert!(root.path().join(".config/db_snapshots/keep").is_dir());
}

#[test]
fn test_snapshot_cleanup_name_and_all_conflict() {
    let state = tempdir().unwrap();
    let root = tempdir().unwrap();
    write_project_descriptor(root.path(), "demo");
    ddev_cmd(state.path())
        .args(["snapshot", "--cleanup", "--name", "x", "--all"])
        .current_dir(root.path())
        .assert()
        .code(2);
}

#[test]
fn test_snapshot_cleanup_missing_name() {
    let state = tempdir().unwrap();
    let root = tempdir().unwrap();
    write_project_descriptor(root.path(), "demo");
    ddev_cmd(state.path())
        .args(["snapshot", "--cleanup", "--name", "ghost", "--yes"])
        .current_dir(root.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("was not found"));
}
