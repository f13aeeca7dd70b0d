//! # ddev CLI Integration Test Common Helpers
//!
//! File: cli/tests/common.rs
//!
//! ## Overview
//!
//! Shared helpers for the integration test files in `cli/tests/`. Each
//! `.rs` file there compiles as a separate test crate running the real
//! `ddev` binary.
//!
//! Every test runs against an isolated state root (`DDEV_GLOBAL_DIR`
//! pointed at a tempdir) so nothing touches the invoking user's real
//! configuration, and with `DDEV_NONINTERACTIVE` set so no test can hang
//! on a prompt.
//!

// Different test files use different helpers.
#![allow(dead_code)]

pub use assert_cmd::Command;
use std::path::Path;

/// An `assert_cmd::Command` for the compiled `ddev` binary, isolated to
/// the given state root.
pub fn ddev_cmd(state_root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("ddev").expect("Failed to find ddev binary for testing");
    cmd.env("DDEV_GLOBAL_DIR", state_root);
    cmd.env("DDEV_NONINTERACTIVE", "1");
    cmd
}

/// Writes a minimal project descriptor under `root/.config/config.yaml`
/// so the walk-up locator finds a project named `name`.
pub fn write_project_descriptor(root: &Path, name: &str) {
    let config_dir = root.join(".config");
    std::fs::create_dir_all(&config_dir).expect("create .config");
    std::fs::write(config_dir.join("config.yaml"), format!("name: {}\n", name))
        .expect("write descriptor");
}
