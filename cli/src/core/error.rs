//! # ddev Error Types
//!
//! File: cli/src/core/error.rs
//!
//! ## Overview
//!
//! This module defines the error taxonomy used throughout ddev. Components
//! return typed errors; the command layer maps them onto process exit codes.
//!
//! ## Architecture
//!
//! Two pieces:
//! - `DdevError`: a `thiserror` enum covering the error classes the tool
//!   distinguishes (usage, not-found, precondition, transient, fatal,
//!   interrupted) plus carriers for Docker API, filesystem, config, and
//!   external-command failures.
//! - `Result<T>`: an alias for `anyhow::Result<T>` so call sites can add
//!   context with `.with_context()` while the typed error stays reachable
//!   via `downcast_ref`.
//!
//! Exit-code mapping (see `exit_code`): usage errors exit 2, interruption
//! exits 130 (SIGINT) or 143 (SIGTERM), everything else exits 1.
//!
use thiserror::Error;

/// Custom error type for the ddev application.
#[derive(Error, Debug)]
pub enum DdevError {
    /// Bad flags or extra positional arguments. Exit 2.
    #[error("usage error: {0}")]
    Usage(String),

    /// Project, snapshot, session, or container missing. Exit 1 with hint.
    #[error("{kind} '{name}' was not found{hint}")]
    NotFound {
        kind: &'static str,
        name: String,
        hint: String,
    },

    /// Operation requirements not met (project not running, sync disabled,
    /// snapshot engine incompatible, ...). Exit 1.
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// Engine or daemon call that may succeed on retry. Retried internally
    /// with bounded backoff; surfaced only once the budget is exhausted.
    #[error("transient failure: {0}")]
    Transient(String),

    /// Invariant violated. State is left as-is for operator inspection.
    #[error("internal invariant violated: {0}")]
    Fatal(String),

    /// Cancellation before a point of no return.
    #[error("interrupted by {signal}")]
    Interrupted { signal: &'static str },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("filesystem error: {0}")]
    FileSystem(String),

    #[error("Docker API interaction failed: {source}")]
    DockerApi {
        #[from]
        source: bollard::errors::Error,
    },

    #[error("Docker operation failed: {0}")]
    DockerOperation(String),

    #[error("external command failed: {cmd}, status: {status}, output:\n{output}")]
    ExternalCommand {
        cmd: String,
        status: String,
        output: String,
    },
}

impl DdevError {
    /// Shorthand for the common not-found cases.
    pub fn not_found(kind: &'static str, name: impl Into<String>, hint: &str) -> Self {
        let hint = if hint.is_empty() {
            String::new()
        } else {
            format!(" ({})", hint)
        };
        DdevError::NotFound {
            kind,
            name: name.into(),
            hint,
        }
    }

    /// Maps the error class to the process exit code contract:
    /// 0 success, 1 operational failure, 2 usage error, 130/143 signalled.
    pub fn exit_code(&self) -> i32 {
        match self {
            DdevError::Usage(_) => 2,
            DdevError::Interrupted { signal } => match *signal {
                "SIGTERM" => 143,
                _ => 130,
            },
            _ => 1,
        }
    }
}

/// Type alias for Result using anyhow::Error for broad compatibility.
pub type Result<T> = anyhow::Result<T>;

/// Resolves the exit code for an arbitrary error chain: if a `DdevError`
/// is anywhere in the chain its mapping wins, otherwise 1.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<DdevError>())
        .map(DdevError::exit_code)
        .unwrap_or(1)
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_error_display() {
        let usage = DdevError::Usage("unexpected argument 'extra'".to_string());
        assert_eq!(usage.to_string(), "usage error: unexpected argument 'extra'");

        let nf = DdevError::not_found("snapshot", "s1", "run `ddev snapshot` first");
        assert_eq!(
            nf.to_string(),
            "snapshot 's1' was not found (run `ddev snapshot` first)"
        );

        let nf_no_hint = DdevError::not_found("project", "demo", "");
        assert_eq!(nf_no_hint.to_string(), "project 'demo' was not found");
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(DdevError::Usage("x".into()).exit_code(), 2);
        assert_eq!(DdevError::Precondition("x".into()).exit_code(), 1);
        assert_eq!(DdevError::Interrupted { signal: "SIGINT" }.exit_code(), 130);
        assert_eq!(DdevError::Interrupted { signal: "SIGTERM" }.exit_code(), 143);
    }

    #[test]
    fn test_exit_code_for_buried_error() {
        let err = anyhow!(DdevError::Usage("bad".into())).context("while parsing");
        assert_eq!(exit_code_for(&err), 2);

        let plain = anyhow!("some io problem");
        assert_eq!(exit_code_for(&plain), 1);
    }
}
