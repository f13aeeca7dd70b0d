//! # ddev Sync-Daemon Supervisor
//!
//! File: cli/src/common/mutagen/mod.rs
//!
//! ## Overview
//!
//! Supervises the mutagen file-sync daemon and the per-project sync
//! sessions riding on it:
//!
//! - `daemon`: the host-user singleton process (ensure, stop, foreground
//!   trace logging, version).
//! - `session`: per-project session lifecycle (create, flush, status,
//!   reset, monitor, terminate).
//!
//! The one rule callers must not route around: destructive project
//! operations go through [`flush_then`], which performs the blocking
//! flush before running the destructive closure. Duplicating the flush
//! step at call sites is how flushes get forgotten.
//!
use crate::common::project::ProjectDescriptor;
use crate::core::error::Result;
use std::future::Future;

pub mod daemon;
pub mod session;

pub use daemon::{ensure_daemon, run_foreground_logs, version};
pub use session::{create_session, flush, monitor, reset, status, terminate, wait_watching};

/// Session state as reported by the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    Watching,
    Staging,
    Conflicted,
    Halted,
    Missing,
}

impl SessionStatus {
    /// Extracts the compact status from `mutagen sync list` output.
    pub fn parse(listing: &str) -> SessionStatus {
        let status_line = listing
            .lines()
            .find_map(|l| l.trim().strip_prefix("Status:"))
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();
        if status_line.contains("halted") {
            SessionStatus::Halted
        } else if status_line.contains("conflict") {
            SessionStatus::Conflicted
        } else if status_line.contains("staging") || status_line.contains("reconciling") {
            SessionStatus::Staging
        } else if status_line.contains("watching") {
            SessionStatus::Watching
        } else if status_line.is_empty() {
            SessionStatus::Missing
        } else {
            SessionStatus::Idle
        }
    }
}

/// Runs `act` after a successful flush of the project's session (when
/// sync is enabled). The single gate in front of every destructive
/// project operation: stop, snapshot restore, sync reset.
pub async fn flush_then<T, Fut>(
    desc: &ProjectDescriptor,
    sync_enabled: bool,
    act: impl FnOnce() -> Fut,
) -> Result<T>
where
    Fut: Future<Output = Result<T>>,
{
    if sync_enabled {
        session::flush(desc).await?;
    }
    act().await
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status_variants() {
        let watching = "Name: ddev-demo\nStatus: Watching for changes\n";
        assert_eq!(SessionStatus::parse(watching), SessionStatus::Watching);

        let staging = "Name: ddev-demo\nStatus: Staging files on beta\n";
        assert_eq!(SessionStatus::parse(staging), SessionStatus::Staging);

        assert_eq!(
            SessionStatus::parse("Status: 2 conflicts detected"),
            SessionStatus::Conflicted
        );

        assert_eq!(
            SessionStatus::parse("Status: Halted on root emptied"),
            SessionStatus::Halted
        );
        assert_eq!(SessionStatus::parse(""), SessionStatus::Missing);
        assert_eq!(
            SessionStatus::parse("Status: Connected and idle"),
            SessionStatus::Idle
        );
    }
}
