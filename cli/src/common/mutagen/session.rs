//! # ddev Sync Sessions
//!
//! File: cli/src/common/mutagen/session.rs
//!
//! ## Overview
//!
//! Per-project sync sessions on the shared daemon. Each project with sync
//! enabled owns at most one session, named `ddev-<project>`, binding the
//! host project root (alpha) to the sync-sidecar container's mirror
//! directory (beta). Sessions are keyed by project name only — the daemon
//! holds no back-pointer to projects.
//!
//! The correctness hinge is [`flush`]: it blocks until every queued change
//! in both directions is applied and fsync'd, and **no destructive project
//! operation may proceed without it** (see `flush_then` in the parent
//! module). A missing session during flush is explicitly non-fatal: there
//! is nothing to flush.
//!
use crate::common::docker::{state, volumes};
use crate::common::output::Output;
use crate::common::project::{self, ProjectDescriptor, Role};
use crate::core::config;
use crate::core::error::{DdevError, Result};
use anyhow::{anyhow, Context};
use std::process::Stdio;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::daemon::{ensure_daemon, mutagen_command, run_capture};
use super::SessionStatus;

/// In-container path the sidecar exposes for the project mirror.
pub const SIDECAR_MIRROR_PATH: &str = "/var/www/html";

/// Session name for a project.
pub fn session_name(project: &str) -> String {
    format!("ddev-{}", project)
}

fn missing_session(stderr: &str) -> bool {
    stderr.contains("unable to locate requested sessions")
        || stderr.contains("did not match any sessions")
}

/// Creates the project's sync session. The sync-sidecar container must
/// already be up; the daemon is ensured here.
pub async fn create_session(desc: &ProjectDescriptor) -> Result<()> {
    ensure_daemon().await?;

    let sidecar = project::container_name(&desc.name, Role::SyncSidecar);
    if !state::container_running(&sidecar).await? {
        return Err(anyhow!(DdevError::Precondition(format!(
            "sync sidecar '{}' is not running; it must be started before the session",
            sidecar
        ))));
    }

    let name = session_name(&desc.name);
    let alpha = desc.approot.display().to_string();
    let beta = format!("docker://{}{}", sidecar, SIDECAR_MIRROR_PATH);
    let label = format!("{}={}", state::PROJECT_LABEL, desc.name);
    let (code, _, stderr) = run_capture(&[
        "sync",
        "create",
        &format!("--name={}", name),
        &format!("--label={}", label),
        "--sync-mode=two-way-resolved",
        &alpha,
        &beta,
    ])
    .await?;
    if code != 0 {
        // Re-creating an existing session is idempotent from the caller's
        // point of view.
        if stderr.contains("already exists") {
            debug!("Session '{}' already exists.", name);
            return Ok(());
        }
        return Err(anyhow!(DdevError::ExternalCommand {
            cmd: format!("mutagen sync create {}", name),
            status: code.to_string(),
            output: stderr,
        }));
    }
    info!("Created sync session '{}'.", name);
    Ok(())
}

/// Blocks until all queued host→container and container→host changes are
/// applied and fsync'd. Returns `Ok(false)` when the project has no
/// session (nothing to flush); reports a stall when the configured
/// deadline passes.
pub async fn flush(desc: &ProjectDescriptor) -> Result<bool> {
    let global = config::load_global_config()?;
    let deadline = Duration::from_secs(global.flush_deadline_secs);
    let name = session_name(&desc.name);
    debug!("Flushing sync session '{}'", name);

    let args = ["sync", "flush", name.as_str()];
    match tokio::time::timeout(deadline, run_capture(&args)).await {
        Ok(result) => {
            let (code, _, stderr) = result?;
            if code == 0 {
                debug!("Session '{}' flushed.", name);
                Ok(true)
            } else if missing_session(&stderr) {
                // Documented best-effort case: no session means nothing
                // to flush.
                debug!("No session '{}' to flush.", name);
                Ok(false)
            } else {
                Err(anyhow!(DdevError::ExternalCommand {
                    cmd: format!("mutagen sync flush {}", name),
                    status: code.to_string(),
                    output: stderr,
                }))
            }
        }
        Err(_) => Err(anyhow!(DdevError::Transient(format!(
            "STAGING_STALLED: flush of session '{}' did not complete within {}s",
            name,
            deadline.as_secs()
        )))),
    }
}

/// Returns the compact and verbose session state.
pub async fn status(desc: &ProjectDescriptor) -> Result<(SessionStatus, String)> {
    let name = session_name(&desc.name);
    let (code, stdout, stderr) = run_capture(&["sync", "list", &name]).await?;
    if code != 0 {
        if missing_session(&stderr) {
            return Ok((SessionStatus::Missing, String::new()));
        }
        return Err(anyhow!(DdevError::ExternalCommand {
            cmd: format!("mutagen sync list {}", name),
            status: code.to_string(),
            output: stderr,
        }));
    }
    let short = SessionStatus::parse(&stdout);
    Ok((short, stdout))
}

/// Polls the session until the first full scan reports `Watching`, or the
/// deadline passes.
pub async fn wait_watching(desc: &ProjectDescriptor, deadline: Duration) -> Result<()> {
    let started = tokio::time::Instant::now();
    loop {
        let (short, _) = status(desc).await?;
        match short {
            SessionStatus::Watching | SessionStatus::Idle => return Ok(()),
            SessionStatus::Conflicted => {
                return Err(anyhow!(DdevError::Precondition(format!(
                    "sync session for '{}' has conflicts; resolve them or run `ddev mutagen reset`",
                    desc.name
                ))))
            }
            SessionStatus::Halted | SessionStatus::Missing => {
                return Err(anyhow!(DdevError::Transient(format!(
                    "sync session for '{}' is {:?} before first watch",
                    desc.name, short
                ))))
            }
            SessionStatus::Staging => {}
        }
        if started.elapsed() > deadline {
            return Err(anyhow!(DdevError::Transient(format!(
                "sync session for '{}' did not reach Watching within {}s",
                desc.name,
                deadline.as_secs()
            ))));
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
}

/// Halts and removes the project's session. Missing sessions are fine.
pub async fn terminate(desc: &ProjectDescriptor) -> Result<()> {
    let name = session_name(&desc.name);
    let (code, _, stderr) = run_capture(&["sync", "terminate", &name]).await?;
    if code != 0 && !missing_session(&stderr) {
        return Err(anyhow!(DdevError::ExternalCommand {
            cmd: format!("mutagen sync terminate {}", name),
            status: code.to_string(),
            output: stderr,
        }));
    }
    info!("Sync session '{}' terminated.", name);
    Ok(())
}

/// Halts the session and deletes the sidecar volume so the next `start`
/// re-bootstraps from the host tree. Destroys container-only changes —
/// the caller must already have warned the user.
pub async fn reset(desc: &ProjectDescriptor) -> Result<()> {
    // Best-effort flush first; a dead daemon must not block the reset.
    if let Err(e) = flush(desc).await {
        warn!("Pre-reset flush failed, continuing: {}", e);
    }
    terminate(desc).await?;
    volumes::remove_volume(&project::sync_volume(&desc.name)).await?;
    Ok(())
}

/// Streams session status transitions to the sink until Ctrl-C.
pub async fn monitor(desc: &ProjectDescriptor, out: &Output) -> Result<()> {
    let name = session_name(&desc.name);
    let mut cmd = mutagen_command()?;
    cmd.args(["sync", "monitor", &name]).stdin(Stdio::null());
    let mut child = cmd
        .spawn()
        .context("Failed to spawn mutagen sync monitor (is mutagen installed?)")?;
    out.info(&format!("Monitoring sync session '{}'; Ctrl-C to stop.", name));

    tokio::select! {
        status = child.wait() => {
            let status = status.context("Failed waiting for sync monitor")?;
            if status.success() {
                Ok(())
            } else {
                Err(anyhow!(DdevError::ExternalCommand {
                    cmd: format!("mutagen sync monitor {}", name),
                    status: status.to_string(),
                    output: String::new(),
                }))
            }
        }
        _ = tokio::signal::ctrl_c() => {
            let _ = child.kill().await;
            Ok(())
        }
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_name() {
        assert_eq!(session_name("demo"), "ddev-demo");
    }

    #[test]
    fn test_missing_session_detection() {
        assert!(missing_session(
            "Error: unable to locate requested sessions"
        ));
        assert!(missing_session("specification did not match any sessions"));
        assert!(!missing_session("Error: connection refused"));
    }
}
