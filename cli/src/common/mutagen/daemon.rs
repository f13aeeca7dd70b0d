//! # ddev Sync Daemon Control
//!
//! File: cli/src/common/mutagen/daemon.rs
//!
//! ## Overview
//!
//! Owns the singleton mutagen daemon process (one per host user). The
//! daemon is started lazily on first need, serialized by an advisory lock
//! so concurrent invocations race safely, and shared by all projects: its
//! `MUTAGEN_DATA_DIRECTORY` is pinned to the ddev state root for every
//! invocation of the binary, which is what makes "the same daemon" an
//! enforceable notion.
//!
//! `run_foreground_logs` replaces the shared daemon with a foreground one
//! in trace-log mode for debugging; every exit path from it — normal end,
//! child failure, Ctrl-C — re-ensures the shared daemon afterwards so the
//! host is never left without one.
//!
use crate::common::lock::Lock;
use crate::common::output::Output;
use crate::core::config;
use crate::core::error::{DdevError, Result};
use anyhow::{anyhow, Context};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, warn};

const DAEMON_LOCK_FILENAME: &str = "daemon.lock";

/// Builds a `mutagen` command with the data directory pinned.
pub(super) fn mutagen_command() -> Result<Command> {
    let data_dir = config::sync_daemon_data_dir()?;
    let mut cmd = Command::new("mutagen");
    cmd.env("MUTAGEN_DATA_DIRECTORY", &data_dir);
    Ok(cmd)
}

/// Runs a mutagen subcommand to completion, capturing combined output.
/// Returns `(exit_code, stdout, stderr)`.
pub(super) async fn run_capture(args: &[&str]) -> Result<(i32, String, String)> {
    let mut cmd = mutagen_command()?;
    cmd.args(args).stdin(Stdio::null());
    debug!("Running mutagen {:?}", args);
    let out = cmd
        .output()
        .await
        .with_context(|| format!("Failed to run mutagen {:?} (is mutagen installed?)", args))?;
    let code = out.status.code().unwrap_or(-1);
    Ok((
        code,
        String::from_utf8_lossy(&out.stdout).into_owned(),
        String::from_utf8_lossy(&out.stderr).into_owned(),
    ))
}

/// Starts the shared daemon if it is not already running. Idempotent:
/// `mutagen daemon start` succeeds when a daemon already serves the data
/// directory. Concurrent callers serialize on the daemon advisory lock,
/// held only for the duration of this call.
pub async fn ensure_daemon() -> Result<()> {
    let lock_path = config::sync_daemon_data_dir()?.join(DAEMON_LOCK_FILENAME);
    let _lock = Lock::acquire(&lock_path)?;
    let (code, _, stderr) = run_capture(&["daemon", "start"]).await?;
    if code != 0 {
        return Err(anyhow!(DdevError::ExternalCommand {
            cmd: "mutagen daemon start".to_string(),
            status: code.to_string(),
            output: stderr,
        }));
    }
    debug!("Sync daemon is running.");
    Ok(())
}

/// Stops the shared daemon. Safe to call when it is not running.
pub async fn stop_daemon(reason: &str) -> Result<()> {
    info!("Stopping sync daemon: {}", reason);
    let (code, _, stderr) = run_capture(&["daemon", "stop"]).await?;
    if code != 0 && !stderr.contains("unable to connect to daemon") {
        return Err(anyhow!(DdevError::ExternalCommand {
            cmd: "mutagen daemon stop".to_string(),
            status: code.to_string(),
            output: stderr,
        }));
    }
    Ok(())
}

/// Reports the mutagen binary's own version.
pub async fn version() -> Result<String> {
    let (code, stdout, stderr) = run_capture(&["version"]).await?;
    if code != 0 {
        return Err(anyhow!(DdevError::ExternalCommand {
            cmd: "mutagen version".to_string(),
            status: code.to_string(),
            output: stderr,
        }));
    }
    Ok(stdout.trim().to_string())
}

/// Stops the shared daemon and runs a foreground daemon with trace
/// logging, streaming its output until the child exits or Ctrl-C. The
/// shared daemon is re-ensured on all exit paths.
pub async fn run_foreground_logs(out: &Output) -> Result<()> {
    stop_daemon("switching to foreground trace logging").await?;
    out.info("Running sync daemon in the foreground with trace logging; Ctrl-C to stop.");

    let run_result = run_foreground_child().await;

    // The shared singleton must come back no matter how the foreground
    // daemon went away.
    if let Err(e) = ensure_daemon().await {
        warn!("Failed to restart shared sync daemon after logs: {}", e);
        if run_result.is_ok() {
            return Err(e);
        }
    }
    run_result
}

async fn run_foreground_child() -> Result<()> {
    let mut cmd = mutagen_command()?;
    cmd.args(["daemon", "run"])
        .env("MUTAGEN_LOG_LEVEL", "trace")
        .stdin(Stdio::null());
    let mut child = cmd
        .spawn()
        .context("Failed to spawn foreground sync daemon (is mutagen installed?)")?;

    tokio::select! {
        status = child.wait() => {
            let status = status.context("Failed waiting for foreground sync daemon")?;
            if status.success() {
                Ok(())
            } else {
                Err(anyhow!(DdevError::ExternalCommand {
                    cmd: "mutagen daemon run".to_string(),
                    status: status.to_string(),
                    output: String::new(),
                }))
            }
        }
        _ = tokio::signal::ctrl_c() => {
            debug!("Ctrl-C received, stopping foreground sync daemon.");
            let _ = child.kill().await;
            Ok(())
        }
    }
}
