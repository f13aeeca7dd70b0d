//! # ddev Start Command
//!
//! File: cli/src/commands/start.rs
//!
//! ## Overview
//!
//! `ddev start [project]`: brings the project's container stack up —
//! auxiliary singletons, network, containers in dependency order, the
//! sync session when enabled, health probes — and reports the URLs the
//! project is reachable at.
//!
use crate::common::output::Output;
use crate::common::{project, workflow};
use crate::core::error::Result;
use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};

/// Arguments for `ddev start`.
#[derive(Parser, Debug)]
pub struct StartArgs {
    /// Project name; defaults to the project the working directory is in.
    #[arg(value_name = "PROJECT")]
    project: Option<String>,
}

/// Handles `ddev start`.
pub async fn handle_start(args: StartArgs, out: &Output) -> Result<()> {
    info!("Handling start command...");
    debug!("Start args: {:?}", args);

    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let desc = project::locate(&cwd, args.project.as_deref())?;
    workflow::start(&desc, out).await
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_args_parsing() {
        let named = StartArgs::try_parse_from(["start", "demo"]).expect("named");
        assert_eq!(named.project.as_deref(), Some("demo"));

        let implicit = StartArgs::try_parse_from(["start"]).expect("implicit");
        assert!(implicit.project.is_none());
    }

    /// One optional project argument at most; a second positional is a
    /// usage error, not silently ignored.
    #[test]
    fn test_start_rejects_extra_positionals() {
        assert!(StartArgs::try_parse_from(["start", "demo", "extra"]).is_err());
    }
}
