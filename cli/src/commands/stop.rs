//! # ddev Stop Command
//!
//! File: cli/src/commands/stop.rs
//!
//! ## Overview
//!
//! `ddev stop [project] [--remove-data]`: flushes the sync session when
//! one is active, halts it, stops the project containers in reverse
//! dependency order, and optionally removes the project-owned volumes and
//! network. Auxiliary singletons are never touched.
//!
use crate::common::output::Output;
use crate::common::{project, workflow};
use crate::core::error::Result;
use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};

/// Arguments for `ddev stop`.
#[derive(Parser, Debug)]
pub struct StopArgs {
    /// Project name; defaults to the project the working directory is in.
    #[arg(value_name = "PROJECT")]
    project: Option<String>,

    /// Also remove project-owned volumes and networks.
    #[arg(long)]
    remove_data: bool,
}

/// Handles `ddev stop`.
pub async fn handle_stop(args: StopArgs, out: &Output) -> Result<()> {
    info!("Handling stop command...");
    debug!("Stop args: {:?}", args);

    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let desc = project::locate(&cwd, args.project.as_deref())?;
    workflow::stop(&desc, args.remove_data, out).await
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_args_parsing() {
        let plain = StopArgs::try_parse_from(["stop"]).expect("plain");
        assert!(plain.project.is_none());
        assert!(!plain.remove_data);

        let full = StopArgs::try_parse_from(["stop", "demo", "--remove-data"]).expect("full");
        assert_eq!(full.project.as_deref(), Some("demo"));
        assert!(full.remove_data);
    }

    #[test]
    fn test_stop_rejects_extra_positionals() {
        assert!(StopArgs::try_parse_from(["stop", "demo", "other"]).is_err());
    }
}
