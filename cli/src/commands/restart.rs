//! # ddev Restart Command
//!
//! File: cli/src/commands/restart.rs
//!
//! `ddev restart [project]`: stop followed by start, leaving the
//! auxiliary singletons in place throughout.
//!
use crate::common::output::Output;
use crate::common::{project, workflow};
use crate::core::error::Result;
use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};

/// Arguments for `ddev restart`.
#[derive(Parser, Debug)]
pub struct RestartArgs {
    /// Project name; defaults to the project the working directory is in.
    #[arg(value_name = "PROJECT")]
    project: Option<String>,
}

/// Handles `ddev restart`.
pub async fn handle_restart(args: RestartArgs, out: &Output) -> Result<()> {
    info!("Handling restart command...");
    debug!("Restart args: {:?}", args);

    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let desc = project::locate(&cwd, args.project.as_deref())?;
    workflow::restart(&desc, out).await
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restart_args_parsing() {
        let args = RestartArgs::try_parse_from(["restart", "demo"]).expect("parse");
        assert_eq!(args.project.as_deref(), Some("demo"));
        assert!(RestartArgs::try_parse_from(["restart", "a", "b"]).is_err());
    }
}
