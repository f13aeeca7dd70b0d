//! # ddev Delete Command
//!
//! File: cli/src/commands/delete.rs
//!
//! `ddev delete [project] [--yes]`: stop with data removal plus
//! deregistration. The project's files on disk are untouched; only the
//! containers, volumes, network, and registry entry go away.
//!
use crate::common::output::Output;
use crate::common::{project, workflow};
use crate::core::error::{DdevError, Result};
use anyhow::{anyhow, Context};
use clap::Parser;
use tracing::{debug, info};

/// Arguments for `ddev delete`.
#[derive(Parser, Debug)]
pub struct DeleteArgs {
    /// Project name; defaults to the project the working directory is in.
    #[arg(value_name = "PROJECT")]
    project: Option<String>,

    /// Skip the confirmation prompt.
    #[arg(long, short = 'y')]
    yes: bool,
}

/// Handles `ddev delete`.
pub async fn handle_delete(args: DeleteArgs, out: &Output) -> Result<()> {
    info!("Handling delete command...");
    debug!("Delete args: {:?}", args);

    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let desc = project::locate(&cwd, args.project.as_deref())?;

    let prompt = format!(
        "Remove project '{}' including its database volume?",
        desc.name
    );
    if !out.confirm(&prompt, args.yes) {
        return Err(anyhow!(DdevError::Precondition(
            "delete aborted by user".to_string()
        )));
    }
    workflow::remove(&desc, out).await
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_args_parsing() {
        let args = DeleteArgs::try_parse_from(["delete", "demo", "-y"]).expect("parse");
        assert_eq!(args.project.as_deref(), Some("demo"));
        assert!(args.yes);
        assert!(DeleteArgs::try_parse_from(["delete", "a", "b"]).is_err());
    }
}
