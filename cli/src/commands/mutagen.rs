//! # ddev Mutagen Commands
//!
//! File: cli/src/commands/mutagen.rs
//!
//! ## Overview
//!
//! The `ddev mutagen` subcommand group, the user-facing surface of the
//! sync-daemon supervisor:
//!
//! - `sync` — flush the project's session (blocks until durable).
//! - `status` — compact session state, full listing with `--verbose`.
//! - `reset` — halt the session and drop the sidecar volume so the next
//!   start re-bootstraps from the host tree.
//! - `monitor` — stream status transitions until Ctrl-C.
//! - `logs` — foreground daemon with trace logging (project-free).
//! - `version` — mutagen binary version and data directory (project-free).
//!
use crate::common::output::Output;
use crate::common::{mutagen, project, workflow};
use crate::core::config;
use crate::core::error::{DdevError, Result};
use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{debug, info};

/// Arguments for `ddev mutagen`.
#[derive(Parser, Debug)]
pub struct MutagenArgs {
    #[command(subcommand)]
    command: MutagenCommand,
}

impl MutagenArgs {
    /// True for the streaming subcommands (`monitor`, `logs`) that run
    /// until Ctrl-C and handle the signal themselves: they clean up their
    /// foreground child and exit 0.
    pub fn handles_interrupt(&self) -> bool {
        matches!(
            self.command,
            MutagenCommand::Monitor(_) | MutagenCommand::Logs
        )
    }
}

#[derive(Subcommand, Debug)]
enum MutagenCommand {
    /// Flush the project's sync session.
    Sync(ProjectFlagArgs),
    /// Show the sync session's state.
    Status(ProjectFlagArgs),
    /// Halt the session and reset its sidecar volume.
    Reset(ResetArgs),
    /// Stream session status transitions until Ctrl-C.
    Monitor(ProjectArgs),
    /// Run the sync daemon in the foreground with trace logging.
    Logs,
    /// Show the mutagen binary version.
    Version,
}

#[derive(Parser, Debug)]
struct ProjectArgs {
    /// Project name; defaults to the project the working directory is in.
    #[arg(value_name = "PROJECT")]
    project: Option<String>,
}

#[derive(Parser, Debug)]
struct ResetArgs {
    /// Project name; defaults to the project the working directory is in.
    #[arg(value_name = "PROJECT")]
    project: Option<String>,

    /// Skip the confirmation prompt.
    #[arg(long, short = 'y')]
    yes: bool,
}

#[derive(Parser, Debug)]
struct ProjectFlagArgs {
    /// Project name; defaults to the project the working directory is in.
    #[arg(value_name = "PROJECT")]
    project: Option<String>,

    /// Show the full session listing.
    #[arg(long)]
    verbose: bool,
}

fn locate(project: Option<&str>) -> Result<project::ProjectDescriptor> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    project::locate(&cwd, project)
}

fn sync_enabled(desc: &project::ProjectDescriptor) -> Result<bool> {
    let global = config::load_global_config()?;
    Ok(desc.mutagen_enabled(&global))
}

/// Handles the `ddev mutagen` subcommands.
pub async fn handle_mutagen(args: MutagenArgs, out: &Output) -> Result<()> {
    info!("Handling mutagen command...");
    debug!("Mutagen args: {:?}", args);

    match args.command {
        MutagenCommand::Sync(a) => {
            let desc = locate(a.project.as_deref())?;
            if !sync_enabled(&desc)? {
                out.warning(&format!(
                    "Mutagen is not enabled for project '{}'.",
                    desc.name
                ));
                return Ok(());
            }
            let flushed = mutagen::flush(&desc).await?;
            if flushed {
                out.success(&format!("Sync session for '{}' flushed.", desc.name));
            } else {
                out.warning(&format!(
                    "Project '{}' has no sync session; nothing to flush.",
                    desc.name
                ));
            }
            if a.verbose {
                let (_, long) = mutagen::status(&desc).await?;
                out.info(&long);
            }
            Ok(())
        }
        MutagenCommand::Status(a) => {
            let desc = locate(a.project.as_deref())?;
            if !sync_enabled(&desc)? {
                out.warning(&format!(
                    "Mutagen is not enabled for project '{}'.",
                    desc.name
                ));
                return Ok(());
            }
            let (short, long) = mutagen::status(&desc).await?;
            out.info_with(
                &format!("Sync session for '{}': {:?}", desc.name, short),
                json!({ "project": desc.name, "status": format!("{:?}", short) }),
            );
            if a.verbose && !long.is_empty() {
                out.info(&long);
            }
            Ok(())
        }
        MutagenCommand::Reset(a) => {
            let desc = locate(a.project.as_deref())?;
            if !sync_enabled(&desc)? {
                // Nothing to reset; warn and leave state untouched.
                out.warning(&format!(
                    "Mutagen is not enabled for project '{}'.",
                    desc.name
                ));
                return Ok(());
            }
            if !out.confirm(&workflow::reset_warning(&desc), a.yes) {
                return Err(anyhow!(DdevError::Precondition(
                    "sync reset aborted by user".to_string()
                )));
            }
            mutagen::reset(&desc).await?;
            out.success(&format!(
                "Sync for '{}' was reset; the next start re-bootstraps from the host tree.",
                desc.name
            ));
            Ok(())
        }
        MutagenCommand::Monitor(a) => {
            let desc = locate(a.project.as_deref())?;
            if !sync_enabled(&desc)? {
                return Err(anyhow!(DdevError::Precondition(format!(
                    "Mutagen is not enabled for project '{}'",
                    desc.name
                ))));
            }
            mutagen::monitor(&desc, out).await
        }
        MutagenCommand::Logs => mutagen::run_foreground_logs(out).await,
        MutagenCommand::Version => {
            let version = mutagen::version().await?;
            let data_dir = config::sync_daemon_data_dir()?;
            out.info_with(
                &format!("{} (data directory {})", version, data_dir.display()),
                json!({ "version": version, "data_directory": data_dir }),
            );
            Ok(())
        }
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutagen_subcommand_parsing() {
        let sync = MutagenArgs::try_parse_from(["mutagen", "sync", "demo", "--verbose"]).unwrap();
        match sync.command {
            MutagenCommand::Sync(a) => {
                assert_eq!(a.project.as_deref(), Some("demo"));
                assert!(a.verbose);
            }
            other => panic!("unexpected: {:?}", other),
        }

        assert!(MutagenArgs::try_parse_from(["mutagen", "logs"]).is_ok());
        assert!(MutagenArgs::try_parse_from(["mutagen", "version"]).is_ok());
        // logs and version are project-free.
        assert!(MutagenArgs::try_parse_from(["mutagen", "logs", "demo"]).is_err());
    }

    #[test]
    fn test_streaming_subcommands_own_interrupt_handling() {
        let logs = MutagenArgs::try_parse_from(["mutagen", "logs"]).unwrap();
        assert!(logs.handles_interrupt());
        let monitor = MutagenArgs::try_parse_from(["mutagen", "monitor"]).unwrap();
        assert!(monitor.handles_interrupt());
        let sync = MutagenArgs::try_parse_from(["mutagen", "sync"]).unwrap();
        assert!(!sync.handles_interrupt());
    }

    #[test]
    fn test_mutagen_reset_rejects_extra_positionals() {
        assert!(MutagenArgs::try_parse_from(["mutagen", "reset", "a", "b"]).is_err());
        let reset = MutagenArgs::try_parse_from(["mutagen", "reset", "demo", "-y"]).unwrap();
        match reset.command {
            MutagenCommand::Reset(a) => assert!(a.yes),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
