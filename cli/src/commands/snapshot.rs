//! # ddev Snapshot Commands
//!
//! File: cli/src/commands/snapshot.rs
//!
//! ## Overview
//!
//! `ddev snapshot` and its `restore` subcommand:
//!
//! - `ddev snapshot [project] [--name NAME]` — create a snapshot of the
//!   running database (name defaults to a project-prefixed timestamp).
//! - `ddev snapshot --list` — list snapshots, oldest first.
//! - `ddev snapshot --cleanup [--name NAME | --all] [--yes]` — delete one
//!   or all snapshots, prompting unless `--yes`/`DDEV_NONINTERACTIVE`.
//! - `ddev snapshot restore <NAME>` / `ddev snapshot restore --latest` —
//!   restore a snapshot; `--latest` picks the newest by creation time,
//!   ties broken lexicographically ascending by name.
//!
use crate::common::output::Output;
use crate::common::snapshots::{self, Selector};
use crate::common::project;
use crate::core::error::{DdevError, Result};
use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{debug, info};

/// Arguments for `ddev snapshot`.
#[derive(Parser, Debug)]
pub struct SnapshotArgs {
    #[command(subcommand)]
    command: Option<SnapshotCommand>,

    /// Project name; defaults to the project the working directory is in.
    #[arg(value_name = "PROJECT")]
    project: Option<String>,

    /// Snapshot name to create (or delete with --cleanup).
    #[arg(long)]
    name: Option<String>,

    /// List existing snapshots instead of creating one.
    #[arg(long)]
    list: bool,

    /// Delete snapshots instead of creating one.
    #[arg(long)]
    cleanup: bool,

    /// With --cleanup: delete every snapshot of the project.
    #[arg(long)]
    all: bool,

    /// Skip confirmation prompts.
    #[arg(long, short = 'y')]
    yes: bool,
}

#[derive(Subcommand, Debug)]
enum SnapshotCommand {
    /// Restore a snapshot into the project's database.
    Restore(RestoreArgs),
}

/// Arguments for `ddev snapshot restore`.
#[derive(Parser, Debug)]
pub struct RestoreArgs {
    /// Snapshot name to restore.
    #[arg(value_name = "NAME")]
    name: Option<String>,

    /// Restore the most recent snapshot instead of naming one.
    #[arg(long)]
    latest: bool,
}

impl RestoreArgs {
    /// Exactly one of NAME or --latest.
    fn selector(&self) -> Result<Selector> {
        match (&self.name, self.latest) {
            (Some(_), true) => Err(anyhow!(DdevError::Usage(
                "specify either a snapshot name or --latest, not both".to_string()
            ))),
            (Some(name), false) => Ok(Selector::Name(name.clone())),
            (None, true) => Ok(Selector::Latest),
            (None, false) => Err(anyhow!(DdevError::Usage(
                "specify a snapshot name or --latest".to_string()
            ))),
        }
    }
}

/// Handles `ddev snapshot` and `ddev snapshot restore`.
pub async fn handle_snapshot(args: SnapshotArgs, out: &Output) -> Result<()> {
    info!("Handling snapshot command...");
    debug!("Snapshot args: {:?}", args);

    // Flag validation precedes project resolution so bad invocations fail
    // fast regardless of the working directory.
    let selector = match &args.command {
        Some(SnapshotCommand::Restore(restore)) => Some(restore.selector()?),
        None => None,
    };

    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let desc = project::locate(&cwd, args.project.as_deref())?;

    match selector {
        Some(selector) => snapshots::restore(&desc, &selector, out).await,
        None if args.list => {
            let listed = snapshots::list(&desc)?;
            if listed.is_empty() {
                out.info(&format!("Project '{}' has no snapshots.", desc.name));
                return Ok(());
            }
            for s in listed {
                out.info_with(
                    &format!("{}  {}  {}", s.meta.name, s.meta.created.to_rfc3339(), s.meta.engine),
                    json!({
                        "name": s.meta.name,
                        "created": s.meta.created,
                        "engine": s.meta.engine,
                    }),
                );
            }
            Ok(())
        }
        None if args.cleanup => cleanup(&desc, &args, out),
        None => {
            snapshots::create(&desc, args.name.clone(), out).await?;
            Ok(())
        }
    }
}

fn cleanup(desc: &project::ProjectDescriptor, args: &SnapshotArgs, out: &Output) -> Result<()> {
    match (&args.name, args.all) {
        (Some(_), true) => Err(anyhow!(DdevError::Usage(
            "specify either --name or --all with --cleanup, not both".to_string()
        ))),
        (Some(name), false) => {
            let prompt = format!("Delete snapshot '{}' of project '{}'?", name, desc.name);
            if !out.confirm(&prompt, args.yes) {
                return Err(anyhow!(DdevError::Precondition(
                    "cleanup aborted by user".to_string()
                )));
            }
            snapshots::delete(desc, name)?;
            out.success(&format!("Deleted snapshot {}", name));
            Ok(())
        }
        (None, _) => {
            // Bare --cleanup deletes everything, like --all.
            let listed = snapshots::list(desc)?;
            if listed.is_empty() {
                out.info(&format!("Project '{}' has no snapshots.", desc.name));
                return Ok(());
            }
            let prompt = format!(
                "Delete all {} snapshots of project '{}'?",
                listed.len(),
                desc.name
            );
            if !out.confirm(&prompt, args.yes) {
                return Err(anyhow!(DdevError::Precondition(
                    "cleanup aborted by user".to_string()
                )));
            }
            for s in listed {
                snapshots::delete(desc, &s.meta.name)?;
                out.success(&format!("Deleted snapshot {}", s.meta.name));
            }
            Ok(())
        }
    }
}
