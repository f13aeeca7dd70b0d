//! # ddev List Command
//!
//! File: cli/src/commands/list.rs
//!
//! `ddev list`: enumerates every registered project with its current
//! status as observed from the container engine.
//!
use crate::common::output::Output;
use crate::common::{project, workflow};
use crate::core::error::Result;
use clap::Parser;
use serde_json::json;
use tracing::info;

/// Arguments for `ddev list`.
#[derive(Parser, Debug)]
pub struct ListArgs {}

/// Handles `ddev list`.
pub async fn handle_list(_args: ListArgs, out: &Output) -> Result<()> {
    info!("Handling list command...");

    let projects = project::enumerate()?;
    if projects.is_empty() {
        out.info("No projects registered. Run `ddev start` inside a project directory.");
        return Ok(());
    }
    for desc in projects {
        let status = workflow::status(&desc).await?;
        out.info_with(
            &format!(
                "{}  {}  {}",
                desc.name,
                status,
                desc.approot.display()
            ),
            json!({
                "project": desc.name,
                "status": status.to_string(),
                "approot": desc.approot,
            }),
        );
    }
    Ok(())
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_takes_no_positionals() {
        assert!(ListArgs::try_parse_from(["list"]).is_ok());
        assert!(ListArgs::try_parse_from(["list", "demo"]).is_err());
    }
}
