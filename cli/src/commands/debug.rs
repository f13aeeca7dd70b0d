//! # ddev Debug Commands
//!
//! File: cli/src/commands/debug.rs
//!
//! `ddev debug version-constraint CONSTRAINT`: evaluates a semver
//! constraint against the running binary. Prints `true` and exits 0 when
//! the constraint is met; exits 1 with a stable message otherwise.
//! Scripts gate on this before invoking version-sensitive behavior.
//!
use crate::common::output::Output;
use crate::core::error::{DdevError, Result};
use crate::core::version;
use anyhow::anyhow;
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{debug, info};

/// Arguments for `ddev debug`.
#[derive(Parser, Debug)]
pub struct DebugArgs {
    #[command(subcommand)]
    command: DebugCommand,
}

#[derive(Subcommand, Debug)]
enum DebugCommand {
    /// Check a semver constraint against this binary's version.
    VersionConstraint(VersionConstraintArgs),
}

#[derive(Parser, Debug)]
struct VersionConstraintArgs {
    /// Constraint expression, e.g. ">= 1.2.0".
    #[arg(value_name = "CONSTRAINT")]
    constraint: String,
}

/// Handles the `ddev debug` subcommands.
pub async fn handle_debug(args: DebugArgs, out: &Output) -> Result<()> {
    info!("Handling debug command...");
    debug!("Debug args: {:?}", args);

    match args.command {
        DebugCommand::VersionConstraint(vc) => {
            let current = version::binary_version();
            if version::check_constraint(&vc.constraint, &current)? {
                out.info_with(
                    "true",
                    json!({ "constraint": vc.constraint, "version": current.to_string() }),
                );
                Ok(())
            } else {
                Err(anyhow!(DdevError::Precondition(format!(
                    "version {} doesn't meet the constraint '{}'",
                    current, vc.constraint
                ))))
            }
        }
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_constraint_parsing() {
        let args =
            DebugArgs::try_parse_from(["debug", "version-constraint", ">= 1.0.0"]).unwrap();
        match args.command {
            DebugCommand::VersionConstraint(vc) => {
                assert_eq!(vc.constraint, ">= 1.0.0");
            }
        }
        // The constraint is required and must be exactly one argument.
        assert!(DebugArgs::try_parse_from(["debug", "version-constraint"]).is_err());
        assert!(
            DebugArgs::try_parse_from(["debug", "version-constraint", "a", "b"]).is_err()
        );
    }
}
