//! # ddev Auth Commands
//!
//! File: cli/src/commands/auth.rs
//!
//! `ddev auth ssh [--ssh-key-path DIR]`: loads the user's SSH private
//! keys into the shared agent container so in-container processes can
//! reach private upstreams. The key directory defaults to `~/.ssh`.
//!
use crate::common::output::Output;
use crate::common::sshauth;
use crate::core::error::{DdevError, Result};
use anyhow::anyhow;
use clap::{Parser, Subcommand};
use tracing::{debug, info};

/// Arguments for `ddev auth`.
#[derive(Parser, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    command: AuthCommand,
}

#[derive(Subcommand, Debug)]
enum AuthCommand {
    /// Add SSH private keys to the shared agent container.
    Ssh(SshArgs),
}

#[derive(Parser, Debug)]
struct SshArgs {
    /// Directory containing the private keys to add.
    #[arg(long, value_name = "DIR")]
    ssh_key_path: Option<String>,
}

/// Handles the `ddev auth` subcommands.
pub async fn handle_auth(args: AuthArgs, out: &Output) -> Result<()> {
    info!("Handling auth command...");
    debug!("Auth args: {:?}", args);

    match args.command {
        AuthCommand::Ssh(ssh) => {
            let key_dir = match ssh.ssh_key_path {
                Some(dir) => dir,
                None => {
                    let home = dirs::home_dir().ok_or_else(|| {
                        anyhow!(DdevError::Fatal(
                            "could not determine the home directory".to_string()
                        ))
                    })?;
                    home.join(".ssh").display().to_string()
                }
            };
            sshauth::add_keys(&key_dir, out).await
        }
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_ssh_parsing() {
        let args =
            AuthArgs::try_parse_from(["auth", "ssh", "--ssh-key-path", "/tmp/keys"]).unwrap();
        match args.command {
            AuthCommand::Ssh(ssh) => {
                assert_eq!(ssh.ssh_key_path.as_deref(), Some("/tmp/keys"));
            }
        }
        assert!(AuthArgs::try_parse_from(["auth", "ssh"]).is_ok());
        assert!(AuthArgs::try_parse_from(["auth"]).is_err());
        assert!(AuthArgs::try_parse_from(["auth", "ssh", "extra"]).is_err());
    }
}
