//! # ddev Main Entry Point
//!
//! File: cli/src/main.rs
//!
//! ## Overview
//!
//! This file serves as the main entry point for the ddev CLI application.
//! It handles:
//! - Command-line argument parsing using Clap
//! - Setting up the logging system based on verbosity flags and `DDEV_DEBUG`
//! - Preparing the process environment (sync-daemon data directory pinning)
//! - Routing execution to appropriate command handlers
//! - Racing each command against SIGINT/SIGTERM and mapping the outcome to
//!   a process exit code
//!
//! ## Architecture
//!
//! The application follows a modular command structure:
//! - Each top-level command (`start`, `snapshot`, etc.) is a variant in the
//!   `Commands` enum, mapped to a handler in its `commands::` module
//! - All errors are propagated to this level; the deepest typed error in
//!   the chain decides the exit code (2 usage, 130/143 signals, 1 else)
//! - A signal received mid-command cancels it at its next await point,
//!   unless a critical section (snapshot restore past its point of no
//!   return) is active, in which case exit waits for the section to end
//!
//! ## Examples
//!
//! Basic ddev usage:
//!
//! ```bash
//! # Start the project in the current directory
//! ddev start
//!
//! # Machine-readable output with increased verbosity
//! ddev -j -vv snapshot --list
//! ```
//!
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod commands; // One module per CLI verb group.
mod common; // Shared services (docker, mutagen, sshauth, snapshots, workflow).
mod core; // Core infrastructure (errors, config, version constraints).

use common::interrupt;
use common::output::Output;

/// Defines the top-level command-line arguments structure using Clap's derive macros.
#[derive(Parser, Debug)]
#[command(
    name = "ddev",
    about = "🦀 ddev ⚙️: Per-Project Containerized Web Development Environments",
    long_about = "Manage per-project containerized web development environments:\n\
                  lifecycle, file sync, SSH agent, and database snapshots.",
    propagate_version = true,
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Emit newline-delimited JSON instead of human-readable output.
    #[arg(short = 'j', long = "json", global = true)]
    json: bool,
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    /// Short-only so subcommands keep `--verbose` for their own flags.
    #[arg(short = 'v', action = clap::ArgAction::Count, global = true)]
    verbosity: u8,
}

/// Enum defining all available top-level commands.
#[derive(Parser, Debug)]
enum Commands {
    Start(commands::start::StartArgs),
    Stop(commands::stop::StopArgs),
    Restart(commands::restart::RestartArgs),
    Delete(commands::delete::DeleteArgs),
    List(commands::list::ListArgs),
    Snapshot(commands::snapshot::SnapshotArgs),
    Mutagen(commands::mutagen::MutagenArgs),
    Auth(commands::auth::AuthArgs),
    Debug(commands::debug::DebugArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // DDEV_DEBUG floors the log level at debug regardless of -v count.
    let debug_env = std::env::var_os(core::config::ENV_DEBUG).is_some_and(|v| !v.is_empty());
    let log_level = match (cli.verbosity, debug_env) {
        (0, false) => "warn",
        (1, false) => "info",
        (0..=2, true) | (2, _) => "debug",
        _ => "trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    tracing::debug!("Parsed CLI arguments: {:?}", cli);

    let out = Output::new(cli.json);
    if let Err(e) = core::config::prepare_environment() {
        out.failure(&format!("Error: {:#}", e));
        std::process::exit(core::error::exit_code_for(&e));
    }

    // `mutagen monitor` and `mutagen logs` stream until Ctrl-C and own the
    // cleanup that must follow it (kill the foreground child, re-ensure
    // the shared daemon), so their signal handling stays internal and a
    // Ctrl-C exit is a clean exit 0, not 130.
    let owns_interrupt = match &cli.command {
        Commands::Mutagen(args) => args.handles_interrupt(),
        _ => false,
    };

    let command = async {
        match cli.command {
            Commands::Start(args) => commands::start::handle_start(args, &out).await,
            Commands::Stop(args) => commands::stop::handle_stop(args, &out).await,
            Commands::Restart(args) => commands::restart::handle_restart(args, &out).await,
            Commands::Delete(args) => commands::delete::handle_delete(args, &out).await,
            Commands::List(args) => commands::list::handle_list(args, &out).await,
            Commands::Snapshot(args) => commands::snapshot::handle_snapshot(args, &out).await,
            Commands::Mutagen(args) => commands::mutagen::handle_mutagen(args, &out).await,
            Commands::Auth(args) => commands::auth::handle_auth(args, &out).await,
            Commands::Debug(args) => commands::debug::handle_debug(args, &out).await,
        }
    };

    let render = |result: core::error::Result<()>| match result {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!("Command execution failed: {:?}", e);
            out.failure(&format!("Error: {:#}", e));
            core::error::exit_code_for(&e)
        }
    };

    let exit_code = if owns_interrupt {
        render(command.await)
    } else {
        tokio::select! {
            result = command => render(result),
            signal = interrupt::shutdown_signal() => {
                out.warning(&format!("Received {}, shutting down.", signal.name()));
                signal.exit_code()
            }
        }
    };
    std::process::exit(exit_code);
}
