//! # ddev Command Handlers
//!
//! File: cli/src/commands/mod.rs
//!
//! ## Overview
//!
//! One module per CLI verb group. Every handler follows the same shape:
//! parse flags (clap rejects extra positionals uniformly), resolve the
//! active project through the locator unless the command is project-free,
//! invoke the orchestrator or a supervisor, and render results through the
//! output sink — never directly to stdout.
//!
pub mod auth;
pub mod debug;
pub mod delete;
pub mod list;
pub mod mutagen;
pub mod restart;
pub mod snapshot;
pub mod start;
pub mod stop;
