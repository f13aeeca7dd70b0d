//! # ddev Shared Service Layer
//!
//! File: cli/src/common/mod.rs
//!
//! ## Overview
//!
//! Shared functionality used by the command handlers:
//!
//! - `docker`: the container-engine adapter.
//! - `project`: descriptors, registry, locator, container naming.
//! - `mutagen`: the sync-daemon supervisor and per-project sessions.
//! - `sshauth`: the shared SSH-agent supervisor.
//! - `snapshots`: database snapshot create/list/restore/delete.
//! - `workflow`: the lifecycle orchestrator composing the above.
//! - `output`: the single human/JSON rendering sink.
//! - `lock`: advisory file locks.
//! - `backoff`: the bounded probe backoff schedule.
//! - `interrupt`: signal handling and critical sections.
//!
pub mod backoff;
pub mod docker;
pub mod interrupt;
pub mod lock;
pub mod mutagen;
pub mod output;
pub mod project;
pub mod snapshots;
pub mod sshauth;
pub mod workflow;
