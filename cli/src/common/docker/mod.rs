//! # ddev Docker Adapter
//!
//! File: cli/src/common/docker/mod.rs
//!
//! ## Overview
//!
//! The container-engine adapter: everything that talks to the Docker
//! daemon lives under this module. Split by concern:
//!
//! - `connect`: daemon connection (honours `DOCKER_HOST`).
//! - `state`: read-only queries (exists, running, health, project listing).
//! - `lifecycle`: start/stop/remove with idempotent semantics.
//! - `operations`: container creation from a `RunSpec`; exec with capture.
//! - `volumes`: project-owned volumes and networks.
//!
//! Higher layers (supervisors, snapshot manager, orchestrator) compose
//! these; nothing above this module imports bollard types directly except
//! for the inspect responses it passes through.
//!
pub mod connect;
pub mod lifecycle;
pub mod operations;
pub mod state;
pub mod volumes;
