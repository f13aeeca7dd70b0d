//! # ddev Core Infrastructure
//!
//! File: cli/src/core/mod.rs
//!
//! ## Overview
//!
//! Declares the core infrastructure modules: error taxonomy, global
//! configuration and state layout, and version-constraint evaluation.
//! These depend on nothing else in the crate; both `commands` and `common`
//! build on them.
//!
pub mod config;
pub mod error;
pub mod version;
