//! # ddev Global Configuration & State Layout
//!
//! File: cli/src/core/config.rs
//!
//! ## Overview
//!
//! This module owns the per-user global configuration file and the on-disk
//! state layout ddev keeps under the user's config directory:
//!
//! ```text
//! <state root>/
//!   global_config.yaml      # global options
//!   .sync-daemon-data/      # mutagen daemon state directory
//!   projects/               # name -> root registry (one YAML file per project)
//!   ssh-agent.lock          # singleton ensure lock
//! ```
//!
//! Per-project state lives under `<project-root>/.config/` (descriptor,
//! `db_snapshots/<name>/` directories, advisory lock file); that side is
//! handled by `common::project`.
//!
//! ## Architecture
//!
//! - The global config is read lazily; a missing file yields defaults.
//! - Writes go through a whole-file advisory lock plus a temp-file rename,
//!   so concurrent invocations never observe a torn file.
//! - `prepare_environment` normalizes the process environment at startup:
//!   `DDEV_MUTAGEN_DATA_DIRECTORY` is cleared and re-derived from the state
//!   root, `DOCKER_CLI_HINTS` is forced off, `DOCKER_HOST` is honoured if
//!   already set.
//!
use crate::core::error::{DdevError, Result};
use anyhow::{anyhow, Context};
use directories::ProjectDirs;
use fs4::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// Environment variable: disables interactive prompts when set.
pub const ENV_NONINTERACTIVE: &str = "DDEV_NONINTERACTIVE";
/// Environment variable: raises log verbosity to debug when set.
pub const ENV_DEBUG: &str = "DDEV_DEBUG";
/// Environment variable: mutagen data directory. Computed by the tool,
/// cleared at startup, re-derived from the state root.
pub const ENV_MUTAGEN_DATA_DIR: &str = "DDEV_MUTAGEN_DATA_DIRECTORY";
/// Environment variable: overrides the state root. Used by tests.
pub const ENV_GLOBAL_DIR: &str = "DDEV_GLOBAL_DIR";

const GLOBAL_CONFIG_FILENAME: &str = "global_config.yaml";
const SYNC_DAEMON_DATA_DIR: &str = ".sync-daemon-data";
const PROJECT_REGISTRY_DIR: &str = "projects";

/// The global configuration, loaded from `global_config.yaml`.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields, default)]
pub struct GlobalConfig {
    /// Service names omitted by default for every project (a project's own
    /// descriptor can extend this set).
    pub omit_containers: BTreeSet<String>,
    /// Whether new projects default to mutagen file sync.
    pub mutagen_enabled_default: bool,
    /// Image for the web service container.
    pub web_image: String,
    /// Image for the optional database-admin container.
    pub dba_image: String,
    /// Image for the shared SSH-agent container.
    pub ssh_agent_image: String,
    /// Image for the per-project sync-sidecar container.
    pub sync_sidecar_image: String,
    /// Deadline in seconds for a blocking sync flush.
    pub flush_deadline_secs: u64,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        GlobalConfig {
            omit_containers: BTreeSet::new(),
            mutagen_enabled_default: false,
            web_image: default_web_image(),
            dba_image: default_dba_image(),
            ssh_agent_image: default_ssh_agent_image(),
            sync_sidecar_image: default_sync_sidecar_image(),
            flush_deadline_secs: 120,
        }
    }
}

fn default_web_image() -> String {
    "ddev/ddev-webserver:latest".to_string()
}
fn default_dba_image() -> String {
    "phpmyadmin:5".to_string()
}
fn default_ssh_agent_image() -> String {
    "ddev/ddev-ssh-agent:latest".to_string()
}
fn default_sync_sidecar_image() -> String {
    "busybox:stable".to_string()
}

/// Resolves the per-user state root. `DDEV_GLOBAL_DIR` wins when set
/// (tests rely on this); otherwise the platform config directory is used.
/// The directory is created on first use.
pub fn state_root() -> Result<PathBuf> {
    let root = match std::env::var_os(ENV_GLOBAL_DIR) {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => ProjectDirs::from("com", "ddev", "ddev")
            .ok_or_else(|| {
                anyhow!(DdevError::Config(
                    "could not determine user config directory".to_string()
                ))
            })?
            .config_dir()
            .to_path_buf(),
    };
    fs::create_dir_all(&root)
        .with_context(|| format!("Failed to create state root {}", root.display()))?;
    Ok(root)
}

/// Path of the global config file.
pub fn global_config_path() -> Result<PathBuf> {
    Ok(state_root()?.join(GLOBAL_CONFIG_FILENAME))
}

/// The mutagen daemon's state directory, shared by every invocation.
pub fn sync_daemon_data_dir() -> Result<PathBuf> {
    let dir = state_root()?.join(SYNC_DAEMON_DATA_DIR);
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    Ok(dir)
}

/// The name -> root project registry directory.
pub fn project_registry_dir() -> Result<PathBuf> {
    let dir = state_root()?.join(PROJECT_REGISTRY_DIR);
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    Ok(dir)
}

/// Loads the global config. A missing file is not an error: readers get
/// the defaults (empty config).
pub fn load_global_config() -> Result<GlobalConfig> {
    let path = global_config_path()?;
    if !path.exists() {
        debug!("No global config at {}, using defaults", path.display());
        return Ok(GlobalConfig::default());
    }
    let raw = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let cfg: GlobalConfig = serde_yaml::from_str(&raw)
        .map_err(|e| anyhow!(DdevError::Config(format!("{}: {}", path.display(), e))))?;
    Ok(cfg)
}

/// Writes the global config back under a whole-file advisory lock, via a
/// temp file and rename so readers never see a partial write.
pub fn save_global_config(cfg: &GlobalConfig) -> Result<()> {
    let path = global_config_path()?;
    let lock_path = path.with_extension("yaml.lock");
    let lock = fs::OpenOptions::new()
        .create(true)
        .write(true)
        .open(&lock_path)
        .with_context(|| format!("Failed to open lock file {}", lock_path.display()))?;
    lock.lock_exclusive()
        .with_context(|| format!("Failed to lock {}", lock_path.display()))?;

    let result = (|| -> Result<()> {
        let tmp = path.with_extension("yaml.tmp");
        let raw = serde_yaml::to_string(cfg)
            .map_err(|e| anyhow!(DdevError::Config(format!("serializing global config: {}", e))))?;
        fs::write(&tmp, raw)
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;
        Ok(())
    })();

    let _ = fs4::FileExt::unlock(&lock);
    result
}

/// Normalizes the process environment at startup.
///
/// - `DDEV_MUTAGEN_DATA_DIRECTORY` must be identical across all invocations,
///   so any inherited value is discarded and the variable is re-derived from
///   the state root.
/// - `DOCKER_CLI_HINTS` is set to `false` to silence engine CLI hints in
///   subprocesses.
/// - `DOCKER_HOST` is left untouched; the Docker adapter honours it.
/// - On first run the global config file is written out with its defaults.
pub fn prepare_environment() -> Result<()> {
    std::env::remove_var(ENV_MUTAGEN_DATA_DIR);
    let daemon_dir = sync_daemon_data_dir()?;
    std::env::set_var(ENV_MUTAGEN_DATA_DIR, &daemon_dir);
    std::env::set_var("DOCKER_CLI_HINTS", "false");
    // First run: materialize the defaults so users have a file to edit.
    if !global_config_path()?.exists() {
        save_global_config(&GlobalConfig::default())?;
    }
    debug!(
        "Environment prepared: {}={}",
        ENV_MUTAGEN_DATA_DIR,
        daemon_dir.display()
    );
    Ok(())
}

/// True when prompts are disabled (`DDEV_NONINTERACTIVE` set and non-empty).
pub fn noninteractive() -> bool {
    std::env::var_os(ENV_NONINTERACTIVE).is_some_and(|v| !v.is_empty())
}
