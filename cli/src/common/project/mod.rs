//! # ddev Project Model & Locator
//!
//! File: cli/src/common/project/mod.rs
//!
//! ## Overview
//!
//! The persisted per-project record (the *descriptor*), the name → root
//! registry, and the locator that resolves "which project am I operating
//! on" from the working directory or an explicit name.
//!
//! ## Architecture
//!
//! - A project is identified by a lowercase DNS-label name. Its descriptor
//!   lives at `<root>/.config/config.yaml`; the presence of that file is
//!   the marker the locator walks up the directory tree looking for.
//! - The registry under `<state root>/projects/` holds one small YAML file
//!   per project (`{ name, approot }`) so `locate(name)` and `enumerate()`
//!   work from anywhere. Name and root are in 1-1 correspondence; two
//!   registry entries sharing a root is an invariant violation.
//! - Container handles are (project, role) pairs composed into engine
//!   names here, in exactly one place.
//!
//! The locator operations are read-only. Registration changes go through
//! the registry advisory lock.
//!
use crate::common::lock::Lock;
use crate::core::config;
use crate::core::error::{DdevError, Result};
use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Marker directory under the project root holding all per-project state.
pub const PROJECT_CONFIG_DIR: &str = ".config";
/// Descriptor filename inside the config dir.
pub const DESCRIPTOR_FILENAME: &str = "config.yaml";
/// Snapshot directory name inside the config dir.
pub const SNAPSHOTS_DIR: &str = "db_snapshots";
/// Per-project advisory lock filename.
pub const PROJECT_LOCK_FILENAME: &str = ".lock";

/// Name of the shared SSH-agent container (one per host user).
pub const SSH_AGENT_CONTAINER: &str = "ddev-ssh-agent";
/// Network the shared auxiliary containers attach to.
pub const SHARED_NETWORK: &str = "ddev_default";

/// Roles a project container can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Web,
    Db,
    Dba,
    SshAgent,
    SyncSidecar,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Web => "web",
            Role::Db => "db",
            Role::Dba => "dba",
            Role::SshAgent => "ssh-agent",
            Role::SyncSidecar => "sync-sidecar",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Composes the engine name for a (project, role) container handle.
/// The SSH agent is host-user scoped and has no project component.
pub fn container_name(project: &str, role: Role) -> String {
    match role {
        Role::SshAgent => SSH_AGENT_CONTAINER.to_string(),
        _ => format!("ddev-{}-{}", project, role.as_str()),
    }
}

/// Per-project network name.
pub fn network_name(project: &str) -> String {
    format!("ddev-{}", project)
}

/// Named volume holding the database data directory.
pub fn db_volume(project: &str) -> String {
    format!("ddev-{}-db", project)
}

/// Named volume the sync sidecar exposes to the daemon.
pub fn sync_volume(project: &str) -> String {
    format!("ddev-{}-sync", project)
}

/// Observable state of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectStatus {
    NotFound,
    Stopped,
    Starting,
    Running,
    Paused,
    Unhealthy,
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProjectStatus::NotFound => "not found",
            ProjectStatus::Stopped => "stopped",
            ProjectStatus::Starting => "starting",
            ProjectStatus::Running => "running",
            ProjectStatus::Paused => "paused",
            ProjectStatus::Unhealthy => "unhealthy",
        };
        f.write_str(s)
    }
}

/// Declared database service of a project.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DatabaseDesc {
    /// Engine name, e.g. `mariadb`, `mysql`, `postgres`.
    pub engine: String,
    /// Engine version tag, e.g. `10.11`.
    pub version: String,
}

impl DatabaseDesc {
    /// Image reference for the engine.
    pub fn image(&self) -> String {
        format!("{}:{}", self.engine, self.version)
    }

    /// Engine identity string recorded in snapshot metadata and compared
    /// on restore.
    pub fn identity(&self) -> String {
        format!("{}:{}", self.engine, self.version)
    }
}

impl Default for DatabaseDesc {
    fn default() -> Self {
        DatabaseDesc {
            engine: "mariadb".to_string(),
            version: "10.11".to_string(),
        }
    }
}

/// The persisted per-project record.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct ProjectDescriptor {
    /// Project name: a lowercase DNS label, unique per host user.
    pub name: String,
    /// Declared database service.
    #[serde(default)]
    pub database: DatabaseDesc,
    /// Service names this project skips (e.g. `dba`, `ssh-agent`).
    #[serde(default)]
    pub omit_containers: BTreeSet<String>,
    /// Mutagen file sync for this project; absent falls back to the
    /// global default.
    #[serde(default)]
    pub mutagen: Option<bool>,
    /// Absolute filesystem root. Derived from the descriptor location,
    /// never persisted inside the file itself.
    #[serde(skip)]
    pub approot: PathBuf,
}

impl ProjectDescriptor {
    /// Loads the descriptor for the project rooted at `approot`.
    pub fn load(approot: &Path) -> Result<ProjectDescriptor> {
        let path = approot.join(PROJECT_CONFIG_DIR).join(DESCRIPTOR_FILENAME);
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read descriptor {}", path.display()))?;
        let mut desc: ProjectDescriptor = serde_yaml::from_str(&raw)
            .map_err(|e| anyhow!(DdevError::Config(format!("{}: {}", path.display(), e))))?;
        validate_name(&desc.name)?;
        desc.approot = approot
            .canonicalize()
            .with_context(|| format!("Failed to canonicalize {}", approot.display()))?;
        Ok(desc)
    }

    /// Writes the descriptor under `approot`, creating the config dir.
    pub fn save(&self) -> Result<()> {
        let dir = self.config_dir();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        let path = dir.join(DESCRIPTOR_FILENAME);
        let raw = serde_yaml::to_string(self)
            .map_err(|e| anyhow!(DdevError::Config(format!("serializing descriptor: {}", e))))?;
        fs::write(&path, raw)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn config_dir(&self) -> PathBuf {
        self.approot.join(PROJECT_CONFIG_DIR)
    }

    pub fn snapshots_dir(&self) -> PathBuf {
        self.config_dir().join(SNAPSHOTS_DIR)
    }

    pub fn lock_path(&self) -> PathBuf {
        self.config_dir().join(PROJECT_LOCK_FILENAME)
    }

    /// Whether mutagen sync is enabled, considering the global default.
    pub fn mutagen_enabled(&self, global: &config::GlobalConfig) -> bool {
        self.mutagen.unwrap_or(global.mutagen_enabled_default)
    }

    /// Whether `role` is omitted for this project (project set union the
    /// global set).
    pub fn omits(&self, role: Role, global: &config::GlobalConfig) -> bool {
        let name = role.as_str();
        self.omit_containers.contains(name) || global.omit_containers.contains(name)
    }
}

/// Validates a project name: a lowercase DNS label (letters, digits,
/// hyphens; starts and ends alphanumeric; at most 63 chars).
pub fn validate_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name.len() <= 63
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !name.starts_with('-')
        && !name.ends_with('-');
    if valid {
        Ok(())
    } else {
        Err(anyhow!(DdevError::Config(format!(
            "invalid project name '{}': must be a lowercase DNS label",
            name
        ))))
    }
}

// --- Registry ---

/// One registry entry: the name → root mapping.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
struct RegistryEntry {
    name: String,
    approot: PathBuf,
}

fn registry_lock_path() -> Result<PathBuf> {
    Ok(config::project_registry_dir()?.join(".lock"))
}

fn entry_path(name: &str) -> Result<PathBuf> {
    Ok(config::project_registry_dir()?.join(format!("{}.yaml", name)))
}

/// Registers the project in the name → root registry, enforcing the 1-1
/// name↔root correspondence.
pub fn register(desc: &ProjectDescriptor) -> Result<()> {
    let _lock = Lock::acquire(&registry_lock_path()?)?;
    for other in read_registry()? {
        if other.name != desc.name && other.approot == desc.approot {
            return Err(anyhow!(DdevError::Fatal(format!(
                "projects '{}' and '{}' share the root {}",
                other.name,
                desc.name,
                desc.approot.display()
            ))));
        }
        if other.name == desc.name && other.approot != desc.approot {
            return Err(anyhow!(DdevError::Fatal(format!(
                "project '{}' is already registered at {}",
                desc.name,
                other.approot.display()
            ))));
        }
    }
    let entry = RegistryEntry {
        name: desc.name.clone(),
        approot: desc.approot.clone(),
    };
    let raw = serde_yaml::to_string(&entry)
        .map_err(|e| anyhow!(DdevError::Config(format!("serializing registry entry: {}", e))))?;
    let path = entry_path(&desc.name)?;
    fs::write(&path, raw)
        .with_context(|| format!("Failed to write registry entry {}", path.display()))?;
    debug!("Registered project '{}' at {}", desc.name, desc.approot.display());
    Ok(())
}

/// Removes the project from the registry. Missing entries are fine.
pub fn deregister(name: &str) -> Result<()> {
    let _lock = Lock::acquire(&registry_lock_path()?)?;
    let path = entry_path(name)?;
    match fs::remove_file(&path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(anyhow::Error::new(e)
            .context(format!("Failed to remove registry entry {}", path.display()))),
    }
}

fn read_registry() -> Result<Vec<RegistryEntry>> {
    let dir = config::project_registry_dir()?;
    let mut entries = Vec::new();
    for item in fs::read_dir(&dir)
        .with_context(|| format!("Failed to read registry {}", dir.display()))?
    {
        let path = item?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("yaml") {
            continue;
        }
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        match serde_yaml::from_str::<RegistryEntry>(&raw) {
            Ok(entry) => entries.push(entry),
            Err(e) => warn!("Skipping malformed registry entry {}: {}", path.display(), e),
        }
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

// --- Locator ---

/// Resolves the active project: an explicit name looks the root up in the
/// registry; otherwise the directory tree is walked up from `cwd` until a
/// descriptor marker is found.
pub fn locate(cwd: &Path, explicit: Option<&str>) -> Result<ProjectDescriptor> {
    if let Some(name) = explicit {
        validate_name(name)?;
        let entry = read_registry()?
            .into_iter()
            .find(|e| e.name == name)
            .ok_or_else(|| {
                anyhow!(DdevError::not_found(
                    "project",
                    name,
                    "run `ddev start` in its directory first"
                ))
            })?;
        return ProjectDescriptor::load(&entry.approot);
    }

    let mut dir: &Path = cwd;
    loop {
        let marker = dir.join(PROJECT_CONFIG_DIR).join(DESCRIPTOR_FILENAME);
        if marker.is_file() {
            debug!("Found project descriptor at {}", marker.display());
            return ProjectDescriptor::load(dir);
        }
        match dir.parent() {
            Some(parent) => dir = parent,
            None => {
                return Err(anyhow!(DdevError::not_found(
                    "project",
                    cwd.display().to_string(),
                    "no project descriptor in this directory or any parent"
                )))
            }
        }
    }
}

/// Enumerates all registered projects, sorted by name. Registry entries
/// whose descriptor has gone missing are skipped with a warning; duplicate
/// roots are an invariant violation.
pub fn enumerate() -> Result<Vec<ProjectDescriptor>> {
    let entries = read_registry()?;
    let mut seen_roots: BTreeSet<PathBuf> = BTreeSet::new();
    let mut projects = Vec::new();
    for entry in entries {
        if !seen_roots.insert(entry.approot.clone()) {
            return Err(anyhow!(DdevError::Fatal(format!(
                "two registered projects share the root {}",
                entry.approot.display()
            ))));
        }
        match ProjectDescriptor::load(&entry.approot) {
            Ok(desc) => projects.push(desc),
            Err(e) => warn!(
                "Skipping project '{}' with unreadable descriptor: {}",
                entry.name, e
            ),
        }
    }
    Ok(projects)
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_descriptor(root: &Path, name: &str) {
        let dir = root.join(PROJECT_CONFIG_DIR);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(DESCRIPTOR_FILENAME),
            format!("name: {}\ndatabase:\n  engine: mariadb\n  version: \"10.11\"\n", name),
        )
        .unwrap();
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("demo").is_ok());
        assert!(validate_name("my-site2").is_ok());
        assert!(validate_name("Demo").is_err());
        assert!(validate_name("-demo").is_err());
        assert!(validate_name("demo-").is_err());
        assert!(validate_name("").is_err());
        assert!(validate_name("a.b").is_err());
    }

    #[test]
    fn test_container_name_composition() {
        assert_eq!(container_name("demo", Role::Web), "ddev-demo-web");
        assert_eq!(container_name("demo", Role::Db), "ddev-demo-db");
        assert_eq!(container_name("demo", Role::SyncSidecar), "ddev-demo-sync-sidecar");
        // The agent is host-user scoped: one per user, shared by projects.
        assert_eq!(container_name("demo", Role::SshAgent), "ddev-ssh-agent");
        assert_eq!(container_name("other", Role::SshAgent), "ddev-ssh-agent");
    }

    #[test]
    fn test_descriptor_round_trip() {
        let root = tempdir().unwrap();
        write_descriptor(root.path(), "demo");
        let desc = ProjectDescriptor::load(root.path()).expect("load");
        assert_eq!(desc.name, "demo");
        assert_eq!(desc.database.image(), "mariadb:10.11");
        assert!(desc.mutagen.is_none());
        assert_eq!(desc.approot, root.path().canonicalize().unwrap());
    }

    #[test]
    fn test_locate_walks_up_from_subdirectory() {
        let root = tempdir().unwrap();
        write_descriptor(root.path(), "demo");
        let nested = root.path().join("web/sites/default");
        fs::create_dir_all(&nested).unwrap();
        let desc = locate(&nested, None).expect("locate from nested dir");
        assert_eq!(desc.name, "demo");
    }

    #[test]
    fn test_locate_not_found_outside_any_project() {
        let dir = tempdir().unwrap();
        let err = locate(dir.path(), None).unwrap_err();
        let ddev = err.downcast_ref::<DdevError>().expect("typed");
        assert!(matches!(ddev, DdevError::NotFound { .. }));
    }

    #[test]
    fn test_mutagen_enabled_falls_back_to_global_default() {
        let root = tempdir().unwrap();
        write_descriptor(root.path(), "demo");
        let desc = ProjectDescriptor::load(root.path()).unwrap();

        let mut global = config::GlobalConfig::default();
        assert!(!desc.mutagen_enabled(&global));
        global.mutagen_enabled_default = true;
        assert!(desc.mutagen_enabled(&global));

        let mut pinned = desc.clone();
        pinned.mutagen = Some(false);
        assert!(!pinned.mutagen_enabled(&global));
    }

    #[test]
    fn test_omits_unions_global_and_project_sets() {
        let root = tempdir().unwrap();
        write_descriptor(root.path(), "demo");
        let mut desc = ProjectDescriptor::load(root.path()).unwrap();
        let mut global = config::GlobalConfig::default();

        assert!(!desc.omits(Role::Dba, &global));
        desc.omit_containers.insert("dba".to_string());
        assert!(desc.omits(Role::Dba, &global));

        global.omit_containers.insert("ssh-agent".to_string());
        assert!(desc.omits(Role::SshAgent, &global));
    }
}
