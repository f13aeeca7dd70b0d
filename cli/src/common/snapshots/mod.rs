//! # ddev Snapshot Manager
//!
//! File: cli/src/common/snapshots/mod.rs
//!
//! ## Overview
//!
//! Named database snapshots: create, list, restore (including the
//! `--latest` sentinel), delete. A snapshot is a directory under
//! `<root>/.config/db_snapshots/<name>/` holding the dump, a YAML
//! metadata file tagging the database engine and version, and a
//! `.complete` marker written last — the directory is immutable once the
//! marker exists.
//!
//! ## Architecture
//!
//! Restore is the crash-consistency-critical path, performed in the order:
//! flush (when sync is enabled) → stop db → recreate db in restore mode
//! with the snapshot mounted read-only → bounded-retry wait for the
//! restore-complete signal → recreate db in normal mode. Once the db
//! container enters restore mode the operation holds a critical-section
//! guard and can no longer be interrupted by signals; before that point it
//! is freely cancellable. Any failing step leaves the project unhealthy
//! and the error names the step.
//!
use crate::common::backoff;
use crate::common::docker::{lifecycle, operations, state};
use crate::common::interrupt::CriticalSection;
use crate::common::lock::Lock;
use crate::common::mutagen;
use crate::common::output::Output;
use crate::common::project::{self, ProjectDescriptor, Role};
use crate::common::workflow::services;
use crate::core::config;
use crate::core::error::{DdevError, Result};
use anyhow::{anyhow, Context};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, warn};

const META_FILENAME: &str = "snapshot.yaml";
const COMPLETE_MARKER: &str = ".complete";
/// File the db entrypoint creates inside the container when a restore
/// has finished.
const RESTORE_DONE_PROBE: &str = "/tmp/ddev-restore-complete";

/// Snapshot selector: an explicit name or the latest by creation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Name(String),
    Latest,
}

/// Persisted snapshot metadata.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct SnapshotMeta {
    pub name: String,
    pub project: String,
    /// Engine identity (`engine:version`) the snapshot was taken from;
    /// restore requires a compatible running database.
    pub engine: String,
    pub created: DateTime<Utc>,
}

/// A snapshot on disk.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub meta: SnapshotMeta,
    pub dir: PathBuf,
}

impl Snapshot {
    fn load(dir: PathBuf) -> Result<Snapshot> {
        let meta_path = dir.join(META_FILENAME);
        let raw = fs::read_to_string(&meta_path)
            .with_context(|| format!("Failed to read {}", meta_path.display()))?;
        let meta: SnapshotMeta = serde_yaml::from_str(&raw)
            .map_err(|e| anyhow!(DdevError::Config(format!("{}: {}", meta_path.display(), e))))?;
        Ok(Snapshot { meta, dir })
    }

    fn is_complete(&self) -> bool {
        self.dir.join(COMPLETE_MARKER).is_file()
    }
}

/// Default snapshot name: `{project}_{ISO8601 basic timestamp}`.
fn default_name(project: &str, now: DateTime<Utc>) -> String {
    format!("{}_{}", project, now.format("%Y%m%dT%H%M%S"))
}

/// A snapshot name doubles as a directory name under `db_snapshots/`, so
/// it must never resolve outside that directory: letters, digits, `.`,
/// `_` and `-` only, with no leading dot.
fn validate_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if valid {
        Ok(())
    } else {
        Err(anyhow!(DdevError::Precondition(format!(
            "snapshot name '{}' is invalid; use letters, digits, '.', '_' and '-', \
             not starting with a dot",
            name
        ))))
    }
}

fn dump_command(engine: &str, target: &str) -> Vec<String> {
    let shell = match engine {
        "postgres" => format!("pg_dumpall -U db > {}", target),
        _ => format!("mysqldump --all-databases -uroot -proot > {}", target),
    };
    vec!["sh".to_string(), "-c".to_string(), shell]
}

/// Creates a snapshot of the running database.
pub async fn create(
    desc: &ProjectDescriptor,
    name: Option<String>,
    out: &Output,
) -> Result<Snapshot> {
    if let Some(name) = &name {
        validate_name(name)?;
    }
    // Snapshot operations serialize with lifecycle operations on the same
    // project.
    let _lock = Lock::acquire(&desc.lock_path())?;

    let db_container = project::container_name(&desc.name, Role::Db);
    if !state::container_running(&db_container).await? {
        return Err(anyhow!(DdevError::Precondition(format!(
            "database container for '{}' is not running; start the project before snapshotting",
            desc.name
        ))));
    }

    let now = Utc::now();
    let name = match name {
        Some(n) => n,
        None => default_name(&desc.name, now),
    };
    let dir = desc.snapshots_dir().join(&name);
    if dir.exists() {
        return Err(anyhow!(DdevError::Precondition(format!(
            "snapshot '{}' already exists; snapshots are immutable",
            name
        ))));
    }
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create snapshot directory {}", dir.display()))?;

    // The db container sees the snapshot directory through its config-dir
    // mount; the dump lands directly in place.
    let in_container_dir = format!(
        "{}/{}/{}",
        services::CONFIG_MOUNT,
        project::SNAPSHOTS_DIR,
        name
    );
    let dump_target = format!("{}/dump.sql", in_container_dir);
    let cmd = dump_command(&desc.database.engine, &dump_target);
    let (code, output) = operations::exec_capture(&db_container, &cmd).await?;
    if code != 0 {
        let _ = fs::remove_dir_all(&dir);
        return Err(anyhow!(DdevError::ExternalCommand {
            cmd: "database dump".to_string(),
            status: code.to_string(),
            output,
        }));
    }

    let meta = SnapshotMeta {
        name: name.clone(),
        project: desc.name.clone(),
        engine: desc.database.identity(),
        created: now,
    };
    let raw = serde_yaml::to_string(&meta)
        .map_err(|e| anyhow!(DdevError::Config(format!("serializing snapshot metadata: {}", e))))?;
    fs::write(dir.join(META_FILENAME), raw)
        .with_context(|| format!("Failed to write snapshot metadata in {}", dir.display()))?;
    // Commit point: the marker makes the directory immutable.
    fs::write(dir.join(COMPLETE_MARKER), b"")
        .with_context(|| format!("Failed to write completion marker in {}", dir.display()))?;

    info!("Created snapshot '{}' for project '{}'.", name, desc.name);
    out.success(&format!("Created database snapshot {}", name));
    Ok(Snapshot { meta, dir })
}

/// Lists the project's snapshots, ascending by creation time, ties broken
/// lexicographically ascending by name.
pub fn list(desc: &ProjectDescriptor) -> Result<Vec<Snapshot>> {
    let root = desc.snapshots_dir();
    if !root.is_dir() {
        return Ok(Vec::new());
    }
    let mut snapshots = Vec::new();
    for entry in fs::read_dir(&root)
        .with_context(|| format!("Failed to read {}", root.display()))?
    {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        match Snapshot::load(path.clone()) {
            Ok(s) if s.is_complete() => snapshots.push(s),
            Ok(s) => warn!("Skipping incomplete snapshot {}", s.dir.display()),
            Err(e) => warn!("Skipping unreadable snapshot {}: {}", path.display(), e),
        }
    }
    sort_snapshots(&mut snapshots);
    Ok(snapshots)
}

fn sort_snapshots(snapshots: &mut [Snapshot]) {
    snapshots.sort_by(|a, b| {
        a.meta
            .created
            .cmp(&b.meta.created)
            .then_with(|| a.meta.name.cmp(&b.meta.name))
    });
}

/// Resolves a selector against the project's snapshots. `Latest` picks
/// the greatest creation time; ties resolve to the lexicographically
/// smallest name, deterministically.
pub fn resolve(desc: &ProjectDescriptor, selector: &Selector) -> Result<Snapshot> {
    let snapshots = list(desc)?;
    match selector {
        Selector::Name(name) => snapshots
            .into_iter()
            .find(|s| &s.meta.name == name)
            .ok_or_else(|| {
                anyhow!(DdevError::not_found(
                    "snapshot",
                    name.clone(),
                    "see `ddev snapshot` for existing snapshots"
                ))
            }),
        Selector::Latest => {
            let mut snapshots = snapshots;
            // Ascending sort puts the winner last; equal timestamps keep
            // the lexicographically smallest name first among the ties,
            // so walk back to the first of the maximal-time group.
            sort_snapshots(&mut snapshots);
            let last_time = snapshots
                .last()
                .map(|s| s.meta.created)
                .ok_or_else(|| {
                    anyhow!(DdevError::not_found(
                        "snapshot",
                        "--latest",
                        "the project has no snapshots"
                    ))
                })?;
            Ok(snapshots
                .into_iter()
                .filter(|s| s.meta.created == last_time)
                .min_by(|a, b| a.meta.name.cmp(&b.meta.name))
                .expect("non-empty tie group"))
        }
    }
}

/// Restores a snapshot into the project's database.
pub async fn restore(desc: &ProjectDescriptor, selector: &Selector, out: &Output) -> Result<()> {
    // Nothing may interleave with the db container being swapped out, a
    // concurrent stop included.
    let _lock = Lock::acquire(&desc.lock_path())?;

    let global = config::load_global_config()?;
    let snapshot = resolve(desc, selector)?;
    let db_container = project::container_name(&desc.name, Role::Db);

    // Compatibility gate while the database is still up.
    if !state::container_running(&db_container).await? {
        return Err(anyhow!(DdevError::Precondition(format!(
            "database container for '{}' is not running; start the project before restoring",
            desc.name
        ))));
    }
    if snapshot.meta.engine != desc.database.identity() {
        return Err(anyhow!(DdevError::Precondition(format!(
            "snapshot '{}' was taken from {} but the project database is {}",
            snapshot.meta.name,
            snapshot.meta.engine,
            desc.database.identity()
        ))));
    }

    let sync = desc.mutagen_enabled(&global);
    out.info(&format!(
        "Restoring snapshot '{}' into project '{}'...",
        snapshot.meta.name, desc.name
    ));

    // Step 1: flush; then everything destructive happens inside the gate.
    mutagen::flush_then(desc, sync, || async {
        run_restore_steps(desc, &global, &snapshot, &db_container).await
    })
    .await
    .with_context(|| format!("Restore of snapshot '{}' failed", snapshot.meta.name))?;

    out.success(&format!("Restored database snapshot {}", snapshot.meta.name));
    Ok(())
}

async fn run_restore_steps(
    desc: &ProjectDescriptor,
    global: &config::GlobalConfig,
    snapshot: &Snapshot,
    db_container: &str,
) -> Result<()> {
    // Step 2: stop the database.
    lifecycle::stop_container(db_container, Some(30))
        .await
        .context("restore step 'stop database' failed")?;
    lifecycle::remove_container(db_container, false)
        .await
        .context("restore step 'remove database container' failed")?;

    // Steps 3-4: snapshot mounted, database started in restore mode.
    // Point of no return: from here the operation must not be interrupted.
    let _guard = CriticalSection::enter();
    let restore_spec =
        services::db_restore_spec(desc, global, &snapshot.meta.name, &snapshot.dir);
    operations::run_container(&restore_spec)
        .await
        .context("restore step 'start database in restore mode' failed")?;

    // Step 5: bounded-retry wait for the restore-complete signal.
    wait_restore_complete(db_container)
        .await
        .context("restore step 'wait for restore completion' failed")?;

    // Step 6: back to normal mode.
    lifecycle::stop_container(db_container, Some(30))
        .await
        .context("restore step 'stop restore-mode database' failed")?;
    lifecycle::remove_container(db_container, false)
        .await
        .context("restore step 'remove restore-mode container' failed")?;
    let normal_spec = services::db_spec(desc, global);
    operations::run_container(&normal_spec)
        .await
        .context("restore step 'return database to normal mode' failed")?;
    debug!("Database returned to normal mode after restore.");
    Ok(())
}

async fn wait_restore_complete(db_container: &str) -> Result<()> {
    let started = tokio::time::Instant::now();
    let mut delays = backoff::delays();
    let probe = vec![
        "test".to_string(),
        "-f".to_string(),
        RESTORE_DONE_PROBE.to_string(),
    ];
    loop {
        let (code, _) = operations::exec_capture(db_container, &probe).await?;
        if code == 0 {
            return Ok(());
        }
        if started.elapsed() > backoff::DEADLINE {
            return Err(anyhow!(DdevError::Transient(format!(
                "database did not signal restore completion within {}s; \
                 project left unhealthy for inspection",
                backoff::DEADLINE.as_secs()
            ))));
        }
        let delay = delays.next().unwrap_or(backoff::CAP);
        tokio::time::sleep(delay).await;
    }
}

/// Deletes a snapshot directory.
pub fn delete(desc: &ProjectDescriptor, name: &str) -> Result<()> {
    validate_name(name)?;
    let dir = desc.snapshots_dir().join(name);
    if !dir.is_dir() {
        return Err(anyhow!(DdevError::not_found(
            "snapshot",
            name,
            "see `ddev snapshot` for existing snapshots"
        )));
    }
    fs::remove_dir_all(&dir)
        .with_context(|| format!("Failed to delete snapshot {}", dir.display()))?;
    info!("Deleted snapshot '{}' of project '{}'.", name, desc.name);
    Ok(())
}
