//! # ddev Service Container Specs
//!
//! File: cli/src/common/workflow/services.rs
//!
//! ## Overview
//!
//! Builds the [`RunSpec`] for each service container a project declares.
//! This is the single place container wiring lives — images, mounts,
//! environment, networks — so the orchestrator and the snapshot manager
//! (which recreates the db container around a restore) agree on it.
//!
use crate::common::docker::operations::RunSpec;
use crate::common::project::{self, ProjectDescriptor, Role};
use crate::core::config::GlobalConfig;
use std::path::Path;

/// In-container mount point of the project's `.config` directory. The
/// snapshot manager writes dumps through this mount.
pub const CONFIG_MOUNT: &str = "/mnt/ddev-config";
/// Web docroot inside the web and sidecar containers.
pub const DOCROOT: &str = "/var/www/html";
/// Read-only mount point of a snapshot directory during restore.
pub const RESTORE_MOUNT: &str = "/mnt/ddev-restore";
/// Env var telling the db entrypoint to restore the named snapshot.
pub const RESTORE_ENV: &str = "DDEV_DB_RESTORE_SNAPSHOT";

fn db_data_dir(engine: &str) -> &'static str {
    match engine {
        "postgres" => "/var/lib/postgresql/data",
        _ => "/var/lib/mysql",
    }
}

/// Database service container.
pub fn db_spec(desc: &ProjectDescriptor, _global: &GlobalConfig) -> RunSpec {
    let name = project::container_name(&desc.name, Role::Db);
    let mut spec = RunSpec::new(&name, &desc.database.image(), &desc.name, Role::Db.as_str())
        .network(&project::network_name(&desc.name))
        .volume(
            &project::db_volume(&desc.name),
            db_data_dir(&desc.database.engine),
        )
        .bind(desc.config_dir(), CONFIG_MOUNT, false);
    spec = match desc.database.engine.as_str() {
        "postgres" => spec
            .env("POSTGRES_PASSWORD", "db")
            .env("POSTGRES_USER", "db")
            .env("POSTGRES_DB", "db"),
        _ => spec
            .env("MYSQL_ROOT_PASSWORD", "root")
            .env("MYSQL_DATABASE", "db")
            .env("MYSQL_USER", "db")
            .env("MYSQL_PASSWORD", "db"),
    };
    spec
}

/// Database container in restore mode: the normal spec plus the snapshot
/// directory mounted read-only and the restore trigger in the environment.
pub fn db_restore_spec(
    desc: &ProjectDescriptor,
    global: &GlobalConfig,
    snapshot_name: &str,
    snapshot_dir: &Path,
) -> RunSpec {
    db_spec(desc, global)
        .bind(snapshot_dir.to_path_buf(), RESTORE_MOUNT, true)
        .env(RESTORE_ENV, snapshot_name)
}

/// Web service container. With sync enabled the docroot comes from the
/// sync volume (populated by the sidecar session); otherwise the project
/// root is bind-mounted directly.
pub fn web_spec(desc: &ProjectDescriptor, global: &GlobalConfig, sync_enabled: bool) -> RunSpec {
    let name = project::container_name(&desc.name, Role::Web);
    let spec = RunSpec::new(&name, &global.web_image, &desc.name, Role::Web.as_str())
        .network(&project::network_name(&desc.name))
        .env("DDEV_PROJECT", &desc.name);
    if sync_enabled {
        spec.volume(&project::sync_volume(&desc.name), DOCROOT)
    } else {
        spec.bind(desc.approot.clone(), DOCROOT, false)
    }
}

/// Optional database-admin container.
pub fn dba_spec(desc: &ProjectDescriptor, global: &GlobalConfig) -> RunSpec {
    let name = project::container_name(&desc.name, Role::Dba);
    RunSpec::new(&name, &global.dba_image, &desc.name, Role::Dba.as_str())
        .network(&project::network_name(&desc.name))
        .env(
            "PMA_HOST",
            &project::container_name(&desc.name, Role::Db),
        )
}

/// Sync sidecar: exposes the sync volume to the daemon over the docker
/// transport. The image has no long-running entrypoint of its own.
pub fn sidecar_spec(desc: &ProjectDescriptor, global: &GlobalConfig) -> RunSpec {
    let name = project::container_name(&desc.name, Role::SyncSidecar);
    RunSpec::new(&name, &global.sync_sidecar_image, &desc.name, Role::SyncSidecar.as_str())
        .network(&project::network_name(&desc.name))
        .volume(&project::sync_volume(&desc.name), DOCROOT)
        .cmd(&["sleep", "infinity"])
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::docker::operations::MountSource;
    use std::path::PathBuf;

    fn demo_desc() -> ProjectDescriptor {
        ProjectDescriptor {
            name: "demo".to_string(),
            database: Default::default(),
            omit_containers: Default::default(),
            mutagen: None,
            approot: PathBuf::from("/home/me/demo"),
        }
    }

    #[test]
    fn test_db_spec_wiring() {
        let desc = demo_desc();
        let global = GlobalConfig::default();
        let spec = db_spec(&desc, &global);
        assert_eq!(spec.name, "ddev-demo-db");
        assert_eq!(spec.image, "mariadb:10.11");
        assert_eq!(spec.network.as_deref(), Some("ddev-demo"));
        // Data volume plus the config-dir bind the snapshot manager needs.
        assert!(spec.mounts.iter().any(|m| m.target == "/var/lib/mysql"
            && m.source == MountSource::Volume("ddev-demo-db".to_string())));
        assert!(spec
            .mounts
            .iter()
            .any(|m| m.target == CONFIG_MOUNT && !m.readonly));
    }

    #[test]
    fn test_restore_spec_adds_snapshot_mount_and_trigger() {
        let desc = demo_desc();
        let global = GlobalConfig::default();
        let spec = db_restore_spec(&desc, &global, "s1", Path::new("/home/me/demo/.config/db_snapshots/s1"));
        assert!(spec
            .mounts
            .iter()
            .any(|m| m.target == RESTORE_MOUNT && m.readonly));
        assert_eq!(spec.env.get(RESTORE_ENV), Some(&"s1".to_string()));
    }

    #[test]
    fn test_web_spec_docroot_source_follows_sync_mode() {
        let desc = demo_desc();
        let global = GlobalConfig::default();

        let direct = web_spec(&desc, &global, false);
        assert!(direct.mounts.iter().any(|m| m.target == DOCROOT
            && m.source == MountSource::Bind(PathBuf::from("/home/me/demo"))));

        let synced = web_spec(&desc, &global, true);
        assert!(synced.mounts.iter().any(|m| m.target == DOCROOT
            && m.source == MountSource::Volume("ddev-demo-sync".to_string())));
    }

    #[test]
    fn test_sidecar_spec_keeps_container_alive() {
        let desc = demo_desc();
        let spec = sidecar_spec(&desc, &GlobalConfig::default());
        assert_eq!(spec.cmd.as_deref(), Some(&["sleep".to_string(), "infinity".to_string()][..]));
    }
}
