//! # ddev Lifecycle Orchestrator
//!
//! File: cli/src/common/workflow/mod.rs
//!
//! ## Overview
//!
//! Composes the locator, the Docker adapter, the sync-daemon supervisor,
//! the SSH-agent supervisor, and the snapshot manager into the project
//! lifecycle operations: `start`, `restart`, `stop`, `remove`.
//!
//! ## Architecture
//!
//! State machine: STOPPED → STARTING → RUNNING, with RESTARTING looping
//! back through health probes and UNHEALTHY as the terminal failure state
//! requiring operator action.
//!
//! Ordering rules the operations enforce:
//! - auxiliaries (SSH agent, sync daemon) are ensured before any project
//!   container and never torn down by project operations;
//! - project containers start db → web → dba → sync-sidecar and stop in
//!   reverse;
//! - with sync enabled, `stop` flushes before halting the session
//!   (`mutagen::flush_then` is the only path to the destructive part);
//! - the whole of each operation runs under the per-project advisory
//!   lock, so two invocations against the same project never interleave:
//!   the loser of the lock race observes the final state and no-ops.
//!
use crate::common::backoff;
use crate::common::docker::operations::RunSpec;
use crate::common::docker::state::HealthState;
use crate::common::docker::{lifecycle, operations, state, volumes};
use crate::common::lock::Lock;
use crate::common::output::Output;
use crate::common::project::{self, ProjectDescriptor, ProjectStatus, Role};
use crate::common::{mutagen, sshauth};
use crate::core::config::{self, GlobalConfig};
use crate::core::error::{DdevError, Result};
use anyhow::{anyhow, Context};
use bollard::models::ContainerStateStatusEnum;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

pub mod services;

/// URLs the running project is reachable at.
pub fn project_urls(desc: &ProjectDescriptor) -> Vec<String> {
    vec![
        format!("http://{}.ddev.site", desc.name),
        format!("https://{}.ddev.site", desc.name),
    ]
}

/// The containers a project runs, in dependency order.
fn service_roles(desc: &ProjectDescriptor, global: &GlobalConfig, sync: bool) -> Vec<Role> {
    let mut roles = vec![Role::Db, Role::Web];
    if !desc.omits(Role::Dba, global) {
        roles.push(Role::Dba);
    }
    if sync {
        roles.push(Role::SyncSidecar);
    }
    roles
}

fn spec_for(desc: &ProjectDescriptor, global: &GlobalConfig, sync: bool, role: Role) -> RunSpec {
    match role {
        Role::Db => services::db_spec(desc, global),
        Role::Web => services::web_spec(desc, global, sync),
        Role::Dba => services::dba_spec(desc, global),
        Role::SyncSidecar => services::sidecar_spec(desc, global),
        Role::SshAgent => unreachable!("agent is managed by the sshauth supervisor"),
    }
}

/// Starts a stopped service container or creates it if absent.
async fn ensure_service(spec: &RunSpec) -> Result<()> {
    if state::container_exists(&spec.name).await? {
        lifecycle::start_container(&spec.name).await
    } else {
        operations::run_container(spec).await
    }
}

/// Observable state of the project, derived from its web and db
/// containers. Never cached; always re-derived from the engine.
pub async fn status(desc: &ProjectDescriptor) -> Result<ProjectStatus> {
    let web = project::container_name(&desc.name, Role::Web);
    let db = project::container_name(&desc.name, Role::Db);

    let mut any_exists = false;
    let mut all_running = true;
    let mut any_starting = false;
    let mut any_paused = false;
    let mut any_unhealthy = false;

    for name in [&web, &db] {
        if !state::container_exists(name).await? {
            all_running = false;
            continue;
        }
        any_exists = true;
        let inspect = state::inspect_container(name).await?;
        let container_state = inspect.state.as_ref().and_then(|s| s.status);
        match container_state {
            Some(ContainerStateStatusEnum::RUNNING) => {
                match state::container_health(name).await? {
                    HealthState::Healthy => {}
                    HealthState::Starting => any_starting = true,
                    HealthState::Unhealthy => any_unhealthy = true,
                    HealthState::NotRunning => all_running = false,
                }
            }
            Some(ContainerStateStatusEnum::PAUSED) => any_paused = true,
            Some(ContainerStateStatusEnum::CREATED)
            | Some(ContainerStateStatusEnum::RESTARTING) => any_starting = true,
            _ => all_running = false,
        }
    }

    Ok(if !any_exists {
        ProjectStatus::Stopped
    } else if any_unhealthy {
        ProjectStatus::Unhealthy
    } else if any_paused {
        ProjectStatus::Paused
    } else if any_starting {
        ProjectStatus::Starting
    } else if all_running {
        ProjectStatus::Running
    } else {
        // Some containers exist but are not all running: a half-stopped
        // project counts as stopped only when nothing runs at all.
        if state::container_running(&web).await? || state::container_running(&db).await? {
            ProjectStatus::Unhealthy
        } else {
            ProjectStatus::Stopped
        }
    })
}

/// Waits until every named container reports healthy, with bounded
/// exponential backoff under the probe deadline. Names the failing
/// container on error.
async fn wait_healthy(names: &[String]) -> Result<()> {
    let started = tokio::time::Instant::now();
    for name in names {
        let mut delays = backoff::delays();
        loop {
            match state::container_health(name).await? {
                HealthState::Healthy => break,
                HealthState::Unhealthy => {
                    return Err(anyhow!(DdevError::Precondition(format!(
                        "service container '{}' reports unhealthy",
                        name
                    ))))
                }
                HealthState::Starting | HealthState::NotRunning => {
                    if started.elapsed() > backoff::DEADLINE {
                        return Err(anyhow!(DdevError::Transient(format!(
                            "service container '{}' did not become healthy within {}s",
                            name,
                            backoff::DEADLINE.as_secs()
                        ))));
                    }
                    // Schedule: 250 ms initial, doubling, capped at 8 s.
                    let delay = delays.next().unwrap_or(backoff::CAP);
                    tokio::time::sleep(delay).await;
                }
            }
        }
        debug!("Container '{}' is healthy.", name);
    }
    Ok(())
}

/// Starts the project: auxiliaries, network, containers in dependency
/// order, sync session, health probes, URLs.
pub async fn start(desc: &ProjectDescriptor, out: &Output) -> Result<()> {
    let _lock = match Lock::try_acquire(&desc.lock_path())? {
        Some(lock) => lock,
        None => {
            out.info(&format!(
                "Another ddev invocation is working on '{}'; waiting for it to finish.",
                desc.name
            ));
            Lock::acquire(&desc.lock_path())?
        }
    };
    start_locked(desc, out).await
}

/// The body of `start`, entered with the per-project lock held.
async fn start_locked(desc: &ProjectDescriptor, out: &Output) -> Result<()> {
    let global = config::load_global_config()?;

    // A concurrent start may have finished while we waited on the lock.
    if status(desc).await? == ProjectStatus::Running {
        let urls = project_urls(desc);
        out.info(&format!(
            "Project '{}' is already running and reachable at {}",
            desc.name,
            urls.join(", ")
        ));
        return Ok(());
    }

    info!("Starting project '{}'", desc.name);
    let sync = desc.mutagen_enabled(&global);

    // 1. Auxiliary singletons first; their ensure calls take their own
    //    short-lived locks.
    if !desc.omits(Role::SshAgent, &global) {
        sshauth::ensure().await.context("Failed to ensure SSH agent")?;
    }
    if sync {
        mutagen::ensure_daemon()
            .await
            .context("Failed to ensure sync daemon")?;
    }

    project::register(desc)?;

    // 2. Network and volumes.
    volumes::ensure_network(&project::network_name(&desc.name)).await?;
    volumes::ensure_volume(&project::db_volume(&desc.name)).await?;
    if sync {
        volumes::ensure_volume(&project::sync_volume(&desc.name)).await?;
    }

    // 3. Containers in dependency order.
    let roles = service_roles(desc, &global, sync);
    for role in &roles {
        let spec = spec_for(desc, &global, sync, *role);
        ensure_service(&spec)
            .await
            .with_context(|| format!("Failed to start {} service", role))?;
    }

    // 4. Sync session after the sidecar is up.
    if sync {
        mutagen::create_session(desc).await?;
        mutagen::wait_watching(desc, Duration::from_secs(120)).await?;
        out.info("File sync session is watching for changes.");
    }

    // 5. Health probes.
    let names: Vec<String> = roles
        .iter()
        .map(|r| project::container_name(&desc.name, *r))
        .collect();
    wait_healthy(&names).await?;

    // 6. Reachable URLs.
    let urls = project_urls(desc);
    out.success_with(
        &format!(
            "Project '{}' is running and reachable at {}",
            desc.name,
            urls.join(", ")
        ),
        json!({ "project": desc.name, "urls": urls, "status": "running" }),
    );
    Ok(())
}

/// Stops the project. With `remove_data` the project-owned volumes and
/// network go too; auxiliary singletons are never touched.
pub async fn stop(desc: &ProjectDescriptor, remove_data: bool, out: &Output) -> Result<()> {
    let _lock = Lock::acquire(&desc.lock_path())?;
    stop_locked(desc, remove_data, out).await
}

async fn stop_locked(desc: &ProjectDescriptor, remove_data: bool, out: &Output) -> Result<()> {
    let global = config::load_global_config()?;
    info!("Stopping project '{}'", desc.name);
    let sync = desc.mutagen_enabled(&global);

    // 1. Flush, then halt the session. The flush is the gate in front of
    //    everything destructive below.
    mutagen::flush_then(desc, sync, || async {
        if sync {
            mutagen::terminate(desc).await?;
        }
        stop_containers(desc, &global, sync, remove_data).await
    })
    .await?;

    // 3. Project-owned data, never the shared singletons.
    if remove_data {
        volumes::remove_volume(&project::db_volume(&desc.name)).await?;
        volumes::remove_volume(&project::sync_volume(&desc.name)).await?;
        volumes::remove_network(&project::network_name(&desc.name)).await?;
        out.info(&format!("Removed data volumes for project '{}'.", desc.name));
    }

    out.success(&format!("Project '{}' has been stopped.", desc.name));
    Ok(())
}

/// 2. Containers in reverse dependency order.
async fn stop_containers(
    desc: &ProjectDescriptor,
    global: &GlobalConfig,
    sync: bool,
    remove: bool,
) -> Result<()> {
    let mut roles = service_roles(desc, global, sync);
    // A previously synced project may still carry a sidecar even if sync
    // is now disabled; include it so stop is complete.
    if !roles.contains(&Role::SyncSidecar) {
        roles.push(Role::SyncSidecar);
    }
    roles.reverse();
    for role in roles {
        let name = project::container_name(&desc.name, role);
        lifecycle::stop_container(&name, Some(10))
            .await
            .with_context(|| format!("Failed to stop {} service", role))?;
        if remove {
            lifecycle::remove_container(&name, true)
                .await
                .with_context(|| format!("Failed to remove {} service", role))?;
        }
    }
    Ok(())
}

/// Restart: stop then start, leaving the auxiliary containers alone (the
/// stop path never touches them anyway; their ensure in `start` is
/// idempotent). The per-project lock is held across both phases, so no
/// other invocation can slip in between them.
pub async fn restart(desc: &ProjectDescriptor, out: &Output) -> Result<()> {
    let _lock = Lock::acquire(&desc.lock_path())?;
    stop_locked(desc, false, out).await?;
    start_locked(desc, out).await
}

/// Removes the project: stop with data removal plus deregistration.
pub async fn remove(desc: &ProjectDescriptor, out: &Output) -> Result<()> {
    let _lock = Lock::acquire(&desc.lock_path())?;
    stop_locked(desc, true, out).await?;

    // Stop only knows the current role set; take out anything else still
    // carrying the project label (a sidecar from an older configuration,
    // for example).
    for container in state::list_project_containers(&desc.name, true).await? {
        for name in container.names.unwrap_or_default() {
            lifecycle::remove_container(name.trim_start_matches('/'), true).await?;
        }
    }

    project::deregister(&desc.name)?;
    out.success(&format!("Project '{}' has been removed.", desc.name));
    Ok(())
}

/// Confirmation text for the sync-reset path, the one operation that
/// discards container-side changes instead of flushing them out.
pub fn reset_warning(desc: &ProjectDescriptor) -> String {
    format!(
        "Resetting sync for '{}' discards changes that exist only inside the container. \
         Host files are kept.",
        desc.name
    )
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::path::PathBuf;

    fn desc(omit: &[&str], mutagen: Option<bool>) -> ProjectDescriptor {
        ProjectDescriptor {
            name: "demo".to_string(),
            database: Default::default(),
            omit_containers: omit.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>(),
            mutagen,
            approot: PathBuf::from("/home/me/demo"),
        }
    }

    #[test]
    fn test_urls_are_deterministic() {
        let d = desc(&[], None);
        // stop; start must yield the same reachable URLs.
        assert_eq!(project_urls(&d), project_urls(&d));
        assert_eq!(project_urls(&d)[0], "http://demo.ddev.site");
    }

    #[test]
    fn test_service_roles_dependency_order() {
        let global = GlobalConfig::default();
        let full = service_roles(&desc(&[], Some(true)), &global, true);
        assert_eq!(full, vec![Role::Db, Role::Web, Role::Dba, Role::SyncSidecar]);

        let no_dba = service_roles(&desc(&["dba"], None), &global, false);
        assert_eq!(no_dba, vec![Role::Db, Role::Web]);
    }

    /// Restart holds the per-project lock across the stop+start pair, so
    /// a second invocation blocks at the lock instead of interleaving.
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_restart_waits_on_the_project_lock() {
        let dir = tempfile::tempdir().unwrap();
        let d = ProjectDescriptor {
            name: "lockcheck".to_string(),
            database: Default::default(),
            omit_containers: Default::default(),
            mutagen: Some(false),
            approot: dir.path().to_path_buf(),
        };
        let held = Lock::acquire(&d.lock_path()).unwrap();

        let contender = d.clone();
        let task = tokio::spawn(async move {
            let out = Output::new(true);
            let _ = restart(&contender, &out).await;
        });
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(!task.is_finished(), "restart ran while the lock was held");
        task.abort();
        drop(held);
        let _ = task.await;
    }

    #[test]
    fn test_spec_for_covers_all_project_roles() {
        let global = GlobalConfig::default();
        let d = desc(&[], Some(true));
        for role in service_roles(&d, &global, true) {
            let spec = spec_for(&d, &global, true, role);
            assert!(spec.name.starts_with("ddev-demo-"));
        }
    }
}
