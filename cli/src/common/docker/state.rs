//! # ddev Docker State Queries
//!
//! File: cli/src/common/docker/state.rs
//!
//! ## Overview
//!
//! Read-only queries against the Docker daemon: existence and running
//! checks, full inspection, health-state extraction, and listing the
//! containers that belong to a project (matched by the
//! `com.ddev.project` label every ddev-owned container carries).
//!
//! A "Not Found" (404) response is interpreted as `false`/absent where the
//! caller asked a yes-no question, and mapped to `DdevError::NotFound`
//! where it asked for details.
//!
use crate::core::error::{DdevError, Result};
use anyhow::anyhow;
use bollard::container::{InspectContainerOptions, ListContainersOptions};
use bollard::models::{ContainerInspectResponse, ContainerStateStatusEnum, ContainerSummary};
use std::collections::HashMap;
use tracing::{debug, error, instrument, warn};

use super::connect::connect;

/// Label key identifying ddev-owned containers; the value is the project name.
pub const PROJECT_LABEL: &str = "com.ddev.project";
/// Label key carrying the container's role within the project.
pub const ROLE_LABEL: &str = "com.ddev.role";

/// Simplified health view of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    /// Running with a passing healthcheck, or running without one.
    Healthy,
    /// Running, healthcheck still starting.
    Starting,
    /// Running, healthcheck failing.
    Unhealthy,
    /// Not running at all.
    NotRunning,
}

/// Checks if a container exists locally by name or ID.
#[instrument(skip(name_or_id), fields(container = %name_or_id))]
pub async fn container_exists(name_or_id: &str) -> Result<bool> {
    let docker = connect().await?;
    match docker
        .inspect_container(name_or_id, None::<InspectContainerOptions>)
        .await
    {
        Ok(_) => Ok(true),
        Err(bollard::errors::Error::DockerResponseServerError {
            status_code: 404, ..
        }) => Ok(false),
        Err(e) => {
            error!("Failed to inspect container '{}': {:?}", name_or_id, e);
            Err(anyhow!(DdevError::DockerApi { source: e })
                .context(format!("Failed to inspect container '{}'", name_or_id)))
        }
    }
}

/// Inspects a container by name or ID.
#[instrument(skip(name_or_id), fields(container = %name_or_id))]
pub async fn inspect_container(name_or_id: &str) -> Result<ContainerInspectResponse> {
    let docker = connect().await?;
    docker
        .inspect_container(name_or_id, None::<InspectContainerOptions>)
        .await
        .map_err(|e| match e {
            bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            } => {
                warn!("Container '{}' not found during inspect.", name_or_id);
                anyhow!(DdevError::not_found("container", name_or_id, ""))
            }
            _ => anyhow!(DdevError::DockerApi { source: e })
                .context(format!("Failed to inspect container '{}'", name_or_id)),
        })
}

/// Checks whether a container is currently in the `running` state.
/// A missing container counts as not running.
#[instrument(skip(name_or_id), fields(container = %name_or_id))]
pub async fn container_running(name_or_id: &str) -> Result<bool> {
    if !container_exists(name_or_id).await? {
        return Ok(false);
    }
    let inspect = inspect_container(name_or_id).await?;
    let running = inspect
        .state
        .as_ref()
        .and_then(|s| s.status)
        .map(|s| s == ContainerStateStatusEnum::RUNNING)
        .unwrap_or(false);
    debug!("Container '{}' running: {}", name_or_id, running);
    Ok(running)
}

/// Extracts the health view of a container. Containers without a
/// healthcheck count as healthy once running.
#[instrument(skip(name_or_id), fields(container = %name_or_id))]
pub async fn container_health(name_or_id: &str) -> Result<HealthState> {
    if !container_exists(name_or_id).await? {
        return Ok(HealthState::NotRunning);
    }
    let inspect = inspect_container(name_or_id).await?;
    let state = match inspect.state {
        Some(s) => s,
        None => return Ok(HealthState::NotRunning),
    };
    if state.status != Some(ContainerStateStatusEnum::RUNNING) {
        return Ok(HealthState::NotRunning);
    }
    use bollard::models::HealthStatusEnum;
    let health = state.health.and_then(|h| h.status);
    Ok(match health {
        Some(HealthStatusEnum::HEALTHY) => HealthState::Healthy,
        Some(HealthStatusEnum::STARTING) => HealthState::Starting,
        Some(HealthStatusEnum::UNHEALTHY) => HealthState::Unhealthy,
        // NONE / EMPTY / absent: no healthcheck defined.
        _ => HealthState::Healthy,
    })
}

/// Lists containers belonging to `project` (all states when `all` is true).
#[instrument(skip(project), fields(project = %project))]
pub async fn list_project_containers(project: &str, all: bool) -> Result<Vec<ContainerSummary>> {
    let docker = connect().await?;
    let mut filters: HashMap<String, Vec<String>> = HashMap::new();
    filters.insert(
        "label".to_string(),
        vec![format!("{}={}", PROJECT_LABEL, project)],
    );
    let options = ListContainersOptions {
        all,
        filters,
        ..Default::default()
    };
    docker
        .list_containers(Some(options))
        .await
        .map_err(|e| anyhow!(DdevError::DockerApi { source: e })
            .context(format!("Failed to list containers for project '{}'", project)))
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_keys() {
        // The label keys are part of the on-engine contract; changing them
        // orphans containers created by earlier versions.
        assert_eq!(PROJECT_LABEL, "com.ddev.project");
        assert_eq!(ROLE_LABEL, "com.ddev.role");
    }

    #[tokio::test]
    #[ignore] // Requires a running Docker daemon.
    async fn test_container_exists_false_for_unknown() {
        let exists = container_exists("ddev-test-no-such-container")
            .await
            .expect("daemon reachable");
        assert!(!exists);
    }
}
