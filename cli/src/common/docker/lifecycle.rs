//! # ddev Docker Lifecycle Operations
//!
//! File: cli/src/common/docker/lifecycle.rs
//!
//! ## Overview
//!
//! State-changing container operations: start, stop, remove. Each is
//! idempotent from the caller's perspective — the Docker API's 304
//! ("already in that state") responses are treated as success, and
//! removing a missing container succeeds.
//!
use crate::core::error::{DdevError, Result};
use anyhow::anyhow;
use bollard::container::{RemoveContainerOptions, StartContainerOptions, StopContainerOptions};
use tracing::{debug, info, instrument, warn};

use super::connect::connect;
use super::state::container_running;

/// Starts a stopped container. Already-running (304) is success.
#[instrument(skip(name_or_id), fields(container = %name_or_id))]
pub async fn start_container(name_or_id: &str) -> Result<()> {
    let docker = connect().await?;
    debug!("Starting container '{}'", name_or_id);
    match docker
        .start_container(name_or_id, None::<StartContainerOptions<String>>)
        .await
    {
        Ok(_) => {
            info!("Container '{}' started.", name_or_id);
            Ok(())
        }
        Err(bollard::errors::Error::DockerResponseServerError {
            status_code: 304, ..
        }) => {
            debug!("Container '{}' was already running.", name_or_id);
            Ok(())
        }
        Err(bollard::errors::Error::DockerResponseServerError {
            status_code: 404, ..
        }) => Err(anyhow!(DdevError::not_found("container", name_or_id, ""))),
        Err(e) => Err(anyhow!(DdevError::DockerApi { source: e })
            .context(format!("Failed to start container '{}'", name_or_id))),
    }
}

/// Stops a running container, giving it `timeout_secs` to exit gracefully.
/// Already-stopped (304) and missing (404) are success.
#[instrument(skip(name_or_id), fields(container = %name_or_id))]
pub async fn stop_container(name_or_id: &str, timeout_secs: Option<i64>) -> Result<()> {
    let docker = connect().await?;
    let options = timeout_secs.map(|t| StopContainerOptions { t });
    debug!("Stopping container '{}'", name_or_id);
    match docker.stop_container(name_or_id, options).await {
        Ok(_) => {
            info!("Container '{}' stopped.", name_or_id);
            Ok(())
        }
        Err(bollard::errors::Error::DockerResponseServerError {
            status_code: 304, ..
        }) => {
            debug!("Container '{}' was already stopped.", name_or_id);
            Ok(())
        }
        Err(bollard::errors::Error::DockerResponseServerError {
            status_code: 404, ..
        }) => {
            debug!("Container '{}' not found, nothing to stop.", name_or_id);
            Ok(())
        }
        Err(e) => Err(anyhow!(DdevError::DockerApi { source: e })
            .context(format!("Failed to stop container '{}'", name_or_id))),
    }
}

/// Removes a container. A missing container is success; a running one is
/// an error unless `force` is set.
#[instrument(skip(name_or_id), fields(container = %name_or_id))]
pub async fn remove_container(name_or_id: &str, force: bool) -> Result<()> {
    let docker = connect().await?;
    if !force && container_running(name_or_id).await? {
        return Err(anyhow!(DdevError::Precondition(format!(
            "container '{}' is running; stop it first",
            name_or_id
        ))));
    }
    let options = RemoveContainerOptions {
        force,
        v: false,
        ..Default::default()
    };
    match docker.remove_container(name_or_id, Some(options)).await {
        Ok(_) => {
            info!("Container '{}' removed.", name_or_id);
            Ok(())
        }
        Err(bollard::errors::Error::DockerResponseServerError {
            status_code: 404, ..
        }) => {
            warn!("Container '{}' not found, nothing to remove.", name_or_id);
            Ok(())
        }
        Err(e) => Err(anyhow!(DdevError::DockerApi { source: e })
            .context(format!("Failed to remove container '{}'", name_or_id))),
    }
}
