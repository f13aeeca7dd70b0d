//! # ddev Docker Volumes & Networks
//!
//! File: cli/src/common/docker/volumes.rs
//!
//! ## Overview
//!
//! Idempotent ensure/remove helpers for the named volumes and networks a
//! project owns (db data volume, sync-sidecar volume, project network).
//! "Ensure" succeeds when the resource already exists; "remove" succeeds
//! when it is already gone. Auxiliary singleton resources are never removed
//! by these callers — that policy lives in the orchestrator.
//!
use crate::core::error::{DdevError, Result};
use anyhow::anyhow;
use bollard::network::{CreateNetworkOptions, InspectNetworkOptions};
use bollard::volume::CreateVolumeOptions;
use tracing::{debug, info, instrument};

use super::connect::connect;

/// Creates the named volume if absent.
#[instrument(skip(name), fields(volume = %name))]
pub async fn ensure_volume(name: &str) -> Result<()> {
    let docker = connect().await?;
    // create_volume is idempotent at the API level: an existing name is
    // returned unchanged.
    docker
        .create_volume(CreateVolumeOptions {
            name: name.to_string(),
            ..Default::default()
        })
        .await
        .map_err(|e| anyhow!(DdevError::DockerApi { source: e })
            .context(format!("Failed to ensure volume '{}'", name)))?;
    debug!("Volume '{}' present.", name);
    Ok(())
}

/// Removes the named volume; missing (404) is success.
#[instrument(skip(name), fields(volume = %name))]
pub async fn remove_volume(name: &str) -> Result<()> {
    let docker = connect().await?;
    match docker.remove_volume(name, None).await {
        Ok(_) => {
            info!("Volume '{}' removed.", name);
            Ok(())
        }
        Err(bollard::errors::Error::DockerResponseServerError {
            status_code: 404, ..
        }) => {
            debug!("Volume '{}' not found, nothing to remove.", name);
            Ok(())
        }
        Err(e) => Err(anyhow!(DdevError::DockerApi { source: e })
            .context(format!("Failed to remove volume '{}'", name))),
    }
}

/// Creates the named bridge network if absent.
#[instrument(skip(name), fields(network = %name))]
pub async fn ensure_network(name: &str) -> Result<()> {
    let docker = connect().await?;
    match docker
        .inspect_network(name, None::<InspectNetworkOptions<String>>)
        .await
    {
        Ok(_) => {
            debug!("Network '{}' already exists.", name);
            return Ok(());
        }
        Err(bollard::errors::Error::DockerResponseServerError {
            status_code: 404, ..
        }) => {}
        Err(e) => {
            return Err(anyhow!(DdevError::DockerApi { source: e })
                .context(format!("Failed to inspect network '{}'", name)))
        }
    }
    docker
        .create_network(CreateNetworkOptions {
            name: name.to_string(),
            driver: "bridge".to_string(),
            ..Default::default()
        })
        .await
        .map_err(|e| anyhow!(DdevError::DockerApi { source: e })
            .context(format!("Failed to create network '{}'", name)))?;
    info!("Network '{}' created.", name);
    Ok(())
}

/// Removes the named network; missing (404) is success.
#[instrument(skip(name), fields(network = %name))]
pub async fn remove_network(name: &str) -> Result<()> {
    let docker = connect().await?;
    match docker.remove_network(name).await {
        Ok(_) => {
            info!("Network '{}' removed.", name);
            Ok(())
        }
        Err(bollard::errors::Error::DockerResponseServerError {
            status_code: 404, ..
        }) => {
            debug!("Network '{}' not found, nothing to remove.", name);
            Ok(())
        }
        Err(e) => Err(anyhow!(DdevError::DockerApi { source: e })
            .context(format!("Failed to remove network '{}'", name))),
    }
}
