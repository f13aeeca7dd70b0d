//! # ddev Docker Connection
//!
//! File: cli/src/common/docker/connect.rs
//!
//! ## Overview
//!
//! Establishes the connection to the Docker daemon for all adapter modules.
//! `DOCKER_HOST` is honoured when set (unix socket or tcp/http endpoint);
//! otherwise the platform default socket is used.
//!
use crate::core::error::{DdevError, Result};
use anyhow::{anyhow, Context};
use bollard::{Docker, API_DEFAULT_VERSION};
use tracing::{debug, instrument};

const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Connects to the Docker daemon, honouring `DOCKER_HOST` if already set.
#[instrument]
pub async fn connect() -> Result<Docker> {
    let docker = match std::env::var("DOCKER_HOST") {
        Ok(host) if !host.is_empty() => {
            debug!("Connecting to Docker via DOCKER_HOST={}", host);
            if let Some(path) = host.strip_prefix("unix://") {
                Docker::connect_with_unix(path, CONNECT_TIMEOUT_SECS, API_DEFAULT_VERSION)
            } else {
                Docker::connect_with_http(&host, CONNECT_TIMEOUT_SECS, API_DEFAULT_VERSION)
            }
        }
        _ => Docker::connect_with_local_defaults(),
    };
    docker
        .map_err(|e| anyhow!(DdevError::DockerApi { source: e }))
        .context("Failed to connect to Docker daemon. Is it running and accessible?")
}
