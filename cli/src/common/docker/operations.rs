//! # ddev Docker Container Operations
//!
//! File: cli/src/common/docker/operations.rs
//!
//! ## Overview
//!
//! Creation of containers from a [`RunSpec`], and command execution inside
//! running containers with captured output. These are the two write paths
//! the supervisors and the orchestrator build on: `run_container` brings a
//! service container into existence (db, web, dba, sync-sidecar, ssh-agent),
//! and `exec_capture` backs snapshot dumps, restore probes, and key
//! injection.
//!
//! ## Architecture
//!
//! `RunSpec` is deliberately smaller than the Docker API surface: a name,
//! an image, env vars, ddev's identifying labels, bind/volume mounts, and
//! an optional network. Everything ddev creates goes through it so every
//! ddev-owned container carries the project/role labels that `state.rs`
//! queries by.
//!
use crate::core::error::{DdevError, Result};
use anyhow::{anyhow, Context};
use bollard::container::{Config as ContainerConfig, CreateContainerOptions};
use bollard::exec::{CreateExecOptions, StartExecResults};
use bollard::models::{HostConfig, Mount, MountTypeEnum};
use futures_util::StreamExt;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, info, instrument};

use super::connect::connect;
use super::lifecycle::start_container;
use super::state::{container_exists, PROJECT_LABEL, ROLE_LABEL};

/// Source of a container mount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountSource {
    /// Bind-mount of a host path (must be absolute).
    Bind(PathBuf),
    /// Named Docker volume.
    Volume(String),
}

/// One mount in a [`RunSpec`].
#[derive(Debug, Clone)]
pub struct MountSpec {
    pub source: MountSource,
    pub target: String,
    pub readonly: bool,
}

/// Everything needed to create one ddev-owned container.
#[derive(Debug, Clone)]
pub struct RunSpec {
    pub name: String,
    pub image: String,
    /// Project the container belongs to; empty for host-user singletons.
    pub project: String,
    /// Role label value (`web`, `db`, `dba`, `ssh-agent`, `sync-sidecar`).
    pub role: String,
    pub env: HashMap<String, String>,
    pub mounts: Vec<MountSpec>,
    pub network: Option<String>,
    /// Command override; `None` keeps the image default.
    pub cmd: Option<Vec<String>>,
}

impl RunSpec {
    pub fn new(name: &str, image: &str, project: &str, role: &str) -> Self {
        RunSpec {
            name: name.to_string(),
            image: image.to_string(),
            project: project.to_string(),
            role: role.to_string(),
            env: HashMap::new(),
            mounts: Vec::new(),
            network: None,
            cmd: None,
        }
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn bind(mut self, host: PathBuf, target: &str, readonly: bool) -> Self {
        self.mounts.push(MountSpec {
            source: MountSource::Bind(host),
            target: target.to_string(),
            readonly,
        });
        self
    }

    pub fn volume(mut self, volume: &str, target: &str) -> Self {
        self.mounts.push(MountSpec {
            source: MountSource::Volume(volume.to_string()),
            target: target.to_string(),
            readonly: false,
        });
        self
    }

    pub fn network(mut self, network: &str) -> Self {
        self.network = Some(network.to_string());
        self
    }

    pub fn cmd(mut self, cmd: &[&str]) -> Self {
        self.cmd = Some(cmd.iter().map(|s| s.to_string()).collect());
        self
    }

    fn labels(&self) -> HashMap<String, String> {
        let mut labels = HashMap::new();
        if !self.project.is_empty() {
            labels.insert(PROJECT_LABEL.to_string(), self.project.clone());
        }
        labels.insert(ROLE_LABEL.to_string(), self.role.clone());
        labels
    }
}

/// Converts our mount specs into bollard's `Mount` structs, validating
/// bind sources are absolute paths.
fn convert_mounts(mounts: &[MountSpec]) -> Result<Vec<Mount>> {
    mounts
        .iter()
        .map(|m| {
            let (typ, source) = match &m.source {
                MountSource::Bind(path) => {
                    if !path.is_absolute() {
                        return Err(anyhow!(DdevError::Config(format!(
                            "bind mount source must be absolute: {}",
                            path.display()
                        ))));
                    }
                    (MountTypeEnum::BIND, path.display().to_string())
                }
                MountSource::Volume(name) => (MountTypeEnum::VOLUME, name.clone()),
            };
            Ok(Mount {
                target: Some(m.target.clone()),
                source: Some(source),
                typ: Some(typ),
                read_only: Some(m.readonly),
                ..Default::default()
            })
        })
        .collect()
}

/// Creates and starts a container from `spec`. Fails if a container with
/// that name already exists; callers wanting idempotence check first.
#[instrument(skip(spec), fields(container = %spec.name, image = %spec.image))]
pub async fn run_container(spec: &RunSpec) -> Result<()> {
    let docker = connect().await?;

    if container_exists(&spec.name).await? {
        return Err(anyhow!(DdevError::DockerOperation(format!(
            "container '{}' already exists",
            spec.name
        ))));
    }

    let env_list: Vec<String> = spec.env.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
    let mounts = convert_mounts(&spec.mounts).context("Failed to prepare container mounts")?;

    let host_config = HostConfig {
        mounts: if mounts.is_empty() { None } else { Some(mounts) },
        network_mode: spec.network.clone(),
        ..Default::default()
    };

    let config = ContainerConfig {
        image: Some(spec.image.clone()),
        env: if env_list.is_empty() { None } else { Some(env_list) },
        labels: Some(spec.labels()),
        cmd: spec.cmd.clone(),
        host_config: Some(host_config),
        ..Default::default()
    };

    info!("Creating container '{}' from image '{}'", spec.name, spec.image);
    docker
        .create_container(
            Some(CreateContainerOptions {
                name: spec.name.clone(),
                platform: None,
            }),
            config,
        )
        .await
        .map_err(|e| anyhow!(DdevError::DockerApi { source: e })
            .context(format!("Failed to create container '{}'", spec.name)))?;

    start_container(&spec.name).await
}

/// Runs `cmd` inside a running container and captures its combined
/// stdout/stderr plus the exit code.
#[instrument(skip(name_or_id, cmd), fields(container = %name_or_id))]
pub async fn exec_capture(name_or_id: &str, cmd: &[String]) -> Result<(i64, String)> {
    let docker = connect().await?;
    debug!("Exec in '{}': {:?}", name_or_id, cmd);

    let exec = docker
        .create_exec(
            name_or_id,
            CreateExecOptions {
                attach_stdout: Some(true),
                attach_stderr: Some(true),
                cmd: Some(cmd.to_vec()),
                ..Default::default()
            },
        )
        .await
        .map_err(|e| match e {
            bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            } => anyhow!(DdevError::not_found("container", name_or_id, "")),
            _ => anyhow!(DdevError::DockerApi { source: e })
                .context(format!("Failed to create exec in '{}'", name_or_id)),
        })?;

    let mut collected = String::new();
    match docker
        .start_exec(&exec.id, None)
        .await
        .map_err(|e| anyhow!(DdevError::DockerApi { source: e }).context("Failed to start exec"))?
    {
        StartExecResults::Attached { mut output, .. } => {
            while let Some(chunk) = output.next().await {
                match chunk {
                    Ok(log) => collected.push_str(&log.to_string()),
                    Err(e) => {
                        return Err(anyhow!(DdevError::DockerApi { source: e })
                            .context("Error reading exec output"))
                    }
                }
            }
        }
        StartExecResults::Detached => {}
    }

    let inspect = docker
        .inspect_exec(&exec.id)
        .await
        .map_err(|e| anyhow!(DdevError::DockerApi { source: e }).context("Failed to inspect exec"))?;
    let code = inspect.exit_code.unwrap_or(-1);
    debug!("Exec in '{}' exited {}", name_or_id, code);
    Ok((code, collected))
}
