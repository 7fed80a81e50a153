pub mod clean;
pub mod cut;
pub mod direct;
pub mod docker;
pub mod unix_http;

use std::path::{Path, PathBuf};

use anyhow::Context as _;

pub use clean::KubeConfig;
pub use cut::{rewrite, select, CutError, API_SERVER_PORT};
pub use docker::{resolve_address, ContainerRuntime, DockerClient, DockerError};

pub fn kube_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME").context("failed to get user home dir")?;
    Ok(Path::new(&home).join(".kube"))
}
