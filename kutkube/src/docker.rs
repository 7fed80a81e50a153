//! The one thing we need from the docker daemon: the IP a kind
//! control-plane container was given on the `kind` network.

use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use crate::unix_http::{self, HttpError};

pub const DEFAULT_SOCKET: &str = "/var/run/docker.sock";

/// Docker network kind attaches its node containers to.
pub const KIND_NETWORK: &str = "kind";

const KIND_CONTEXT_PREFIX: &str = "kind-";

#[derive(Debug, Error)]
pub enum DockerError {
    #[error("unsupported docker host '{0}': only unix:// endpoints are supported")]
    UnsupportedHost(String),
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error("docker daemon returned status {status}: {message}")]
    Api { status: u16, message: String },
    #[error("failed to decode docker response: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no running container named {0}")]
    NoSuchContainer(String),
    #[error("container {container} has no network named {network}")]
    NetworkNotFound { container: String, network: String },
}

// region: Engine API response model
/// One element of a `/containers/json` listing, cut down to the fields we
/// read. Unknown fields are ignored on purpose; the daemon sends many.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerSummary {
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub network_settings: NetworkSettings,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "PascalCase")]
pub struct NetworkSettings {
    #[serde(default)]
    pub networks: BTreeMap<String, EndpointSettings>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct EndpointSettings {
    #[serde(rename = "IPAddress", default)]
    pub ip_address: String,
}
// endregion

/// The runtime query the resolver needs, kept behind a trait so tests can
/// substitute a canned runtime.
pub trait ContainerRuntime {
    /// List running containers whose name matches `name`.
    fn list_running(&self, name: &str) -> Result<Vec<ContainerSummary>, DockerError>;
}

/// Client for the docker daemon's local unix socket.
#[derive(Debug, Clone)]
pub struct DockerClient {
    socket: PathBuf,
}

impl DockerClient {
    /// Connection details come from the ambient environment, the way the
    /// stock docker clients read `DOCKER_HOST`.
    pub fn from_env() -> Result<Self, DockerError> {
        match env::var("DOCKER_HOST") {
            Ok(host) if !host.is_empty() => {
                let path = host
                    .strip_prefix("unix://")
                    .ok_or_else(|| DockerError::UnsupportedHost(host.clone()))?;
                Ok(Self::new(PathBuf::from(path)))
            }
            _ => Ok(Self::new(PathBuf::from(DEFAULT_SOCKET))),
        }
    }

    pub fn new(socket: PathBuf) -> Self {
        Self { socket }
    }
}

impl ContainerRuntime for DockerClient {
    fn list_running(&self, name: &str) -> Result<Vec<ContainerSummary>, DockerError> {
        let filters = json!({ "name": [name], "status": ["running"] }).to_string();
        let path = format!(
            "/containers/json?filters={}",
            utf8_percent_encode(&filters, NON_ALPHANUMERIC)
        );

        debug!(socket = %self.socket.display(), %path, "querying docker daemon");
        let response = unix_http::get(&self.socket, &path)?;
        if response.status != 200 {
            return Err(DockerError::Api {
                status: response.status,
                message: String::from_utf8_lossy(&response.body).trim().to_owned(),
            });
        }

        Ok(serde_json::from_slice(&response.body)?)
    }
}

/// Name of the control-plane container kind runs for a cluster,
/// e.g. `kind-kind2` to `kind2-control-plane`.
pub fn control_plane_name(context: &str) -> String {
    let cluster = context.strip_prefix(KIND_CONTEXT_PREFIX).unwrap_or(context);
    format!("{cluster}-control-plane")
}

/// Resolve the api-server address for `context`: find the running
/// control-plane container and take its IP on the `kind` network.
pub fn resolve_address(
    runtime: &impl ContainerRuntime,
    context: &str,
) -> Result<String, DockerError> {
    let name = control_plane_name(context);
    let containers = runtime.list_running(&name)?;

    // The daemon's name filter matches substrings; insist on the exact
    // container name (the daemon reports names with a leading slash).
    let container = containers
        .into_iter()
        .find(|c| c.names.iter().any(|n| n.trim_start_matches('/') == name))
        .ok_or_else(|| DockerError::NoSuchContainer(name.clone()))?;

    let endpoint = container
        .network_settings
        .networks
        .get(KIND_NETWORK)
        .ok_or_else(|| DockerError::NetworkNotFound {
            container: name.clone(),
            network: KIND_NETWORK.to_owned(),
        })?;

    debug!(container = %name, address = %endpoint.ip_address, "resolved control-plane address");
    Ok(endpoint.ip_address.clone())
}
