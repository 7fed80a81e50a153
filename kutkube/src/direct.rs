//! The kubeconfig as it sits on disk: list-shaped mappings of named entries.
//! Use [`crate::clean`] for anything that needs to look entries up by name.

use std::{fs, path::Path, path::PathBuf};

use anyhow::Context as _;
use serde::*;
use serde_yaml::Value as YamlValue;

// region: Context
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct ContextSpec {
    pub user: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub cluster: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<YamlValue>,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct Context {
    pub name: String,
    pub context: ContextSpec,
}
// endregion

// region: Cluster
/// Trust material is carried through untouched; only `server` is ever
/// rewritten by this crate.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ClusterSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_authority_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_authority: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insecure_skip_tls_verify: Option<YamlValue>,
    pub server: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<YamlValue>,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Cluster {
    pub name: String,
    pub cluster: ClusterSpec,
}
// endregion

// region: User
/// Credential bundle, opaque to this crate.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields, untagged)]
pub enum UserSpec {
    Token {
        token: String,
    },
    #[serde(rename_all = "kebab-case")]
    Cert {
        #[serde(skip_serializing_if = "Option::is_none")]
        client_certificate: Option<PathBuf>,
        #[serde(skip_serializing_if = "Option::is_none")]
        client_certificate_data: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        client_key: Option<PathBuf>,
        #[serde(skip_serializing_if = "Option::is_none")]
        client_key_data: Option<String>,
    },
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct User {
    pub name: String,
    pub user: UserSpec,
}
// endregion

// region: Common
#[derive(Serialize, Deserialize, Debug)]
pub enum ApiVersion {
    #[serde(rename = "v1")]
    V1,
}

#[derive(Serialize, Deserialize, Debug)]
pub enum Kind {
    Config,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct KubeConfig {
    pub kind: Kind,
    #[serde(rename = "apiVersion")]
    pub api_version: ApiVersion,
    pub contexts: Vec<Context>,
    pub current_context: String,
    pub clusters: Vec<Cluster>,
    pub preferences: serde_yaml::Value,
    pub users: Vec<User>,
}

impl KubeConfig {
    pub fn read_from(path: impl AsRef<Path>) -> anyhow::Result<KubeConfig> {
        Ok(serde_yaml::from_reader(
            fs::OpenOptions::new()
                .read(true)
                .open(path)
                .context("Opening kube config")?,
        )
        .context("Parsing kube config")?)
    }
}
// endregion
