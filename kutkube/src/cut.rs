//! Cutting a kubeconfig down to a single context and repointing its
//! api-server endpoint.

use thiserror::Error;
use tracing::debug;

use crate::clean::KubeConfig;

/// Default secured port of the api-server inside the control-plane
/// container. The port from the input kubeconfig is discarded on rewrite.
pub const API_SERVER_PORT: u16 = 6443;

#[derive(Debug, Error)]
pub enum CutError {
    #[error("no such context in kubeconfig: {0}")]
    ContextNotFound(String),
    /// The context referenced a cluster entry that is not in the document.
    #[error("no cluster entry for context: {0}")]
    ClusterNotFound(String),
}

/// Prune `kc` down to the entries belonging to `context`.
///
/// kind names the cluster and user entries after the context, so all three
/// mappings are pruned by the context name itself. A mapping that has no
/// entry under that name ends up empty rather than failing; only the
/// context mapping is checked.
pub fn select(kc: &mut KubeConfig, context: &str) -> Result<(), CutError> {
    if !kc.contexts.contains_key(context) {
        return Err(CutError::ContextNotFound(context.to_owned()));
    }

    kc.contexts.retain(|name, _| name == context);
    kc.clusters.retain(|name, _| name == context);
    kc.users.retain(|name, _| name == context);
    kc.current_context = context.to_owned();

    debug!(%context, "pruned kubeconfig to a single context");
    Ok(())
}

/// Point the selected cluster's server at `address`, on the default
/// api-server port. The address is taken as-is from the resolver.
pub fn rewrite(kc: &mut KubeConfig, context: &str, address: &str) -> Result<(), CutError> {
    let cluster = kc
        .clusters
        .get_mut(context)
        .ok_or_else(|| CutError::ClusterNotFound(context.to_owned()))?;

    cluster.server = format!("https://{address}:{API_SERVER_PORT}");
    Ok(())
}
