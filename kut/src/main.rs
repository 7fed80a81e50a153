use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use kutkube::docker::{resolve_address, DockerClient};
use kutkube::{clean, cut, direct, kube_dir};

/// Cut out a self-contained kubeconfig of a kind cluster and replace the
/// endpoint of api-server with docker container IP and default port.
#[derive(Parser)]
#[clap(name = "kut", about = "Cut out a self-contained kubeconfig")]
struct Args {
    /// Target context.
    #[clap(short, long, forbid_empty_values = true)]
    context: String,

    /// Path to input kubeconfig (first the flag, then env KUBECONFIG, at
    /// last ~/.kube/config).
    #[clap(short, long)]
    kubeconfig: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let path = kubeconfig_path(args.kubeconfig).context("failed to get kubeconfig path")?;
    let mut config = clean::load(&path).context("failed to load the kubeconfig")?;

    cut::select(&mut config, &args.context)?;

    let docker = DockerClient::from_env().context("failed to create the docker client")?;
    let address = resolve_address(&docker, &args.context)
        .context("failed to resolve the api-server address")?;
    cut::rewrite(&mut config, &args.context, &address)?;

    serde_yaml::to_writer(std::io::stdout(), &direct::KubeConfig::from(config))
        .context("failed to serialize the kubeconfig to yaml")?;

    Ok(())
}

fn kubeconfig_path(flag: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    let path = match flag {
        Some(path) => path,
        None => match std::env::var("KUBECONFIG") {
            Ok(path) if !path.is_empty() => PathBuf::from(path),
            _ => kube_dir()?.join("config"),
        },
    };
    expand_tilde(path)
}

// `~` is replaced wherever it occurs, not only at the front.
fn expand_tilde(path: PathBuf) -> anyhow::Result<PathBuf> {
    let raw = path.to_string_lossy();
    if !raw.contains('~') {
        return Ok(path);
    }
    let home = std::env::var("HOME").context("failed to get user home dir")?;
    Ok(PathBuf::from(raw.replace('~', &home)))
}

#[cfg(test)]
mod tests {
    use super::expand_tilde;
    use std::path::PathBuf;

    #[test]
    fn expands_tilde_against_home() {
        std::env::set_var("HOME", "/home/someone");

        let expanded = expand_tilde(PathBuf::from("~/.kube/config")).unwrap();
        assert_eq!(expanded, PathBuf::from("/home/someone/.kube/config"));

        let untouched = expand_tilde(PathBuf::from("/etc/kubeconfig")).unwrap();
        assert_eq!(untouched, PathBuf::from("/etc/kubeconfig"));
    }
}
