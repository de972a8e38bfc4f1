use std::path::Path;

use anyhow::Context;
use spark_verify::{NotificationRequest, VerifierConfig};

use super::args::*;

pub mod canonicalize;
pub mod fetch_cert;
pub mod validate;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    let config = config_from_cli(&cli);
    match cli.cmd {
        Command::Canonicalize(args) => canonicalize::run(args).await,
        Command::Validate(args) => validate::run(args, &config).await,
        Command::FetchCert(args) => fetch_cert::run(args, &config).await,
    }
}

/// Environment config with command-line overrides applied.
fn config_from_cli(cli: &Cli) -> VerifierConfig {
    let mut config = VerifierConfig::from_env();
    if let Some(dir) = &cli.cert_dir {
        config = config.with_cert_dir(dir);
    }
    if let Some(host) = &cli.host {
        config = config.with_host(host);
    }
    config
}

pub(crate) async fn read_request(path: &Path) -> anyhow::Result<NotificationRequest> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid request file {}", path.display()))
}
