use anyhow::Context;
use dbdeploy_core::config::{DeployConfig, CONNECTION_STRING_ENV};
use std::path::Path;

use super::deploy;

/// Execute the action described by a deployment config file.
pub fn run(config_path: &Path) -> anyhow::Result<()> {
    let config = DeployConfig::load(config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    tracing::debug!(?config, "loaded config");

    let fallback = std::env::var(CONNECTION_STRING_ENV).ok();
    let inputs = config.into_inputs(fallback)?;
    deploy::execute(config.locator(), &inputs)
}
