use crate::output::print_json;
use anyhow::Context;
use dbdeploy_core::config::{DeployConfig, WarnLevel};
use std::path::Path;

pub fn run(config_path: &Path, json: bool) -> anyhow::Result<()> {
    let config = DeployConfig::load(config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    let warnings = config.validate();
    let errors = warnings
        .iter()
        .filter(|w| w.level == WarnLevel::Error)
        .count();

    if json {
        print_json(&serde_json::json!({
            "ok": errors == 0,
            "warnings": warnings,
        }))?;
    } else if warnings.is_empty() {
        println!("{}: ok", config_path.display());
    } else {
        for w in &warnings {
            let tag = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{tag}] {}", w.message);
        }
    }

    if errors > 0 {
        anyhow::bail!("{errors} error(s) in {}", config_path.display());
    }
    Ok(())
}
