use crate::app_config::OrchestratorConfig;
use anyhow::{bail, Context, Result};
use log::{debug, info};
use std::fs;
use std::time::Instant;

pub fn load_config(path: &str) -> Result<OrchestratorConfig> {
    debug!("📄 Attempting to load config from: {}", path);
    let start_time = Instant::now();

    let config_str = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file '{}'", path))?;

    let config: OrchestratorConfig = serde_yaml::from_str(&config_str)
        .with_context(|| format!("Failed to parse YAML configuration from '{}'", path))?;

    validate_config(&config).with_context(|| "Orchestrator configuration validation failed")?;

    info!(
        "✅ Successfully loaded and validated configuration from '{}' in {:?}",
        path,
        start_time.elapsed()
    );
    Ok(config)
}

fn validate_config(config: &OrchestratorConfig) -> Result<()> {
    debug!("🕵️ Validating orchestrator configuration...");
    if config.command_timeout_secs == 0 {
        bail!("❌ command_timeout_secs must be positive; a zero bound would fail every round trip.");
    }
    if config.default_output_width == 0 || config.default_output_height == 0 {
        bail!(
            "❌ Default stitch output resolution {}x{} is not positive.",
            config.default_output_width,
            config.default_output_height
        );
    }
    if config.download_directory.is_empty() {
        bail!("❌ download_directory cannot be empty.");
    }
    debug!("👍 Orchestrator configuration validated successfully.");
    Ok(())
}
