//! Configuration loading utilities for CLI commands

use anyhow::{Context, Result};
use fogmap_core::config::{CliConfigOverrides, LayeredConfig};
use std::path::Path;

/// Load layered configuration from `<data_dir>/config.toml` (if present)
/// and the environment
pub fn load_config(data_dir: &Path) -> Result<LayeredConfig> {
    let config_path = data_dir.join("config.toml");

    let mut config = LayeredConfig::with_defaults();
    if config_path.exists() {
        config = config
            .load_from_file(&config_path)
            .with_context(|| format!("Failed to load {}", config_path.display()))?;
    }

    Ok(config.load_from_env())
}

/// Load layered configuration with CLI overrides
pub fn load_config_with_overrides(
    data_dir: &Path,
    overrides: CliConfigOverrides,
) -> Result<LayeredConfig> {
    let mut config = load_config(data_dir)?;
    config.update_from_cli(overrides);
    Ok(config)
}
