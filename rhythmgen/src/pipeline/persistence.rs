// Reads generation configs from JSON. Keys left out of the file keep
// their defaults; a broken file is the caller's call to recover from.
use std::path::Path;

use anyhow::Context;

use crate::pipeline::project::GenerationConfig;

pub fn load_config(path: &Path) -> anyhow::Result<GenerationConfig> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config = serde_json::from_str(&data)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    Ok(config)
}

// falls back to defaults, never fails
pub fn load_config_or_default(path: Option<&Path>) -> GenerationConfig {
    let Some(path) = path else {
        return GenerationConfig::default();
    };
    match load_config(path) {
        Ok(config) => {
            tracing::info!("loaded config from {}", path.display());
            config
        }
        Err(e) => {
            tracing::error!("{:#}, using defaults", e);
            GenerationConfig::default()
        }
    }
}
