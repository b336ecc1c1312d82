pub mod chat;
pub mod doctor;
pub mod ingest;
pub mod onboard;
pub mod serve;

use std::path::Path;

use rallycoach_config::AppConfig;

/// Load config from `--config` if given, else the default location.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => AppConfig::load_with_env(path),
        None => AppConfig::load(),
    };
    let config = config.map_err(|e| format!("Failed to load config: {e}"))?;
    tracing::debug!(config = ?config, "Configuration loaded");
    Ok(config)
}
