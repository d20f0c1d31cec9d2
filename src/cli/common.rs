//! Shared CLI helpers used across multiple command handlers.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use switchboard::config::Config;

/// Expand `~/` prefix to the user's home directory.
pub(crate) fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}

/// Load `.env`, then the config file (explicit path or default) with
/// environment overrides, and validate it.
pub(crate) fn load_config(path: Option<&Path>) -> Result<Config> {
    // A missing .env file is normal.
    let _ = dotenvy::dotenv();

    let config = match path {
        Some(path) => {
            let path = expand_tilde(path);
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            Config::load_from_path(&path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?
        }
        None => Config::load().with_context(|| "Failed to load config")?,
    };

    config.validate().with_context(|| "Invalid configuration")?;
    Ok(config)
}
