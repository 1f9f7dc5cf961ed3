//! Configuration loader for ClubHub.
//!
//! Reads `config.toml` from the data directory (`~/.clubhub/` in production)
//! and deserializes it into [`AppConfig`]. Falls back to defaults when the
//! file is missing or malformed.

use std::path::{Path, PathBuf};

use clubhub_types::config::AppConfig;

/// Environment variable overriding the data directory.
pub const HOME_ENV: &str = "CLUBHUB_HOME";

/// Resolve the data directory: `$CLUBHUB_HOME`, else `~/.clubhub`.
pub fn data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(HOME_ENV) {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".clubhub")
}

/// Load configuration from `{data_dir}/config.toml`.
///
/// - Missing file: [`AppConfig::default()`].
/// - Unreadable or unparsable file: logs a warning and returns the default.
pub async fn load_config(data_dir: &Path) -> AppConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return AppConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return AppConfig::default();
        }
    };

    match toml::from_str::<AppConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            AppConfig::default()
        }
    }
}

/// SQLite URL: the configured one, else `sqlite://{data_dir}/clubhub.db?mode=rwc`.
pub fn database_url(config: &AppConfig, data_dir: &Path) -> String {
    match config.database.url.as_deref() {
        Some(url) if !url.trim().is_empty() => url.to_string(),
        _ => format!(
            "sqlite://{}?mode=rwc",
            data_dir.join("clubhub.db").display()
        ),
    }
}
