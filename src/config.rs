use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::ReloadStrategy;

/// Backend configuration, read from `dialogue.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Default database location used when no explicit location is given
    pub database: PathBuf,
    pub busy_timeout_ms: u64,
    pub reload_strategy: ReloadStrategy,
    /// Create missing tables when the backend opens
    pub create_schema: bool,
    /// Indent the JSON written to the `Elements` column
    pub pretty_elements: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database: default_database_path(),
            busy_timeout_ms: 5_000,
            reload_strategy: ReloadStrategy::Swap,
            create_schema: true,
            pretty_elements: true,
        }
    }
}

impl StoreConfig {
    pub fn with_database(database: impl Into<PathBuf>) -> Self {
        Self {
            database: database.into(),
            ..Self::default()
        }
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("dialogue.toml")
}

pub fn default_database_path() -> PathBuf {
    PathBuf::from("dialogue.db")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<StoreConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: StoreConfig = toml::from_str(&contents)?;
    tracing::debug!("Loaded config from {}", path.display());
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &StoreConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
