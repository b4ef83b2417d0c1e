use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub tvdb: TvdbConfig,

    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// SQLite file path, or a connection URL when it contains `://`.
    pub database_path: String,

    pub log_level: String,

    /// User-Agent sent with every outbound request.
    pub agent: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        let database_path = dirs::data_dir()
            .map(|dir| dir.join("episoder").join("episodes.db"))
            .unwrap_or_else(|| PathBuf::from("episodes.db"))
            .to_string_lossy()
            .into_owned();

        Self {
            database_path,
            log_level: "info".to_string(),
            agent: concat!("episoder/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TvdbConfig {
    pub api_key: Option<String>,

    pub base_url: String,
}

impl Default for TvdbConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: crate::sources::tvdb::DEFAULT_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// How many days ahead `list` looks by default.
    pub days: u64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { days: 2 }
    }
}

impl Config {
    /// First existing file on the search path, if any.
    #[must_use]
    pub fn find_path() -> Option<PathBuf> {
        Self::config_paths().into_iter().find(|path| path.exists())
    }

    /// Loads `path`, or the defaults when there is no file to load.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::load_from_path)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("episoder.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("episoder").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".episoder").join("config.toml"));
        }

        paths
    }

    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir().map_or_else(
            || PathBuf::from("episoder.toml"),
            |dir| dir.join("episoder").join("config.toml"),
        )
    }

    /// Writes a default config to `path` unless one is already there.
    pub fn create_default_if_missing(path: &Path) -> Result<bool> {
        if path.exists() {
            Ok(false)
        } else {
            Self::default().save_to_path(path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.general.agent.trim().is_empty() {
            anyhow::bail!("general.agent cannot be empty");
        }

        if self.general.database_path.trim().is_empty() {
            anyhow::bail!("general.database_path cannot be empty");
        }

        if self.tvdb.base_url.trim().is_empty() {
            anyhow::bail!("tvdb.base_url cannot be empty");
        }

        Ok(())
    }
}
