use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_TITLE_MODEL: &str = "gpt-4.1-nano";
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_TITLE_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Unable to resolve home directory; set HOPPER_HOME to an absolute path")]
    NoHome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HopperConfig {
    #[serde(default)]
    pub title: TitleConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleConfig {
    /// false forces truncated-description titles even when an API key exists.
    pub enabled: Option<bool>,
    pub model: Option<String>,
    pub api_base: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Everything the title generator needs, with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleSettings {
    pub enabled: bool,
    pub api_key: Option<String>,
    pub model: String,
    pub api_base: String,
    pub timeout: Duration,
}

impl TitleSettings {
    pub fn resolve(config: &TitleConfig, api_key: Option<String>) -> Self {
        Self {
            enabled: config.enabled.unwrap_or(true),
            api_key: api_key
                .map(|key| key.trim().to_string())
                .filter(|key| !key.is_empty()),
            model: config
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_TITLE_MODEL.to_string()),
            api_base: config
                .api_base
                .clone()
                .map(|base| base.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            timeout: Duration::from_secs(
                config.timeout_secs.unwrap_or(DEFAULT_TITLE_TIMEOUT_SECS),
            ),
        }
    }

    pub fn from_env(config: &TitleConfig) -> Self {
        Self::resolve(config, std::env::var("OPENAI_API_KEY").ok())
    }
}

pub fn config_path(home: &Path) -> PathBuf {
    home.join("config.toml")
}

pub fn resolve_user_home_dir() -> Option<PathBuf> {
    if let Ok(home) = std::env::var("HOME") {
        let trimmed = home.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }
    if let Ok(profile) = std::env::var("USERPROFILE") {
        let trimmed = profile.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }
    None
}

/// `HOPPER_HOME` if set, otherwise `~/.hopper`.
pub fn resolve_hopper_home() -> Result<PathBuf, ConfigError> {
    if let Ok(value) = std::env::var("HOPPER_HOME") {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            return Ok(PathBuf::from(trimmed));
        }
    }
    resolve_user_home_dir()
        .map(|home| home.join(".hopper"))
        .ok_or(ConfigError::NoHome)
}

/// Missing or unparsable config falls back to defaults.
pub fn load_config(home: &Path) -> HopperConfig {
    let path = config_path(home);
    if !path.is_file() {
        return HopperConfig::default();
    }
    match fs::read_to_string(&path) {
        Ok(text) => match toml::from_str::<HopperConfig>(&text) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "ignoring invalid config");
                HopperConfig::default()
            }
        },
        Err(_) => HopperConfig::default(),
    }
}

pub fn write_config(home: &Path, config: &HopperConfig) -> Result<PathBuf, ConfigError> {
    fs::create_dir_all(home)?;
    let path = config_path(home);
    let body = toml::to_string_pretty(config)?;
    fs::write(&path, body)?;
    Ok(path)
}
