//! Configuration management for the application.
//!
//! Configuration lives in a TOML file in the platform config directory and
//! covers storage locations, server binding, and the external AI service.
//! The AI credential is resolved once at startup: the `GEMINI_API_KEY`
//! environment variable overrides the config file value, and its absence
//! disables the intake channel without affecting catalog operations.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Environment variable consulted for the AI credential.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Server binding configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// Storage locations. Unset paths resolve under the config directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database file path.
    pub database: Option<PathBuf>,
    /// Directory for uploaded icon files.
    pub icons_dir: Option<PathBuf>,
}

/// External AI service configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Model identifier (e.g. "gemini-1.5-flash").
    pub model: String,
    /// API credential. The `GEMINI_API_KEY` environment variable takes
    /// precedence over this value.
    pub api_key: Option<String>,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            model: "gemini-1.5-flash".to_string(),
            api_key: None,
        }
    }
}

impl AiConfig {
    /// Resolves the credential, preferring the environment variable.
    ///
    /// Returns `None` when neither source provides a non-empty value.
    #[must_use]
    pub fn resolve_api_key(&self) -> Option<String> {
        Self::pick_api_key(std::env::var(API_KEY_ENV).ok(), self.api_key.as_deref())
    }

    fn pick_api_key(env_value: Option<String>, file_value: Option<&str>) -> Option<String> {
        env_value
            .filter(|v| !v.is_empty())
            .or_else(|| file_value.filter(|v| !v.is_empty()).map(ToString::to_string))
    }
}

/// Application configuration.
///
/// # File Location
///
/// - Linux: `~/.config/Stockroom/config.toml`
/// - macOS: `~/Library/Application Support/Stockroom/config.toml`
/// - Windows: `%APPDATA%\Stockroom\config.toml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Server binding.
    pub server: ServerConfig,
    /// Storage locations.
    pub storage: StorageConfig,
    /// External AI service settings.
    pub ai: AiConfig,
}

impl Config {
    /// Gets the platform-specific config directory path.
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to determine config directory")?
            .join("Stockroom");

        Ok(config_dir)
    }

    /// Gets the full path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Loads configuration from the config file.
    ///
    /// If the file doesn't exist, returns default configuration.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_file_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).context(format!(
            "Failed to read config file: {}",
            config_path.display()
        ))?;

        let config: Self = toml::from_str(&content).context(format!(
            "Failed to parse config file: {}",
            config_path.display()
        ))?;

        config.validate()?;
        Ok(config)
    }

    /// Saves configuration to the config file using atomic write.
    ///
    /// Uses temp file + rename pattern so a crash never leaves a truncated
    /// config behind.
    pub fn save(&self) -> Result<()> {
        self.validate()?;

        let config_dir = Self::config_dir()?;
        fs::create_dir_all(&config_dir).context(format!(
            "Failed to create config directory: {}",
            config_dir.display()
        ))?;

        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        let config_path = Self::config_file_path()?;
        let temp_path = config_path.with_extension("toml.tmp");

        fs::write(&temp_path, content).context(format!(
            "Failed to write temp config file: {}",
            temp_path.display()
        ))?;

        fs::rename(&temp_path, &config_path).context(format!(
            "Failed to move config file into place: {}",
            config_path.display()
        ))?;

        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.ai.model.is_empty() {
            anyhow::bail!("ai.model cannot be empty");
        }
        if self.server.host.is_empty() {
            anyhow::bail!("server.host cannot be empty");
        }
        Ok(())
    }

    /// Resolves the database file path, defaulting under the config dir.
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.storage.database {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::config_dir()?.join("stockroom.db")),
        }
    }

    /// Resolves the icon upload directory, defaulting under the config dir.
    pub fn icons_dir(&self) -> Result<PathBuf> {
        match &self.storage.icons_dir {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::config_dir()?.join("icons")),
        }
    }
}
