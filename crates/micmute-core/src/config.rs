//! Configuration management for micmute.
//!
//! The configuration holds a single key: the global keybinding that toggles
//! the microphone. The string is parsed into a hotkey by the tray application
//! so this crate does not depend on any platform hotkey library.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::APP_NAME;

/// Default keybinding for toggling the microphone.
pub const DEFAULT_KEYBINDING: &str = "super+Backquote";

fn default_keybinding() -> String {
    DEFAULT_KEYBINDING.to_owned()
}

/// Core configuration structure for the application.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Hotkey toggling the microphone.
    /// Format: "modifier+modifier+key" e.g., "super+Backquote"
    #[serde(rename = "keybinding-toggle-mute", default = "default_keybinding")]
    pub keybinding_toggle_mute: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            keybinding_toggle_mute: default_keybinding(),
        }
    }
}

impl Config {
    /// Get the keybinding string
    pub fn keybinding(&self) -> &str {
        &self.keybinding_toggle_mute
    }

    /// Set a new keybinding string
    pub fn set_keybinding(&mut self, keybinding: &str) {
        self.keybinding_toggle_mute = keybinding.to_owned();
    }
}

/// Manages loading and saving configuration files.
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Creates a new ConfigManager with the default configuration directory.
    pub fn new() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        Ok(Self { config_path })
    }

    /// Creates a new ConfigManager with a specified configuration directory.
    pub fn with_config_dir<P: AsRef<std::path::Path>>(dir: P) -> Self {
        let config_path = dir.as_ref().join(format!("{}.toml", APP_NAME));
        Self { config_path }
    }

    /// Returns the default path to the configuration file.
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = config_dir().context("Failed to retrieve configuration directory")?;
        Ok(config_dir.join(APP_NAME).join(format!("{}.toml", APP_NAME)))
    }

    /// Loads the configuration from the config file or returns default.
    pub fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            debug!(path = ?self.config_path, "No config file, using defaults");
            return Ok(Config::default());
        }

        let config_content = fs::read_to_string(&self.config_path)
            .with_context(|| format!("Failed to read config file at {:?}", self.config_path))?;

        let config: Config = toml::from_str(&config_content)
            .with_context(|| format!("Failed to parse config file at {:?}", self.config_path))?;

        Ok(config)
    }

    /// Saves the configuration to the config file.
    pub fn save(&self, config: &Config) -> Result<()> {
        let config_dir = self
            .config_path
            .parent()
            .with_context(|| format!("Failed to get parent directory of {:?}", self.config_path))?;

        fs::create_dir_all(config_dir)
            .with_context(|| format!("Failed to create config directory at {:?}", config_dir))?;

        let serialized =
            toml::to_string_pretty(&config).context("Failed to serialize configuration")?;

        fs::write(&self.config_path, serialized)
            .with_context(|| format!("Failed to write config file at {:?}", self.config_path))?;

        Ok(())
    }

    /// Returns the path to the configuration file.
    pub fn config_path(&self) -> &std::path::Path {
        &self.config_path
    }
}
