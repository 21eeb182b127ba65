//! Configuration loading for agentbus.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Get the agentbus home directory (~/.agentbus).
pub fn get_home_dir() -> Result<PathBuf> {
    let home = directories::UserDirs::new()
        .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

    Ok(home.home_dir().join(".agentbus"))
}

/// Get the settings file path.
pub fn get_settings_path() -> Result<PathBuf> {
    Ok(get_home_dir()?.join("settings.json"))
}

/// Application settings.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Settings {
    /// Deployment environment name ("development", "production")
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Verbose diagnostics toggle
    #[serde(default = "default_debug")]
    pub debug: bool,

    /// Bound applied by `send_with_timeout` callers (seconds)
    #[serde(default = "default_message_timeout_secs")]
    pub message_timeout_secs: u64,
}

impl Settings {
    /// The message timeout as a `Duration`.
    pub fn message_timeout(&self) -> Duration {
        Duration::from_secs(self.message_timeout_secs)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            debug: default_debug(),
            message_timeout_secs: default_message_timeout_secs(),
        }
    }
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_debug() -> bool {
    true
}

fn default_message_timeout_secs() -> u64 {
    30
}

/// Load settings from ~/.agentbus/settings.json.
pub fn load_settings() -> Result<Settings> {
    let path = get_settings_path()?;

    if !path.exists() {
        return Err(Error::Config(format!(
            "Settings file not found at {}",
            path.display()
        )));
    }

    load_settings_from(&path)
}

/// Load settings from an explicit path.
pub fn load_settings_from(path: &Path) -> Result<Settings> {
    let content = std::fs::read_to_string(path)?;
    let settings: Settings = serde_json::from_str(&content)?;

    validate_settings(&settings)?;

    tracing::debug!("Loaded settings from {}", path.display());
    Ok(settings)
}

/// Load settings or return defaults if the file is absent or invalid.
pub fn load_settings_or_default() -> Settings {
    load_settings().unwrap_or_else(|e| {
        tracing::debug!("Falling back to default settings: {}", e);
        Settings::default()
    })
}

fn validate_settings(settings: &Settings) -> Result<()> {
    if settings.message_timeout_secs == 0 {
        return Err(Error::Config(
            "message_timeout_secs must be greater than zero".to_string(),
        ));
    }
    Ok(())
}
