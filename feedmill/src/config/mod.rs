//! Configuration file handling for `~/.feedmill/config.ini`.
//!
//! Loads and saves user configuration with sensible defaults: a missing
//! file yields the defaults, malformed values are reported with their
//! section and key.

use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

use crate::agent::{DEFAULT_MAX_CONCURRENT_TASKS, DEFAULT_TASK_CHANNEL_CAPACITY};

/// Default log directory, relative to the working directory.
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Default log file name.
pub const DEFAULT_LOG_FILE: &str = "feedmill.log";

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Failed to write config file
    #[error("Failed to write config file: {0}")]
    WriteError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Failed to create config directory
    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

/// Settings for the agent dispatcher, `[agent]` section.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentSettings {
    pub max_concurrent_tasks: usize,
    pub task_channel_capacity: usize,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_concurrent_tasks: DEFAULT_MAX_CONCURRENT_TASKS,
            task_channel_capacity: DEFAULT_TASK_CHANNEL_CAPACITY,
        }
    }
}

/// Settings for log output, `[logging]` section.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggingSettings {
    pub dir: String,
    pub file: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            dir: DEFAULT_LOG_DIR.to_string(),
            file: DEFAULT_LOG_FILE.to_string(),
        }
    }
}

/// The user configuration file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub agent: AgentSettings,
    pub logging: LoggingSettings,
}

impl ConfigFile {
    /// Load configuration from the default path (`~/.feedmill/config.ini`).
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        Self::parse_ini(&ini)
    }

    fn parse_ini(ini: &Ini) -> Result<Self, ConfigFileError> {
        let mut config = Self::default();

        if let Some(value) = ini.get_from(Some("agent"), "max_concurrent_tasks") {
            config.agent.max_concurrent_tasks =
                parse_positive("agent", "max_concurrent_tasks", value)?;
        }
        if let Some(value) = ini.get_from(Some("agent"), "task_channel_capacity") {
            config.agent.task_channel_capacity =
                parse_positive("agent", "task_channel_capacity", value)?;
        }
        if let Some(value) = ini.get_from(Some("logging"), "dir") {
            config.logging.dir = value.to_string();
        }
        if let Some(value) = ini.get_from(Some("logging"), "file") {
            config.logging.file = value.to_string();
        }

        Ok(config)
    }

    /// Save configuration to the default path.
    pub fn save(&self) -> Result<(), ConfigFileError> {
        self.save_to(&config_file_path())
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }

        let mut ini = Ini::new();
        ini.with_section(Some("agent"))
            .set(
                "max_concurrent_tasks",
                self.agent.max_concurrent_tasks.to_string(),
            )
            .set(
                "task_channel_capacity",
                self.agent.task_channel_capacity.to_string(),
            );
        ini.with_section(Some("logging"))
            .set("dir", self.logging.dir.clone())
            .set("file", self.logging.file.clone());

        ini.write_to_file(path)
            .map_err(|e| ConfigFileError::WriteError(e.to_string()))
    }

    /// Create the default config file if it doesn't exist.
    ///
    /// Returns the path to the config file.
    pub fn ensure_exists() -> Result<PathBuf, ConfigFileError> {
        let path = config_file_path();
        if !path.exists() {
            Self::default().save_to(&path)?;
        }
        Ok(path)
    }
}

fn parse_positive(section: &str, key: &str, value: &str) -> Result<usize, ConfigFileError> {
    let invalid = |reason: &str| ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    };

    let parsed: usize = value.trim().parse().map_err(|_| invalid("not a number"))?;
    if parsed == 0 {
        return Err(invalid("must be at least 1"));
    }
    Ok(parsed)
}

/// Get the path to the config directory (`~/.feedmill`).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".feedmill")
}

/// Get the path to the config file (`~/.feedmill/config.ini`).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}
