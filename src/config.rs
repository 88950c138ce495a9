use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE: &str = "config.json";
const APP_DIR: &str = "tasklist";

/// Runtime settings, stored as pretty JSON in `<data_dir>/config.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where tasks, logs and the config file live
    pub data_dir: PathBuf,
    /// trace|debug|info|warn|error
    pub log_level: String,
    /// How long a notification stays visible
    pub notification_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: crate::logging::default_log_level().to_string(),
            notification_ms: 3000,
        }
    }
}

impl Config {
    /// Reads `<data_dir>/config.json`, falling back to defaults when absent.
    ///
    /// `data_dir` in the result is always the directory the file was read from.
    pub fn load_from(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(CONFIG_FILE);
        let mut config = if path.exists() {
            let content = fs::read_to_string(&path)?;
            serde_json::from_str::<Config>(&content)
                .map_err(|err| AppError::Config(format!("{}: {err}", path.display())))?
        } else {
            Config::default()
        };
        config.data_dir = data_dir.to_path_buf();
        Ok(config)
    }

    /// Resolves the effective config from optional CLI overrides.
    pub fn resolve(data_dir: Option<PathBuf>, log_level: Option<String>) -> Result<Self> {
        let dir = data_dir.unwrap_or_else(default_data_dir);
        let mut config = Self::load_from(&dir)?;
        if let Some(level) = log_level {
            config.log_level = level;
        }
        Ok(config)
    }

    /// Writes the default config file unless one exists. Returns whether it wrote.
    pub fn init(data_dir: &Path) -> Result<bool> {
        let path = data_dir.join(CONFIG_FILE);
        if path.exists() {
            return Ok(false);
        }
        let config = Config {
            data_dir: data_dir.to_path_buf(),
            ..Config::default()
        };
        fs::create_dir_all(data_dir)?;
        fs::write(path, serde_json::to_string_pretty(&config)?)?;
        Ok(true)
    }

    pub fn notification_duration(&self) -> Duration {
        Duration::from_millis(self.notification_ms)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(".tasklist"))
}
