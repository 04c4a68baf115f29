use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::parsers::{DEFAULT_LINE_TERMINATOR, LogParser};

/// Name the configuration is stored under.
pub const APP_NAME: &str = "hearthwatch";

const DEFAULT_DEBOUNCE_MS: u64 = 100;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration store: {0}")]
    Store(#[from] confy::ConfyError),

    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// The client's `Power.log`.
    pub log_file: PathBuf,
    /// The client's own `log.config`, which decides what gets logged.
    pub client_config_file: PathBuf,
    /// Overrides the platform line terminator.
    pub line_terminator: Option<String>,
    /// How long to let a burst of writes settle before reading.
    pub debounce_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_file: default_log_file(),
            client_config_file: default_client_config_file(),
            line_terminator: None,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Ok(confy::load(APP_NAME, None)?)
    }

    pub fn store(&self) -> Result<(), ConfigError> {
        confy::store(APP_NAME, None, self)?;
        Ok(())
    }

    pub fn location() -> Result<PathBuf, ConfigError> {
        Ok(confy::get_configuration_file_path(APP_NAME, None)?)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn line_terminator(&self) -> &str {
        self.line_terminator
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_LINE_TERMINATOR)
    }

    pub fn log_parser(&self) -> LogParser {
        LogParser::with_terminator(self.line_terminator())
    }
}

fn home() -> PathBuf {
    dirs::home_dir().unwrap_or_default()
}

/// Wine prefix used to run the client outside Windows and macOS.
fn wine_drive_c() -> PathBuf {
    home().join(".wine").join("drive_c")
}

pub fn default_log_file() -> PathBuf {
    if cfg!(target_os = "windows") {
        PathBuf::from(r"C:\Program Files (x86)\Hearthstone\Logs\Power.log")
    } else if cfg!(target_os = "macos") {
        PathBuf::from("/Applications/Hearthstone/Logs/Power.log")
    } else {
        wine_drive_c()
            .join("Program Files (x86)")
            .join("Hearthstone")
            .join("Logs")
            .join("Power.log")
    }
}

pub fn default_client_config_file() -> PathBuf {
    let blizzard = if cfg!(target_os = "windows") {
        dirs::data_local_dir().unwrap_or_default().join("Blizzard")
    } else if cfg!(target_os = "macos") {
        home().join("Library").join("Preferences").join("Blizzard")
    } else {
        let user = home()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        wine_drive_c()
            .join("users")
            .join(user)
            .join("AppData")
            .join("Local")
            .join("Blizzard")
    };
    blizzard.join("Hearthstone").join("log.config")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_client_files() {
        let config = AppConfig::default();
        assert!(config.log_file.ends_with("Power.log"));
        assert!(config.client_config_file.ends_with("log.config"));
        assert_eq!(config.debounce(), Duration::from_millis(100));
        assert_eq!(config.line_terminator(), DEFAULT_LINE_TERMINATOR);
    }

    #[test]
    fn terminator_override() {
        let config = AppConfig {
            line_terminator: Some("\r\n".into()),
            ..AppConfig::default()
        };
        assert_eq!(config.line_terminator(), "\r\n");

        let blank = AppConfig {
            line_terminator: Some(String::new()),
            ..AppConfig::default()
        };
        assert_eq!(blank.line_terminator(), DEFAULT_LINE_TERMINATOR);
    }
}
