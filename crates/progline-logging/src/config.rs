//! Logger configuration, optionally loaded from `logging.toml`.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::LogError;
use crate::level::{ConsoleColor, LogLevel};

/// The config file name
pub const CONFIG_FILE_NAME: &str = "logging.toml";

/// Template used when none is configured.
pub const DEFAULT_FORMAT: &str =
    "%{time:%Y-%m-%d %H:%M:%S%.3f %z} : %{category} : %{level} : %{file}:%{line} : %{message}";

/// Where and how a [`Logger`](crate::Logger) writes.
///
/// Writers that cannot be described in TOML are passed to
/// [`Logger::with_writers`](crate::Logger::with_writers) instead.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggerConfig {
    /// Rendered by `%{module}`
    pub name: String,
    /// Most verbose level that is still written
    pub level: LogLevel,
    /// Line template, see [`Template`](crate::Template)
    pub format: String,
    /// Write to stdout
    pub stdout: bool,
    /// Colour applied to stdout output only
    pub stdout_color: Option<ConsoleColor>,
    /// Append to this file
    pub file: Option<PathBuf>,
    /// Permission bits used when the file is created
    pub file_mode: u32,
    /// Send each entry to this Unix domain socket
    pub unix_socket: Option<PathBuf>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            name: "progline".to_string(),
            level: LogLevel::Info,
            format: DEFAULT_FORMAT.to_string(),
            stdout: true,
            stdout_color: None,
            file: None,
            file_mode: 0o644,
            unix_socket: None,
        }
    }
}

impl LoggerConfig {
    /// Load configuration from a TOML file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self, LogError> {
        let content = std::fs::read_to_string(path).map_err(|source| LogError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| LogError::ParseConfig {
            path: path.to_path_buf(),
            source,
        })
    }

    /// `<config dir>/progline/logging.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("progline").join(CONFIG_FILE_NAME))
    }

    /// Load from [`default_path`](Self::default_path).
    ///
    /// Returns:
    /// - `Ok(Some(config))` if the file exists and parses
    /// - `Ok(None)` if there is no such file
    /// - `Err(...)` if the file exists but cannot be read or parsed
    pub fn load_default() -> Result<Option<Self>, LogError> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path).map(Some),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LoggerConfig::default();
        assert_eq!(config.level, LogLevel::Info);
        assert!(config.stdout);
        assert_eq!(config.file_mode, 0o644);
        assert_eq!(config.format, DEFAULT_FORMAT);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: LoggerConfig = toml::from_str(
            r#"
            level = "debug"
            stdout = false
            stdout_color = "cyan"
            file = "/var/log/progline.log"
            "#,
        )
        .unwrap();

        assert_eq!(config.level, LogLevel::Debug);
        assert!(!config.stdout);
        assert_eq!(config.stdout_color, Some(ConsoleColor::Cyan));
        assert_eq!(config.file, Some(PathBuf::from("/var/log/progline.log")));
        assert_eq!(config.name, "progline");
        assert!(config.unix_socket.is_none());
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result: Result<LoggerConfig, _> = toml::from_str("rotate = true");
        assert!(result.is_err());
    }
}
