//! Loading and validation of [`DispmanxConfig`] from TOML.

use std::fs;
use std::path::Path;

use crate::config::DispmanxConfig;
use crate::error::ConfigError;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: [&str; 2] = ["text", "json"];

/// Namespace for the configuration loading functions.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Reads, parses and validates the file at `path`.
    ///
    /// A missing file is not an error: the defaults are returned. An empty
    /// file is treated the same way. Any other read failure is reported as
    /// [`ConfigError::ReadError`].
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<DispmanxConfig, ConfigError> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(content) => Self::load_from_str(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No configuration at {:?}, using defaults", path);
                Ok(DispmanxConfig::default())
            }
            Err(source) => Err(ConfigError::ReadError {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Parses and validates a TOML document.
    pub fn load_from_str(content: &str) -> Result<DispmanxConfig, ConfigError> {
        let mut config: DispmanxConfig = if content.trim().is_empty() {
            DispmanxConfig::default()
        } else {
            toml::from_str(content)?
        };
        Self::validate_config(&mut config)?;
        Ok(config)
    }

    /// Normalizes the logging level and format to lowercase and rejects
    /// unknown values and blank device names.
    fn validate_config(config: &mut DispmanxConfig) -> Result<(), ConfigError> {
        let level = config.logging.level.to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid log level: '{}'. Must be one of trace, debug, info, warn, error.",
                config.logging.level
            )));
        }
        config.logging.level = level;

        let format = config.logging.format.to_lowercase();
        if !LOG_FORMATS.contains(&format.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid log format: '{}'. Must be one of text, json.",
                config.logging.format
            )));
        }
        config.logging.format = format;

        if config.display.name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "display.name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
