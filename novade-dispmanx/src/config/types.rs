//! Configuration data structures.
//!
//! Every section and field has a default, so an empty file is a valid
//! configuration. Unknown keys are rejected via `#[serde(deny_unknown_fields)]`.

use serde::Deserialize;
use std::path::PathBuf;

use super::defaults;
use crate::compositor::Screen;
use crate::pixel::PixelFormat;

/// The `[display]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DisplayConfig {
    /// Device name used in log output.
    #[serde(default = "defaults::default_display_name")]
    pub name: String,
    #[serde(default = "defaults::default_screen")]
    pub screen: Screen,
    /// Native format frames are converted to before upload.
    #[serde(default = "defaults::default_pixel_format")]
    pub pixel_format: PixelFormat,
    /// Z-order of the image element.
    #[serde(default = "defaults::default_layer")]
    pub layer: i32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        defaults::default_display_config()
    }
}

/// The `[logging]` section.
///
/// ```
/// use novade_dispmanx::config::LoggingConfig;
///
/// let config = LoggingConfig::default();
/// assert_eq!(config.level, "info");
/// assert_eq!(config.format, "text");
/// assert_eq!(config.file_path, None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// One of "trace", "debug", "info", "warn", "error" (case-insensitive).
    #[serde(default = "defaults::default_log_level")]
    pub level: String,
    /// "text" or "json" (case-insensitive).
    #[serde(default = "defaults::default_log_format")]
    pub format: String,
    /// Daily-rolling log file. File logging is off when unset.
    #[serde(default = "defaults::default_log_file_path")]
    pub file_path: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        defaults::default_logging_config()
    }
}

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DispmanxConfig {
    #[serde(default = "defaults::default_display_config")]
    pub display: DisplayConfig,
    #[serde(default = "defaults::default_logging_config")]
    pub logging: LoggingConfig,
}
