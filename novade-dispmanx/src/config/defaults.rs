//! Default configuration values, referenced from `#[serde(default = ...)]`.

use std::path::PathBuf;

use crate::compositor::Screen;
use crate::config::{DisplayConfig, LoggingConfig};
use crate::pixel::PixelFormat;
use crate::resource::IMAGE_LAYER;

pub(super) fn default_display_config() -> DisplayConfig {
    DisplayConfig {
        name: default_display_name(),
        screen: default_screen(),
        pixel_format: default_pixel_format(),
        layer: default_layer(),
    }
}

pub(super) fn default_logging_config() -> LoggingConfig {
    LoggingConfig {
        level: default_log_level(),
        format: default_log_format(),
        file_path: default_log_file_path(),
    }
}

pub(super) fn default_display_name() -> String {
    "dispmanx-main".to_string()
}

pub(super) fn default_screen() -> Screen {
    Screen::MainLcd
}

pub(super) fn default_pixel_format() -> PixelFormat {
    PixelFormat::Argb8888
}

pub(super) fn default_layer() -> i32 {
    IMAGE_LAYER
}

pub(super) fn default_log_level() -> String {
    "info".to_string()
}

pub(super) fn default_log_format() -> String {
    "text".to_string()
}

/// No log file by default.
pub(super) fn default_log_file_path() -> Option<PathBuf> {
    None
}
