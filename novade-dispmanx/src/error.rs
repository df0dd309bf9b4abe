//! Error handling for the dispmanx display pipeline.
//!
//! Errors follow three tiers:
//!
//! - [`DisplayError::Initialization`]: the host bootstrap or the display open
//!   failed. The surface is unusable until a later call retries initialization.
//! - [`DisplayError::Resource`]: a compositor call returned an invalid handle or
//!   a non-zero status while building the current frame. The show operation is
//!   aborted; the device stays usable.
//! - [`CleanupWarning`]: a remove/delete/close call failed during teardown.
//!   These are logged and returned for inspection but never raised, because
//!   cleanup has to run to completion even after partial failure.
//!
//! Every native failure carries the [`NativeCall`] that produced it and the raw
//! return code (`0` for calls that signal failure with an invalid handle).

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::compositor::NativeCall;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DisplayError>;

/// Main error type of the display pipeline.
#[derive(Debug, Error)]
pub enum DisplayError {
    /// Host bootstrap, display size query or display open failed.
    #[error("Display initialization failed: {operation} returned {code}")]
    Initialization { operation: NativeCall, code: i32 },

    /// A compositor call failed while creating, writing or compositing a frame.
    #[error("Compositor resource error: {operation} returned {code}")]
    Resource { operation: NativeCall, code: i32 },

    /// The bitmap handed to the pipeline has no pixels or is too large for
    /// the compositor's 16.16 source rectangle.
    #[error("Cannot show a {width}x{height} image")]
    InvalidImage { width: u32, height: u32 },

    /// Wraps a [`ConfigError`].
    #[error("Configuration Error: {0}")]
    Config(#[from] ConfigError),

    /// Wraps a [`LoggingError`].
    #[error("Logging Error: {0}")]
    Logging(#[from] LoggingError),
}

impl DisplayError {
    pub(crate) fn init(operation: NativeCall, code: i32) -> Self {
        DisplayError::Initialization { operation, code }
    }

    pub(crate) fn resource(operation: NativeCall, code: i32) -> Self {
        DisplayError::Resource { operation, code }
    }

    /// Native return code carried by the error, if it came from the compositor.
    pub fn native_code(&self) -> Option<i32> {
        match self {
            DisplayError::Initialization { code, .. } | DisplayError::Resource { code, .. } => {
                Some(*code)
            }
            _ => None,
        }
    }
}

/// A non-fatal failure reported by a cleanup call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanupWarning {
    pub operation: NativeCall,
    pub code: i32,
}

impl fmt::Display for CleanupWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} returned {} during cleanup", self.operation, self.code)
    }
}

/// Error type for configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file exists but could not be read.
    #[error("Failed to read configuration file from {path:?}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration is not valid TOML or does not match the schema.
    #[error("Failed to parse configuration file: {0}")]
    ParseError(#[from] toml::de::Error),

    /// A value parsed fine but is not acceptable.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Error type for logging setup.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Failed to initialize logging: {0}")]
    InitializationFailure(String),

    #[error("Logging I/O error: {0}")]
    Io(#[from] std::io::Error),
}
