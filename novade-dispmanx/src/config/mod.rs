//! Configuration of a dispmanx device and of the logging subsystem.
//!
//! - [`types`]: the deserialized schema ([`DispmanxConfig`], [`DisplayConfig`],
//!   [`LoggingConfig`]).
//! - [`defaults`]: values used for every field missing from the file.
//! - [`loader`]: [`ConfigLoader`], which reads, parses and validates TOML.
//!
//! ```rust,ignore
//! use novade_dispmanx::config::ConfigLoader;
//!
//! let config = ConfigLoader::load_from_path("/etc/dispmanx.toml")?;
//! println!("showing on {:?}", config.display.screen);
//! ```

pub mod defaults;
pub mod loader;
pub mod types;

pub use loader::ConfigLoader;
pub use types::{DispmanxConfig, DisplayConfig, LoggingConfig};
