//! # NovaDE Dispmanx (`novade-dispmanx`)
//!
//! Shows bitmaps on a VideoCore dispmanx display surface, the compositor found
//! on Raspberry Pi class boards.
//!
//! A [`DispmanxDevice`] owns one display surface. Each frame goes through the
//! same pipeline: tear down the previous element and resource, convert the
//! bitmap into a pitch-aligned native buffer ([`pixel`]), create and fill a
//! compositor resource, then add an element for it inside a synchronously
//! submitted update ([`resource`]). The surface is opened lazily on first use
//! after a process-wide host bootstrap ([`bootstrap`]).
//!
//! All compositor access goes through the [`Compositor`] trait. The real
//! implementation lives in [`ffi`] behind the `bcm_host` feature; tests drive
//! the pipeline with fakes.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use novade_dispmanx::{ffi::BcmHostCompositor, ConfigLoader, DispmanxDevice};
//!
//! let config = ConfigLoader::load_from_path("/etc/dispmanx.toml")?;
//! novade_dispmanx::logging::init_logging(&config.logging)?;
//!
//! let device = DispmanxDevice::from_config(&config.display, Arc::new(BcmHostCompositor::new()));
//! device.show_grid(50)?;
//! device.dispose();
//! ```

pub mod bootstrap;
pub mod compositor;
pub mod config;
pub mod device;
pub mod error;
#[cfg(feature = "bcm_host")]
pub mod ffi;
pub mod logging;
pub mod overlay;
pub mod pixel;
pub mod resource;
pub mod surface;

pub use bootstrap::HostBootstrap;
pub use compositor::{Compositor, NativeCall, Screen};
pub use config::{ConfigLoader, DispmanxConfig, DisplayConfig, LoggingConfig};
pub use device::DispmanxDevice;
pub use error::{CleanupWarning, ConfigError, DisplayError, LoggingError, Result};
pub use pixel::{ArgbBitmap, Bitmap, NativePixelBuffer, PixelFormat};
pub use resource::LifecycleState;
