//! A named dispmanx output device and its frame update pipeline.
//!
//! Every public operation takes the device lock for its whole duration, so
//! concurrent callers are serialized and the surface, resource and element
//! state is never observed half-updated. Showing a frame always tears down
//! the previous element and resource first, then converts, creates, writes
//! and binds, and returns only after the compositor has put the frame on
//! screen.
//!
//! The device has no `Drop` cleanup: compositor handles can only be released
//! inside an update transaction, so callers are expected to [`dispose`] it.
//!
//! [`dispose`]: DispmanxDevice::dispose

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

use crate::bootstrap::HostBootstrap;
use crate::compositor::{Compositor, Screen};
use crate::config::DisplayConfig;
use crate::error::{DisplayError, Result};
use crate::overlay::CalibrationOverlay;
use crate::pixel::{convert, Bitmap, NativePixelBuffer, PixelFormat};
use crate::resource::{LifecycleState, ResourceLifecycle, IMAGE_LAYER, MAX_IMAGE_DIMENSION};
use crate::surface::SurfaceState;

/// What is currently on screen, kept so that a same-sized next frame can
/// reuse the native buffer allocation.
#[derive(Debug, Default)]
pub struct ShownImageState {
    width: u32,
    height: u32,
    buffer: Option<NativePixelBuffer>,
}

impl ShownImageState {
    fn take_reusable(&mut self, width: u32, height: u32) -> Option<NativePixelBuffer> {
        if self.width == width && self.height == height {
            self.buffer.take()
        } else {
            None
        }
    }
}

#[derive(Debug)]
struct DeviceState {
    surface: SurfaceState,
    lifecycle: ResourceLifecycle,
    shown: ShownImageState,
    overlay: CalibrationOverlay,
}

pub struct DispmanxDevice {
    name: String,
    format: PixelFormat,
    layer: i32,
    compositor: Arc<dyn Compositor>,
    bootstrap: Arc<HostBootstrap>,
    state: Mutex<DeviceState>,
}

impl std::fmt::Debug for DispmanxDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispmanxDevice")
            .field("name", &self.name)
            .field("format", &self.format)
            .field("layer", &self.layer)
            .finish_non_exhaustive()
    }
}

impl DispmanxDevice {
    pub fn new(
        name: impl Into<String>,
        screen: Screen,
        format: PixelFormat,
        compositor: Arc<dyn Compositor>,
        bootstrap: Arc<HostBootstrap>,
    ) -> Self {
        Self::with_layer(name, screen, format, IMAGE_LAYER, compositor, bootstrap)
    }

    pub fn with_layer(
        name: impl Into<String>,
        screen: Screen,
        format: PixelFormat,
        layer: i32,
        compositor: Arc<dyn Compositor>,
        bootstrap: Arc<HostBootstrap>,
    ) -> Self {
        DispmanxDevice {
            name: name.into(),
            format,
            layer,
            compositor,
            bootstrap,
            state: Mutex::new(DeviceState {
                surface: SurfaceState::new(screen),
                lifecycle: ResourceLifecycle::new(layer),
                shown: ShownImageState::default(),
                overlay: CalibrationOverlay::new(),
            }),
        }
    }

    /// Builds a device from the `[display]` section, sharing the process-wide
    /// host bootstrap.
    pub fn from_config(config: &DisplayConfig, compositor: Arc<dyn Compositor>) -> Self {
        Self::with_layer(
            config.name.clone(),
            config.screen,
            config.pixel_format,
            config.layer,
            compositor,
            HostBootstrap::global(),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pixel_format(&self) -> PixelFormat {
        self.format
    }

    pub fn screen(&self) -> Screen {
        self.state.lock().surface.screen()
    }

    pub fn lifecycle_state(&self) -> LifecycleState {
        self.state.lock().lifecycle.state()
    }

    /// Dimensions of the image currently on screen, if any.
    pub fn shown_dimensions(&self) -> Option<(u32, u32)> {
        let state = self.state.lock();
        state.shown.buffer.as_ref().map(|_| (state.shown.width, state.shown.height))
    }

    /// Surface size in pixels, opening the display on first use.
    pub fn bounds(&self) -> Result<(u32, u32)> {
        let mut state = self.state.lock();
        self.ensure_initialized(&mut state)?;
        Ok(state.surface.bounds())
    }

    /// Removes whatever is on screen.
    pub fn show_blank(&self) -> Result<()> {
        let mut state = self.state.lock();
        self.ensure_initialized(&mut state)?;
        state.lifecycle.teardown(self.compositor.as_ref())?;
        Ok(())
    }

    /// Replaces the current frame with `bitmap`, centred on the surface.
    pub fn show_image(&self, bitmap: &dyn Bitmap) -> Result<()> {
        let mut state = self.state.lock();
        self.show_image_locked(&mut state, bitmap)
    }

    /// Shows the calibration pattern at surface resolution.
    pub fn show_calibration_pattern(&self, x_spacing: u32, y_spacing: u32) -> Result<()> {
        let started = Instant::now();
        let mut state = self.state.lock();
        self.ensure_initialized(&mut state)?;
        let (width, height) = state.surface.bounds();

        let mut overlay = std::mem::take(&mut state.overlay);
        let result = {
            let pattern = overlay.calibration(width, height, x_spacing, y_spacing);
            self.show_image_locked(&mut state, pattern)
        };
        state.overlay = overlay;
        debug!(elapsed = ?started.elapsed(), "calibration realized");
        result
    }

    /// Shows a square grid with `spacing` pixels between lines.
    pub fn show_grid(&self, spacing: u32) -> Result<()> {
        let started = Instant::now();
        let mut state = self.state.lock();
        self.ensure_initialized(&mut state)?;
        let (width, height) = state.surface.bounds();

        let mut overlay = std::mem::take(&mut state.overlay);
        let result = {
            let grid = overlay.grid(width, height, spacing);
            self.show_image_locked(&mut state, grid)
        };
        state.overlay = overlay;
        debug!(elapsed = ?started.elapsed(), "grid realized");
        result
    }

    /// Removes the frame, closes the display and drops cached buffers. A
    /// later operation reopens the surface.
    pub fn dispose(&self) {
        let mut state = self.state.lock();
        if !state.surface.is_initialized() {
            return;
        }
        info!(device = %self.name, "dispose screen");
        if let Err(err) = state.lifecycle.teardown(self.compositor.as_ref()) {
            error!(device = %self.name, "teardown during dispose failed: {}", err);
            state.lifecycle = ResourceLifecycle::new(self.layer);
        }
        state.surface.close(self.compositor.as_ref());
        state.shown = ShownImageState::default();
        state.overlay = CalibrationOverlay::new();
    }

    fn ensure_initialized(&self, state: &mut DeviceState) -> Result<()> {
        state
            .surface
            .ensure_initialized(self.compositor.as_ref(), &self.bootstrap)
    }

    fn show_image_locked(&self, state: &mut DeviceState, bitmap: &dyn Bitmap) -> Result<()> {
        let started = Instant::now();
        let (width, height) = (bitmap.width(), bitmap.height());
        let fits = |d: u32| (1..=MAX_IMAGE_DIMENSION).contains(&d);
        if !fits(width) || !fits(height) {
            return Err(DisplayError::InvalidImage { width, height });
        }
        self.ensure_initialized(state)?;

        let compositor = self.compositor.as_ref();
        state.lifecycle.teardown(compositor)?;

        let reusable = state.shown.take_reusable(width, height);
        let buffer = convert(bitmap, self.format, reusable);
        state.shown = ShownImageState::default();

        state.lifecycle.create_and_write(compositor, &buffer)?;
        state
            .lifecycle
            .bind_element(compositor, &state.surface, width, height)?;

        state.shown = ShownImageState {
            width,
            height,
            buffer: Some(buffer),
        };
        debug!(device = %self.name, width, height, elapsed = ?started.elapsed(), "image realized");
        Ok(())
    }
}
