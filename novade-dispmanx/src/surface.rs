//! The opened display surface of one device.

use tracing::{debug, info};

use crate::bootstrap::HostBootstrap;
use crate::compositor::{AlphaBlend, Compositor, DisplayHandle, NativeCall, Screen};
use crate::error::{DisplayError, Result};

/// Display bounds, the open display handle and the alpha descriptor every
/// element is added with. Only valid while `initialized` is set.
#[derive(Debug)]
pub struct SurfaceState {
    screen: Screen,
    width: u32,
    height: u32,
    display: DisplayHandle,
    alpha: AlphaBlend,
    initialized: bool,
}

impl SurfaceState {
    pub fn new(screen: Screen) -> Self {
        SurfaceState {
            screen,
            width: 0,
            height: 0,
            display: DisplayHandle::NONE,
            alpha: AlphaBlend::opaque(),
            initialized: false,
        }
    }

    /// Bootstraps the host (once per process), queries the screen size and
    /// opens the display. Does nothing when already initialized.
    pub fn ensure_initialized(
        &mut self,
        compositor: &dyn Compositor,
        bootstrap: &HostBootstrap,
    ) -> Result<()> {
        if self.initialized {
            return Ok(());
        }
        info!(screen = ?self.screen, "initialize screen");
        bootstrap.initialize_once(compositor)?;

        let (width, height) = compositor
            .query_display_size(self.screen)
            .map_err(|code| DisplayError::init(NativeCall::GetDisplaySize, code))?;

        let handle = compositor.open_display(self.screen);
        if !handle.is_valid() {
            return Err(DisplayError::init(NativeCall::DisplayOpen, handle.0 as i32));
        }

        self.width = width;
        self.height = height;
        self.display = handle;
        self.alpha = AlphaBlend::opaque();
        self.initialized = true;
        debug!(width, height, display = handle.0, "screen opened");
        Ok(())
    }

    /// Closes the display and forgets the bounds. The close status is only
    /// logged. Safe to call on an uninitialized surface.
    pub fn close(&mut self, compositor: &dyn Compositor) {
        if !self.initialized {
            return;
        }
        let code = compositor.close_display(self.display);
        info!(code, "{} result", NativeCall::DisplayClose);
        self.display = DisplayHandle::NONE;
        self.width = 0;
        self.height = 0;
        self.initialized = false;
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn bounds(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn display(&self) -> DisplayHandle {
        self.display
    }

    pub fn alpha(&self) -> AlphaBlend {
        self.alpha
    }
}
