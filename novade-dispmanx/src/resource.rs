//! Resource and element lifecycle of a single visible layer.
//!
//! Each frame walks `Empty -> ResourceCreated -> ElementBound`, and the next
//! frame starts with [`ResourceLifecycle::teardown`] back to `Empty`. The
//! compositor must never see a resource written while an element still
//! references it, so handles are released inside an update transaction before
//! a new resource is created.

use tracing::{debug, warn};

use crate::compositor::{
    Compositor, ElementHandle, ElementRequest, NativeCall, Rect, ResourceHandle, UpdateHandle,
    PROTECTION_NONE, TRANSFORM_ROT0,
};
use crate::error::{CleanupWarning, DisplayError, Result};
use crate::pixel::NativePixelBuffer;
use crate::surface::SurfaceState;

/// Priority passed to `vc_dispmanx_update_start`.
const UPDATE_PRIORITY: i32 = 0;

/// Layer the image element is added on.
pub const IMAGE_LAYER: i32 = 1;

/// Largest width or height whose 16.16 source rectangle fits an `i32`.
pub const MAX_IMAGE_DIMENSION: u32 = (i32::MAX >> 16) as u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Empty,
    ResourceCreated,
    ElementBound,
}

/// Destination rectangle that centres an image on the surface.
pub fn centered_destination(surface: (u32, u32), image: (u32, u32)) -> Rect {
    let (sw, sh) = (surface.0 as i32, surface.1 as i32);
    let (iw, ih) = (image.0 as i32, image.1 as i32);
    Rect::new((sw - iw) / 2, (sh - ih) / 2, iw, ih)
}

/// Source rectangle covering the whole image in 16.16 fixed point, with a
/// zero fractional part (no zoom). Dimensions must not exceed
/// [`MAX_IMAGE_DIMENSION`].
pub fn zoomless_source(width: u32, height: u32) -> Rect {
    Rect::new(0, 0, (width << 16) as i32, (height << 16) as i32)
}

#[derive(Debug)]
pub struct ResourceLifecycle {
    resource: ResourceHandle,
    element: ElementHandle,
    layer: i32,
}

impl Default for ResourceLifecycle {
    fn default() -> Self {
        Self::new(IMAGE_LAYER)
    }
}

impl ResourceLifecycle {
    pub fn new(layer: i32) -> Self {
        ResourceLifecycle {
            resource: ResourceHandle::NONE,
            element: ElementHandle::NONE,
            layer,
        }
    }

    pub fn state(&self) -> LifecycleState {
        match (self.resource.is_valid(), self.element.is_valid()) {
            (_, true) => LifecycleState::ElementBound,
            (true, false) => LifecycleState::ResourceCreated,
            (false, false) => LifecycleState::Empty,
        }
    }

    pub fn resource(&self) -> ResourceHandle {
        self.resource
    }

    pub fn element(&self) -> ElementHandle {
        self.element
    }

    /// Removes the bound element (inside a synchronously submitted update)
    /// and deletes the resource.
    ///
    /// Only a failure to open the update is fatal. Non-zero codes from the
    /// remove, submit and delete calls are logged and returned as warnings.
    pub fn teardown(&mut self, compositor: &dyn Compositor) -> Result<Vec<CleanupWarning>> {
        let mut warnings = Vec::new();
        debug!(state = ?self.state(), "screen cleanup started");

        if self.element.is_valid() {
            let update = compositor.update_start(UPDATE_PRIORITY);
            if !update.is_valid() {
                return Err(DisplayError::resource(NativeCall::UpdateStart, update.0 as i32));
            }
            let code = compositor.element_remove(update, self.element);
            note_cleanup(&mut warnings, NativeCall::ElementRemove, code);
            self.element = ElementHandle::NONE;

            let code = compositor.update_submit_sync(update);
            note_cleanup(&mut warnings, NativeCall::UpdateSubmitSync, code);
        }

        if self.resource.is_valid() {
            let code = compositor.resource_delete(self.resource);
            note_cleanup(&mut warnings, NativeCall::ResourceDelete, code);
            self.resource = ResourceHandle::NONE;
        }

        Ok(warnings)
    }

    /// Creates a resource sized for `buffer` and writes the pixels into it.
    pub fn create_and_write(
        &mut self,
        compositor: &dyn Compositor,
        buffer: &NativePixelBuffer,
    ) -> Result<ResourceHandle> {
        debug_assert_eq!(self.state(), LifecycleState::Empty);
        let image_type = buffer.format().image_type();
        let (width, height) = (buffer.width(), buffer.height());

        let resource = compositor.resource_create(image_type, width, height);
        if !resource.is_valid() {
            return Err(DisplayError::resource(NativeCall::ResourceCreate, resource.0 as i32));
        }

        let rect = Rect::new(0, 0, width as i32, height as i32);
        let code = compositor.resource_write(resource, image_type, buffer.pitch(), buffer.data(), &rect);
        if code != 0 {
            let delete_code = compositor.resource_delete(resource);
            if delete_code != 0 {
                warn!(code = delete_code, "{} failed for unwritten resource", NativeCall::ResourceDelete);
            }
            return Err(DisplayError::resource(NativeCall::ResourceWriteData, code));
        }

        debug!(resource = resource.0, width, height, pitch = buffer.pitch(), "resource written");
        self.resource = resource;
        Ok(resource)
    }

    /// Adds an element showing the current resource centred on `surface` and
    /// waits until the update is applied.
    pub fn bind_element(
        &mut self,
        compositor: &dyn Compositor,
        surface: &SurfaceState,
        image_width: u32,
        image_height: u32,
    ) -> Result<ElementHandle> {
        debug_assert_eq!(self.state(), LifecycleState::ResourceCreated);
        let request = ElementRequest {
            display: surface.display(),
            layer: self.layer,
            dest_rect: centered_destination(surface.bounds(), (image_width, image_height)),
            resource: self.resource,
            src_rect: zoomless_source(image_width, image_height),
            protection: PROTECTION_NONE,
            alpha: surface.alpha(),
            transform: TRANSFORM_ROT0,
        };

        let update = compositor.update_start(UPDATE_PRIORITY);
        if !update.is_valid() {
            return Err(DisplayError::resource(NativeCall::UpdateStart, update.0 as i32));
        }

        let element = compositor.element_add(update, &request);
        if !element.is_valid() {
            close_abandoned_update(compositor, update);
            return Err(DisplayError::resource(NativeCall::ElementAdd, element.0 as i32));
        }
        self.element = element;

        let code = compositor.update_submit_sync(update);
        if code != 0 {
            return Err(DisplayError::resource(NativeCall::UpdateSubmitSync, code));
        }
        debug!(element = element.0, dest = ?request.dest_rect, "element bound");
        Ok(element)
    }
}

fn note_cleanup(warnings: &mut Vec<CleanupWarning>, operation: NativeCall, code: i32) {
    if code == 0 {
        debug!("{} result: {}", operation, code);
        return;
    }
    let warning = CleanupWarning { operation, code };
    warn!("{}", warning);
    warnings.push(warning);
}

// An opened update has to be submitted to be released by the compositor.
fn close_abandoned_update(compositor: &dyn Compositor, update: UpdateHandle) {
    let code = compositor.update_submit_sync(update);
    if code != 0 {
        warn!("{}", CleanupWarning { operation: NativeCall::UpdateSubmitSync, code });
    }
}
