//! `libbcm_host` bindings and the real [`Compositor`].
//!
//! Only the handful of dispmanx entry points the pipeline needs are declared.
//! Handles are plain `u32` values on the C side.

use libc::{c_int, c_void};
use std::ptr;
use tracing::trace;

use crate::compositor::{
    Compositor, DisplayHandle, ElementHandle, ElementRequest, ImageType, Rect, ResourceHandle,
    Screen, UpdateHandle,
};

#[repr(C)]
struct VcRect {
    x: i32,
    y: i32,
    width: i32,
    height: i32,
}

impl From<&Rect> for VcRect {
    fn from(rect: &Rect) -> Self {
        VcRect {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
        }
    }
}

#[repr(C)]
struct VcDispmanxAlpha {
    flags: u32,
    opacity: u32,
    mask: u32,
}

#[link(name = "bcm_host")]
extern "C" {
    fn bcm_host_init();
    fn graphics_get_display_size(display_number: u16, width: *mut u32, height: *mut u32) -> i32;
    fn vc_dispmanx_display_open(device: u32) -> u32;
    fn vc_dispmanx_display_close(display: u32) -> c_int;
    fn vc_dispmanx_resource_create(
        image_type: u32,
        width: u32,
        height: u32,
        native_image_handle: *mut u32,
    ) -> u32;
    fn vc_dispmanx_resource_write_data(
        resource: u32,
        src_type: u32,
        src_pitch: c_int,
        src_address: *mut c_void,
        rect: *const VcRect,
    ) -> c_int;
    fn vc_dispmanx_resource_delete(resource: u32) -> c_int;
    fn vc_dispmanx_update_start(priority: i32) -> u32;
    fn vc_dispmanx_element_add(
        update: u32,
        display: u32,
        layer: i32,
        dest_rect: *const VcRect,
        src: u32,
        src_rect: *const VcRect,
        protection: u32,
        alpha: *mut VcDispmanxAlpha,
        clamp: *mut c_void,
        transform: u32,
    ) -> u32;
    fn vc_dispmanx_element_remove(update: u32, element: u32) -> c_int;
    fn vc_dispmanx_update_submit_sync(update: u32) -> c_int;
}

/// [`Compositor`] backed by the VideoCore `libbcm_host` library.
#[derive(Debug, Default, Clone, Copy)]
pub struct BcmHostCompositor;

impl BcmHostCompositor {
    pub fn new() -> Self {
        BcmHostCompositor
    }
}

impl Compositor for BcmHostCompositor {
    fn bootstrap(&self) -> i32 {
        // bcm_host_init has no return value; it aborts the process on failure.
        unsafe { bcm_host_init() };
        0
    }

    fn query_display_size(&self, screen: Screen) -> Result<(u32, u32), i32> {
        let mut width = 0u32;
        let mut height = 0u32;
        let code = unsafe { graphics_get_display_size(screen.id() as u16, &mut width, &mut height) };
        trace!(?screen, code, width, height, "graphics_get_display_size");
        if code != 0 {
            return Err(code);
        }
        Ok((width, height))
    }

    fn open_display(&self, screen: Screen) -> DisplayHandle {
        DisplayHandle(unsafe { vc_dispmanx_display_open(screen.id()) })
    }

    fn close_display(&self, display: DisplayHandle) -> i32 {
        unsafe { vc_dispmanx_display_close(display.0) }
    }

    fn resource_create(&self, image_type: ImageType, width: u32, height: u32) -> ResourceHandle {
        let mut native_image = 0u32;
        let handle =
            unsafe { vc_dispmanx_resource_create(image_type.raw(), width, height, &mut native_image) };
        ResourceHandle(handle)
    }

    fn resource_write(
        &self,
        resource: ResourceHandle,
        image_type: ImageType,
        pitch: u32,
        pixels: &[u8],
        rect: &Rect,
    ) -> i32 {
        let rect = VcRect::from(rect);
        // The compositor only reads from src_address despite the mutable pointer type.
        unsafe {
            vc_dispmanx_resource_write_data(
                resource.0,
                image_type.raw(),
                pitch as c_int,
                pixels.as_ptr() as *mut c_void,
                &rect,
            )
        }
    }

    fn resource_delete(&self, resource: ResourceHandle) -> i32 {
        unsafe { vc_dispmanx_resource_delete(resource.0) }
    }

    fn update_start(&self, priority: i32) -> UpdateHandle {
        UpdateHandle(unsafe { vc_dispmanx_update_start(priority) })
    }

    fn element_add(&self, update: UpdateHandle, request: &ElementRequest) -> ElementHandle {
        let dest = VcRect::from(&request.dest_rect);
        let src = VcRect::from(&request.src_rect);
        let mut alpha = VcDispmanxAlpha {
            flags: request.alpha.flags,
            opacity: request.alpha.opacity,
            mask: 0,
        };
        let handle = unsafe {
            vc_dispmanx_element_add(
                update.0,
                request.display.0,
                request.layer,
                &dest,
                request.resource.0,
                &src,
                request.protection,
                &mut alpha,
                ptr::null_mut(),
                request.transform,
            )
        };
        ElementHandle(handle)
    }

    fn element_remove(&self, update: UpdateHandle, element: ElementHandle) -> i32 {
        unsafe { vc_dispmanx_element_remove(update.0, element.0) }
    }

    fn update_submit_sync(&self, update: UpdateHandle) -> i32 {
        unsafe { vc_dispmanx_update_submit_sync(update.0) }
    }
}
