//! The boundary to the native dispmanx compositor.
//!
//! [`Compositor`] is a thin procedural capability: one method per native call,
//! returning raw handles and status codes exactly as the C API does. Deciding
//! what counts as failure (a `0` handle, a non-zero status) is left to the
//! callers in [`crate::surface`] and [`crate::resource`], so fakes used in tests
//! only have to reproduce the native contract.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! native_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub struct $name(pub u32);

        impl $name {
            /// The invalid handle returned by the compositor on failure.
            pub const NONE: Self = Self(0);

            pub fn is_valid(self) -> bool {
                self.0 != 0
            }
        }
    };
}

native_handle!(
    /// An opened display surface (`DISPMANX_DISPLAY_HANDLE_T`).
    DisplayHandle
);
native_handle!(
    /// An off-screen pixel buffer owned by the compositor (`DISPMANX_RESOURCE_HANDLE_T`).
    ResourceHandle
);
native_handle!(
    /// An on-screen slot binding a resource to a rectangle (`DISPMANX_ELEMENT_HANDLE_T`).
    ElementHandle
);
native_handle!(
    /// A batch of element mutations applied atomically (`DISPMANX_UPDATE_HANDLE_T`).
    UpdateHandle
);

/// Display identifiers understood by `vc_dispmanx_display_open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    #[default]
    MainLcd,
    AuxLcd,
    Hdmi,
    Sdtv,
    ForceLcd,
    ForceTv,
    ForceOther,
}

impl Screen {
    pub fn id(self) -> u32 {
        match self {
            Screen::MainLcd => 0,
            Screen::AuxLcd => 1,
            Screen::Hdmi => 2,
            Screen::Sdtv => 3,
            Screen::ForceLcd => 4,
            Screen::ForceTv => 5,
            Screen::ForceOther => 6,
        }
    }
}

/// Native image types (`VC_IMAGE_TYPE_T`) used by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageType {
    Rgb565,
    Argb8888,
}

impl ImageType {
    pub fn raw(self) -> u32 {
        match self {
            ImageType::Rgb565 => 1,
            ImageType::Argb8888 => 43,
        }
    }
}

/// A rectangle in the layout of `VC_RECT_T`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Rect { x, y, width, height }
    }
}

/// `DISPMANX_FLAGS_ALPHA_FROM_SOURCE`
pub const ALPHA_FROM_SOURCE: u32 = 0;
/// `DISPMANX_FLAGS_ALPHA_FIXED_ALL_PIXELS`
pub const ALPHA_FIXED_ALL_PIXELS: u32 = 1;

/// Blend parameters for an element (`VC_DISPMANX_ALPHA_T` without a mask).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AlphaBlend {
    pub flags: u32,
    pub opacity: u32,
}

impl AlphaBlend {
    /// Fixed, fully opaque alpha for every pixel of the element.
    pub const fn opaque() -> Self {
        AlphaBlend {
            flags: ALPHA_FROM_SOURCE | ALPHA_FIXED_ALL_PIXELS,
            opacity: 255,
        }
    }
}

/// `DISPMANX_PROTECTION_NONE`
pub const PROTECTION_NONE: u32 = 0;
/// `VC_IMAGE_ROT0`
pub const TRANSFORM_ROT0: u32 = 0;

/// Everything `vc_dispmanx_element_add` needs besides the update handle.
/// The clamp argument is always null.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementRequest {
    pub display: DisplayHandle,
    pub layer: i32,
    pub dest_rect: Rect,
    pub resource: ResourceHandle,
    pub src_rect: Rect,
    pub protection: u32,
    pub alpha: AlphaBlend,
    pub transform: u32,
}

/// Names of the native calls, used in errors and log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeCall {
    HostInit,
    GetDisplaySize,
    DisplayOpen,
    DisplayClose,
    ResourceCreate,
    ResourceWriteData,
    ResourceDelete,
    UpdateStart,
    ElementAdd,
    ElementRemove,
    UpdateSubmitSync,
}

impl NativeCall {
    pub fn name(self) -> &'static str {
        match self {
            NativeCall::HostInit => "bcm_host_init",
            NativeCall::GetDisplaySize => "graphics_get_display_size",
            NativeCall::DisplayOpen => "vc_dispmanx_display_open",
            NativeCall::DisplayClose => "vc_dispmanx_display_close",
            NativeCall::ResourceCreate => "vc_dispmanx_resource_create",
            NativeCall::ResourceWriteData => "vc_dispmanx_resource_write_data",
            NativeCall::ResourceDelete => "vc_dispmanx_resource_delete",
            NativeCall::UpdateStart => "vc_dispmanx_update_start",
            NativeCall::ElementAdd => "vc_dispmanx_element_add",
            NativeCall::ElementRemove => "vc_dispmanx_element_remove",
            NativeCall::UpdateSubmitSync => "vc_dispmanx_update_submit_sync",
        }
    }
}

impl fmt::Display for NativeCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The native compositor capability.
///
/// Implementations must be callable from any thread; callers serialize access
/// per device. `update_submit_sync` blocks until the compositor has applied
/// the update.
#[cfg_attr(test, mockall::automock)]
pub trait Compositor: Send + Sync {
    /// One-time host bootstrap. `0` on success.
    fn bootstrap(&self) -> i32;

    /// Pixel dimensions of the given screen, or the non-zero native code.
    fn query_display_size(&self, screen: Screen) -> Result<(u32, u32), i32>;

    /// Opens the screen; [`DisplayHandle::NONE`] on failure.
    fn open_display(&self, screen: Screen) -> DisplayHandle;

    fn close_display(&self, display: DisplayHandle) -> i32;

    /// Creates an off-screen resource; [`ResourceHandle::NONE`] on failure.
    fn resource_create(&self, image_type: ImageType, width: u32, height: u32) -> ResourceHandle;

    /// Copies `pixels` (rows `pitch` bytes apart) into the resource. `0` on success.
    fn resource_write(
        &self,
        resource: ResourceHandle,
        image_type: ImageType,
        pitch: u32,
        pixels: &[u8],
        rect: &Rect,
    ) -> i32;

    fn resource_delete(&self, resource: ResourceHandle) -> i32;

    /// Opens an update transaction; [`UpdateHandle::NONE`] on failure.
    fn update_start(&self, priority: i32) -> UpdateHandle;

    /// Adds an element inside `update`; [`ElementHandle::NONE`] on failure.
    fn element_add(&self, update: UpdateHandle, request: &ElementRequest) -> ElementHandle;

    fn element_remove(&self, update: UpdateHandle, element: ElementHandle) -> i32;

    /// Submits `update` and waits until it is on screen. `0` on success.
    fn update_submit_sync(&self, update: UpdateHandle) -> i32;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_zero_is_invalid() {
        assert!(!ResourceHandle::NONE.is_valid());
        assert!(!ElementHandle::default().is_valid());
        assert!(UpdateHandle(7).is_valid());
        assert!(DisplayHandle(1).is_valid());
    }

    #[test]
    fn test_screen_ids_match_dispmanx() {
        assert_eq!(Screen::MainLcd.id(), 0);
        assert_eq!(Screen::Hdmi.id(), 2);
        assert_eq!(Screen::ForceOther.id(), 6);
    }

    #[test]
    fn test_screen_deserializes_from_snake_case() {
        let screen: Screen = serde_json::from_str("\"aux_lcd\"").unwrap();
        assert_eq!(screen, Screen::AuxLcd);
    }

    #[test]
    fn test_image_type_raw_values() {
        assert_eq!(ImageType::Rgb565.raw(), 1);
        assert_eq!(ImageType::Argb8888.raw(), 43);
    }

    #[test]
    fn test_opaque_alpha_sets_fixed_flag() {
        let alpha = AlphaBlend::opaque();
        assert_eq!(alpha.flags & ALPHA_FIXED_ALL_PIXELS, ALPHA_FIXED_ALL_PIXELS);
        assert_eq!(alpha.opacity, 255);
    }

    #[test]
    fn test_native_call_display_uses_c_name() {
        assert_eq!(NativeCall::UpdateSubmitSync.to_string(), "vc_dispmanx_update_submit_sync");
        assert_eq!(format!("{}", NativeCall::HostInit), "bcm_host_init");
    }
}
