//! A fake compositor that records every native call and can be told to fail.

#![allow(dead_code)]

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use novade_dispmanx::compositor::{
    Compositor, DisplayHandle, ElementHandle, ElementRequest, ImageType, NativeCall, Rect,
    ResourceHandle, Screen, UpdateHandle,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Bootstrap,
    QueryDisplaySize(Screen),
    OpenDisplay(Screen),
    CloseDisplay(DisplayHandle),
    ResourceCreate {
        image_type: ImageType,
        width: u32,
        height: u32,
        handle: ResourceHandle,
    },
    ResourceWrite {
        resource: ResourceHandle,
        image_type: ImageType,
        pitch: u32,
        rect: Rect,
    },
    ResourceDelete(ResourceHandle),
    UpdateStart(UpdateHandle),
    ElementAdd {
        update: UpdateHandle,
        request: ElementRequest,
        handle: ElementHandle,
    },
    ElementRemove {
        update: UpdateHandle,
        element: ElementHandle,
    },
    UpdateSubmitSync(UpdateHandle),
}

impl Call {
    pub fn native(&self) -> NativeCall {
        match self {
            Call::Bootstrap => NativeCall::HostInit,
            Call::QueryDisplaySize(_) => NativeCall::GetDisplaySize,
            Call::OpenDisplay(_) => NativeCall::DisplayOpen,
            Call::CloseDisplay(_) => NativeCall::DisplayClose,
            Call::ResourceCreate { .. } => NativeCall::ResourceCreate,
            Call::ResourceWrite { .. } => NativeCall::ResourceWriteData,
            Call::ResourceDelete(_) => NativeCall::ResourceDelete,
            Call::UpdateStart(_) => NativeCall::UpdateStart,
            Call::ElementAdd { .. } => NativeCall::ElementAdd,
            Call::ElementRemove { .. } => NativeCall::ElementRemove,
            Call::UpdateSubmitSync(_) => NativeCall::UpdateSubmitSync,
        }
    }
}

/// Pixels handed to `resource_write`, with the address they were read from.
#[derive(Debug, Clone)]
pub struct WrittenFrame {
    pub address: usize,
    pub pitch: u32,
    pub data: Vec<u8>,
}

/// Return values the fake hands out instead of success.
#[derive(Debug, Clone, Default)]
pub struct Failures {
    pub bootstrap: i32,
    pub display_size: Option<i32>,
    pub open_display: bool,
    pub resource_create: bool,
    pub resource_write: i32,
    pub update_start: bool,
    pub element_add: bool,
    pub element_remove: i32,
    pub resource_delete: i32,
}

pub struct RecordingCompositor {
    width: u32,
    height: u32,
    next_handle: AtomicU32,
    write_delay: Option<Duration>,
    calls: Mutex<Vec<Call>>,
    written: Mutex<Vec<WrittenFrame>>,
    failures: Mutex<Failures>,
}

impl RecordingCompositor {
    pub fn new(width: u32, height: u32) -> Self {
        RecordingCompositor {
            width,
            height,
            next_handle: AtomicU32::new(100),
            write_delay: None,
            calls: Mutex::new(Vec::new()),
            written: Mutex::new(Vec::new()),
            failures: Mutex::new(Failures::default()),
        }
    }

    /// Sleeps inside every `resource_write` to widen race windows.
    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = Some(delay);
        self
    }

    pub fn fail(&self, configure: impl FnOnce(&mut Failures)) {
        configure(&mut self.failures.lock());
    }

    pub fn heal(&self) {
        *self.failures.lock() = Failures::default();
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn native_calls(&self) -> Vec<NativeCall> {
        self.calls.lock().iter().map(Call::native).collect()
    }

    pub fn count(&self, native: NativeCall) -> usize {
        self.calls.lock().iter().filter(|c| c.native() == native).count()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
        self.written.lock().clear();
    }

    pub fn written(&self) -> Vec<WrittenFrame> {
        self.written.lock().clone()
    }

    pub fn last_element_request(&self) -> Option<ElementRequest> {
        self.calls.lock().iter().rev().find_map(|c| match c {
            Call::ElementAdd { request, .. } => Some(*request),
            _ => None,
        })
    }

    fn handle(&self) -> u32 {
        self.next_handle.fetch_add(1, Ordering::SeqCst)
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }
}

impl Compositor for RecordingCompositor {
    fn bootstrap(&self) -> i32 {
        self.record(Call::Bootstrap);
        self.failures.lock().bootstrap
    }

    fn query_display_size(&self, screen: Screen) -> Result<(u32, u32), i32> {
        self.record(Call::QueryDisplaySize(screen));
        match self.failures.lock().display_size {
            Some(code) => Err(code),
            None => Ok((self.width, self.height)),
        }
    }

    fn open_display(&self, screen: Screen) -> DisplayHandle {
        self.record(Call::OpenDisplay(screen));
        if self.failures.lock().open_display {
            return DisplayHandle::NONE;
        }
        DisplayHandle(self.handle())
    }

    fn close_display(&self, display: DisplayHandle) -> i32 {
        self.record(Call::CloseDisplay(display));
        0
    }

    fn resource_create(&self, image_type: ImageType, width: u32, height: u32) -> ResourceHandle {
        let handle = if self.failures.lock().resource_create {
            ResourceHandle::NONE
        } else {
            ResourceHandle(self.handle())
        };
        self.record(Call::ResourceCreate { image_type, width, height, handle });
        handle
    }

    fn resource_write(
        &self,
        resource: ResourceHandle,
        image_type: ImageType,
        pitch: u32,
        pixels: &[u8],
        rect: &Rect,
    ) -> i32 {
        self.record(Call::ResourceWrite { resource, image_type, pitch, rect: *rect });
        if let Some(delay) = self.write_delay {
            std::thread::sleep(delay);
        }
        self.written.lock().push(WrittenFrame {
            address: pixels.as_ptr() as usize,
            pitch,
            data: pixels.to_vec(),
        });
        self.failures.lock().resource_write
    }

    fn resource_delete(&self, resource: ResourceHandle) -> i32 {
        self.record(Call::ResourceDelete(resource));
        self.failures.lock().resource_delete
    }

    fn update_start(&self, _priority: i32) -> UpdateHandle {
        let handle = if self.failures.lock().update_start {
            UpdateHandle::NONE
        } else {
            UpdateHandle(self.handle())
        };
        self.record(Call::UpdateStart(handle));
        handle
    }

    fn element_add(&self, update: UpdateHandle, request: &ElementRequest) -> ElementHandle {
        let handle = if self.failures.lock().element_add {
            ElementHandle::NONE
        } else {
            ElementHandle(self.handle())
        };
        self.record(Call::ElementAdd { update, request: *request, handle });
        handle
    }

    fn element_remove(&self, update: UpdateHandle, element: ElementHandle) -> i32 {
        self.record(Call::ElementRemove { update, element });
        self.failures.lock().element_remove
    }

    fn update_submit_sync(&self, update: UpdateHandle) -> i32 {
        self.record(Call::UpdateSubmitSync(update));
        0
    }
}

/// Replays a call log and checks the compositor-side invariants: a resource
/// is only created when no other resource is alive, elements only reference
/// live resources, and elements are only added or removed inside an open
/// update.
pub fn check_lifecycle(calls: &[Call]) -> Result<(), String> {
    let mut live_resources: Vec<ResourceHandle> = Vec::new();
    let mut live_elements: Vec<ElementHandle> = Vec::new();
    let mut open_update: Option<UpdateHandle> = None;

    for (i, call) in calls.iter().enumerate() {
        match call {
            Call::ResourceCreate { handle, .. } if handle.is_valid() => {
                if !live_resources.is_empty() || !live_elements.is_empty() {
                    return Err(format!("call {i}: resource created while {live_resources:?} alive"));
                }
                live_resources.push(*handle);
            }
            Call::ResourceDelete(handle) => live_resources.retain(|r| r != handle),
            Call::UpdateStart(handle) if handle.is_valid() => {
                if open_update.is_some() {
                    return Err(format!("call {i}: nested update"));
                }
                open_update = Some(*handle);
            }
            Call::UpdateSubmitSync(handle) => {
                if open_update != Some(*handle) {
                    return Err(format!("call {i}: submit of unopened update {handle:?}"));
                }
                open_update = None;
            }
            Call::ElementAdd { update, request, handle } => {
                if open_update != Some(*update) {
                    return Err(format!("call {i}: element added outside its update"));
                }
                if !live_resources.contains(&request.resource) {
                    return Err(format!("call {i}: element references dead resource"));
                }
                if handle.is_valid() {
                    live_elements.push(*handle);
                }
            }
            Call::ElementRemove { update, element } => {
                if open_update != Some(*update) {
                    return Err(format!("call {i}: element removed outside its update"));
                }
                live_elements.retain(|e| e != element);
            }
            _ => {}
        }
    }
    Ok(())
}
