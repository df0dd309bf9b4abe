mod common;

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use common::{check_lifecycle, RecordingCompositor};
use novade_dispmanx::compositor::{NativeCall, Screen};
use novade_dispmanx::{ArgbBitmap, DispmanxDevice, HostBootstrap, LifecycleState, PixelFormat};

#[test]
fn concurrent_show_calls_are_serialized() {
    let compositor = Arc::new(
        RecordingCompositor::new(320, 240).with_write_delay(Duration::from_millis(1)),
    );
    let device = Arc::new(DispmanxDevice::new(
        "shared",
        Screen::MainLcd,
        PixelFormat::Argb8888,
        compositor.clone(),
        Arc::new(HostBootstrap::new()),
    ));

    let handles: Vec<_> = (0..4u32)
        .map(|worker| {
            let device = Arc::clone(&device);
            thread::spawn(move || {
                for frame in 0..10u32 {
                    let size = 8 + worker * 4 + frame % 3;
                    device
                        .show_image(&ArgbBitmap::filled(size, size, 0xFF00_0000 | worker))
                        .unwrap();
                    if frame % 4 == 3 {
                        device.show_blank().unwrap();
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let calls = compositor.calls();
    check_lifecycle(&calls).unwrap();
    assert_eq!(compositor.count(NativeCall::HostInit), 1);
    assert_eq!(compositor.count(NativeCall::DisplayOpen), 1);
    assert_eq!(compositor.count(NativeCall::ElementAdd), 40);
    assert_eq!(device.lifecycle_state(), LifecycleState::ElementBound);
}

#[test]
fn mixed_operations_from_many_threads() {
    let compositor = Arc::new(RecordingCompositor::new(200, 100));
    let device = Arc::new(DispmanxDevice::new(
        "mixed",
        Screen::MainLcd,
        PixelFormat::Rgb565,
        compositor.clone(),
        Arc::new(HostBootstrap::new()),
    ));

    let handles: Vec<_> = (0..3u32)
        .map(|worker| {
            let device = Arc::clone(&device);
            thread::spawn(move || {
                for _ in 0..5 {
                    match worker {
                        0 => device.show_grid(10).unwrap(),
                        1 => device.show_calibration_pattern(20, 10).unwrap(),
                        _ => {
                            assert_eq!(device.bounds().unwrap(), (200, 100));
                            device.show_blank().unwrap();
                        }
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    check_lifecycle(&compositor.calls()).unwrap();
}

#[test]
fn bootstrap_runs_once_across_devices() {
    let compositor = Arc::new(RecordingCompositor::new(640, 480));
    let bootstrap = Arc::new(HostBootstrap::new());

    let devices: Vec<_> = [Screen::MainLcd, Screen::Hdmi, Screen::AuxLcd]
        .into_iter()
        .map(|screen| {
            Arc::new(DispmanxDevice::new(
                format!("{screen:?}"),
                screen,
                PixelFormat::Argb8888,
                compositor.clone(),
                Arc::clone(&bootstrap),
            ))
        })
        .collect();

    let handles: Vec<_> = devices
        .iter()
        .map(|device| {
            let device = Arc::clone(device);
            thread::spawn(move || device.bounds().unwrap())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), (640, 480));
    }

    assert_eq!(compositor.count(NativeCall::HostInit), 1);
    assert_eq!(compositor.count(NativeCall::DisplayOpen), 3);
    assert!(bootstrap.is_initialized());

    for device in &devices {
        device.dispose();
    }
    devices[0].bounds().unwrap();
    assert_eq!(compositor.count(NativeCall::HostInit), 1);
}
