//! Integration tests driving the public API end to end: context
//! selection, device open/start/stop, and the passthrough pipeline.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use audiocore::{ChannelMap, Context, ContextConfig, DeviceConfig, DeviceKind, Format};

fn playback_config() -> DeviceConfig {
    DeviceConfig {
        format: Format::F32,
        channels: 2,
        sample_rate: 48000,
        channel_map: ChannelMap::default_for(2),
        buffer_size_in_frames: 128,
        periods: 2,
        prefer_exclusive_mode: false,
        on_send: None,
        on_recv: None,
        on_stop: None,
    }
}

// S7: open null-backend playback device with onSend returning 0, call
// start -> SUCCESS, STARTED; call stop -> SUCCESS, STOPPED, onStop invoked
// exactly once.
#[test]
fn start_stop_lifecycle_invokes_on_stop_once() {
    let ctx = Context::init_default(ContextConfig::default()).unwrap();

    let mut config = playback_config();
    config.on_send = Some(Box::new(|_frames, _out| 0));
    let device = ctx
        .device_init(DeviceKind::Playback, None, config)
        .unwrap();

    let stop_count = Arc::new(AtomicUsize::new(0));
    let counted = stop_count.clone();
    device.set_stop_callback(move || {
        counted.fetch_add(1, Ordering::SeqCst);
    });

    assert!(!device.is_started());
    device.start().unwrap();
    assert!(device.is_started());

    device.stop().unwrap();
    assert!(!device.is_started());
    assert_eq!(stop_count.load(Ordering::SeqCst), 1);
}

#[test]
fn repeated_start_stop_cycles_invoke_on_stop_each_time() {
    let ctx = Context::init_default(ContextConfig::default()).unwrap();
    let mut config = playback_config();
    config.on_send = Some(Box::new(|_frames, _out| 0));
    let device = ctx
        .device_init(DeviceKind::Playback, None, config)
        .unwrap();

    let stop_count = Arc::new(AtomicUsize::new(0));
    let counted = stop_count.clone();
    device.set_stop_callback(move || {
        counted.fetch_add(1, Ordering::SeqCst);
    });

    for _ in 0..3 {
        device.start().unwrap();
        device.stop().unwrap();
    }

    assert_eq!(stop_count.load(Ordering::SeqCst), 3);
}

#[test]
fn starting_an_already_started_device_is_rejected() {
    let ctx = Context::init_default(ContextConfig::default()).unwrap();
    let mut config = playback_config();
    config.on_send = Some(Box::new(|_frames, _out| 0));
    let device = ctx
        .device_init(DeviceKind::Playback, None, config)
        .unwrap();

    device.start().unwrap();
    assert!(device.start().is_err());
    device.stop().unwrap();
}

#[test]
fn stopping_a_stopped_device_is_rejected() {
    let ctx = Context::init_default(ContextConfig::default()).unwrap();
    let config = playback_config();
    let device = ctx
        .device_init(DeviceKind::Playback, None, config)
        .unwrap();

    assert!(device.stop().is_err());
}

// S8: requested config matches the granted config on all four axes -> the
// pipeline's passthrough fast path is used end to end through the device.
#[test]
fn matching_config_runs_through_the_device_without_error() {
    let ctx = Context::init_default(ContextConfig::default()).unwrap();
    let mut config = playback_config();
    config.on_send = Some(Box::new(|frames, out| {
        out.iter_mut().for_each(|b| *b = 0);
        frames
    }));
    let device = ctx
        .device_init(DeviceKind::Playback, None, config)
        .unwrap();

    assert_eq!(device.internal_format(), Format::F32);
    assert_eq!(device.internal_channels(), 2);

    device.start().unwrap();
    device.stop().unwrap();
}

#[test]
fn enumerate_devices_two_call_idiom_is_consistent() {
    let ctx = Context::init_default(ContextConfig::default()).unwrap();
    let devices = ctx.enumerate_devices(DeviceKind::Capture).unwrap();
    assert!(!devices.is_empty());
}
