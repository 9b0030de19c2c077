//! The backend contract (§4.5): the uniform set of operations each OS
//! driver binding would implement. The core invokes these and nothing else.

use std::sync::Arc;

use crate::config::DeviceConfig;
use crate::error::Error;

/// Playback opens an output device and pulls frames from the application;
/// capture opens an input device and pushes frames to the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Playback,
    Capture,
}

/// Opaque id + friendly name, as returned by `enumerate_devices`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub id: String,
    pub name: String,
}

/// The device configuration a backend actually granted, which may differ
/// from what was requested (§3, "internal configuration").
#[derive(Debug, Clone)]
pub struct GrantedConfig {
    pub format: crate::format::Format,
    pub channels: usize,
    pub sample_rate: u32,
    pub channel_map: crate::channel::ChannelMap,
    pub buffer_size_in_frames: u32,
}

/// How a backend drives data through the pipeline.
///
/// Most native APIs (ALSA, PulseAudio, OSS, OpenSL|ES) hand the core a
/// blocking wait plus a buffer to fill/drain — the core's worker (C7)
/// drives them. A few (WASAPI's event-driven `IAudioClient`, CoreAudio's
/// `AudioUnit` render callback) instead call back into the application from
/// their own real-time thread; those backends implement `start_backend`/
/// `stop_backend` as direct transitions and never enter `main_loop`, per
/// §4.5. Only [`DriveMode::GenericWorker`] is exercised by the backends in
/// this crate; `PushCallback` is part of the contract a future native
/// backend would opt into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveMode {
    GenericWorker,
    PushCallback,
}

/// The per-period callback surface a `GenericWorker` backend's `main_loop`
/// pumps through. Implemented by the worker; backends never see the DSP
/// pipeline or the application's callbacks directly.
pub trait PumpSink {
    /// Called once per period with `frames` frames worth of room in
    /// `buffer` (raw bytes, backend-native format). For playback the sink
    /// fills `buffer`; for capture it consumes what the backend already
    /// wrote into `buffer`.
    fn pump(&mut self, buffer: &mut [u8], frames: usize) -> Result<(), Error>;
}

/// Lets a foreign thread signal a running `main_loop` to return, without
/// needing the exclusive access `main_loop` itself holds over the backend
/// device. Cheaply cloneable/shareable (typically an `Arc` around a flag or
/// a native event handle) so `Device::stop` can hold one independently of
/// the worker thread owning the `BackendDevice`.
pub trait BreakHandle: Send + Sync {
    /// Signals the worker's wait inside `main_loop` to return immediately.
    fn break_main_loop(&self);
}

/// The open, backend-owned half of a device. Lives inside the worker
/// thread for `GenericWorker` backends.
pub trait BackendDevice: Send {
    /// Releases backend device resources (`device_uninit`).
    fn device_uninit(&mut self);

    /// Begins streaming. For playback, primes the device with one buffer's
    /// worth of frames before returning, by calling `pump` on `sink` once.
    fn start_backend(&mut self, sink: &mut dyn PumpSink) -> Result<(), Error>;

    /// Stops streaming; may block until the current fragment completes.
    fn stop_backend(&mut self) -> Result<(), Error>;

    /// Loop of: wait for the next buffer event, pump data, repeat until
    /// `break_main_loop` is invoked. Only called for `DriveMode::GenericWorker`
    /// backends, after a successful `start_backend`.
    fn main_loop(&mut self, sink: &mut dyn PumpSink) -> Result<(), Error>;
}

/// The backend contract itself (component C5): process-level probing,
/// enumeration, and opening devices.
pub trait Backend: Send + Sync {
    /// Probes availability and loads runtime symbols. Called once per
    /// context. Fails with [`Error::NoBackend`] if the backend isn't
    /// present on this platform.
    fn context_init(&mut self) -> Result<(), Error>;

    /// Releases runtime symbols and process-global backend state.
    fn context_uninit(&mut self);

    fn drive_mode(&self) -> DriveMode;

    /// Fills in the devices of the given kind. Mirrors the two-call idiom
    /// at the application layer, but here simply returns the full list —
    /// `Context::enumerate_devices` performs the count/fill split.
    fn enumerate_devices(&self, kind: DeviceKind) -> Result<Vec<DeviceInfo>, Error>;

    /// Opens a backend device. `id = None` means "the backend's default
    /// device of this kind". Returns the opened device, a break handle for
    /// it, plus the config the backend actually granted.
    fn device_init(
        &self,
        kind: DeviceKind,
        id: Option<&str>,
        config: &DeviceConfig,
    ) -> Result<(Box<dyn BackendDevice>, Arc<dyn BreakHandle>, GrantedConfig), Error>;
}
