//! The device object (C6): owns backend state, the DSP pipeline, the
//! worker, and the application-facing callbacks.

use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use crate::backend::{BackendDevice, BreakHandle, DeviceKind, GrantedConfig};
use crate::channel::ChannelMap;
use crate::config::DeviceConfig;
use crate::error::Error;
use crate::format::Format;
use crate::pipeline::{DspConfig, Pipeline};
use crate::state::{DeviceState, StateCell};
use crate::sync::AutoResetEvent;
use crate::worker;

pub(crate) type SendCallback = Box<dyn FnMut(usize, &mut [u8]) -> usize + Send>;
pub(crate) type RecvCallback = Box<dyn FnMut(usize, &[u8]) + Send>;
pub(crate) type StopCallback = Box<dyn FnMut() + Send>;

/// State shared between the `Device` handle and its worker thread.
pub(crate) struct DeviceShared {
    pub(crate) state: StateCell,
    pub(crate) wakeup_event: AutoResetEvent,
    pub(crate) start_event: AutoResetEvent,
    pub(crate) stop_event: AutoResetEvent,
    pub(crate) work_result: Mutex<Option<Result<(), Error>>>,

    pub(crate) kind: DeviceKind,
    pub(crate) pipeline: Mutex<Pipeline>,
    pub(crate) internal_frame_size: usize,
    pub(crate) break_handle: Arc<dyn BreakHandle>,

    pub(crate) send_cb: Mutex<Option<SendCallback>>,
    pub(crate) recv_cb: Mutex<Option<RecvCallback>>,
    pub(crate) stop_cb: Mutex<Option<StopCallback>>,
}

/// A live device. Created by [`crate::context::Context::device_init`],
/// destroyed by dropping (equivalent to `device_uninit`/`close`).
pub struct Device {
    shared: Arc<DeviceShared>,
    /// Serializes `start()`/`stop()` handshakes at the API level; the
    /// worker itself only ever touches `shared.state` atomically.
    handshake: Mutex<()>,
    worker: Option<JoinHandle<()>>,
    pub(crate) internal: GrantedConfig,
}

impl Device {
    pub(crate) fn new(
        kind: DeviceKind,
        mut requested: DeviceConfig,
        internal: GrantedConfig,
        backend_device: Box<dyn BackendDevice>,
        break_handle: Arc<dyn BreakHandle>,
    ) -> Result<Self, Error> {
        let (src_format, src_channels, src_rate, src_map, dst_format, dst_channels, dst_rate, dst_map) =
            match kind {
                DeviceKind::Playback => (
                    requested.format,
                    requested.channels,
                    requested.sample_rate,
                    requested.channel_map.clone(),
                    internal.format,
                    internal.channels,
                    internal.sample_rate,
                    internal.channel_map.clone(),
                ),
                DeviceKind::Capture => (
                    internal.format,
                    internal.channels,
                    internal.sample_rate,
                    internal.channel_map.clone(),
                    requested.format,
                    requested.channels,
                    requested.sample_rate,
                    requested.channel_map.clone(),
                ),
            };

        let pipeline = Pipeline::new(DspConfig {
            src_format,
            src_channels,
            src_rate,
            src_map,
            dst_format,
            dst_channels,
            dst_rate,
            dst_map,
            mix_policy: crate::mix::MixPolicy::Blend,
        })?;

        let internal_frame_size = internal.format.size_in_bytes() * internal.channels;

        let shared = Arc::new(DeviceShared {
            state: StateCell::new(DeviceState::Stopped),
            wakeup_event: AutoResetEvent::new(),
            start_event: AutoResetEvent::new(),
            stop_event: AutoResetEvent::new(),
            work_result: Mutex::new(None),
            kind,
            pipeline: Mutex::new(pipeline),
            internal_frame_size,
            break_handle,
            send_cb: Mutex::new(requested.on_send.take()),
            recv_cb: Mutex::new(requested.on_recv.take()),
            stop_cb: Mutex::new(requested.on_stop.take()),
        });

        let worker_shared = shared.clone();
        let worker = std::thread::Builder::new()
            .name("audiocore-worker".into())
            .spawn(move || worker::run_worker(worker_shared, backend_device))
            .map_err(|_| Error::FailedToCreateThread)?;

        // The worker's first loop pass signals stopEvent as soon as it has
        // settled into STOPPED (§4.7 step 2, run unconditionally even on
        // the first iteration). Wait for it here so `device_init` doesn't
        // return until the worker is actually alive and the event is
        // consumed, leaving it primed for the first real stop handshake.
        shared.stop_event.wait();

        Ok(Device {
            shared,
            handshake: Mutex::new(()),
            worker: Some(worker),
            internal,
        })
    }

    pub fn internal_format(&self) -> Format {
        self.internal.format
    }

    pub fn internal_channels(&self) -> usize {
        self.internal.channels
    }

    pub fn internal_sample_rate(&self) -> u32 {
        self.internal.sample_rate
    }

    pub fn internal_channel_map(&self) -> &ChannelMap {
        &self.internal.channel_map
    }

    pub fn set_send_callback(&self, cb: impl FnMut(usize, &mut [u8]) -> usize + Send + 'static) {
        *self.shared.send_cb.lock().unwrap() = Some(Box::new(cb));
    }

    pub fn set_recv_callback(&self, cb: impl FnMut(usize, &[u8]) + Send + 'static) {
        *self.shared.recv_cb.lock().unwrap() = Some(Box::new(cb));
    }

    pub fn set_stop_callback(&self, cb: impl FnMut() + Send + 'static) {
        *self.shared.stop_cb.lock().unwrap() = Some(Box::new(cb));
    }

    pub fn is_started(&self) -> bool {
        self.shared.state.load() == DeviceState::Started
    }

    /// Starts the device. Requires the current state to be STOPPED.
    pub fn start(&self) -> Result<(), Error> {
        let _guard = self.handshake.lock().unwrap();
        match self.shared.state.load() {
            DeviceState::Stopped => {}
            DeviceState::Starting => return Err(Error::DeviceAlreadyStarting),
            DeviceState::Started => return Err(Error::DeviceAlreadyStarted),
            DeviceState::Stopping => return Err(Error::DeviceBusy),
            DeviceState::Uninitialized => return Err(Error::DeviceNotInitialized),
        }

        self.shared.state.store(DeviceState::Starting);
        self.shared.wakeup_event.signal();
        self.shared.start_event.wait();

        self.shared
            .work_result
            .lock()
            .unwrap()
            .take()
            .unwrap_or(Ok(()))
    }

    /// Stops the device. Requires the current state to be STARTED.
    pub fn stop(&self) -> Result<(), Error> {
        let _guard = self.handshake.lock().unwrap();
        match self.shared.state.load() {
            DeviceState::Started => {}
            DeviceState::Stopping => return Err(Error::DeviceAlreadyStopping),
            DeviceState::Stopped => return Err(Error::DeviceAlreadyStopped),
            DeviceState::Starting => return Err(Error::DeviceBusy),
            DeviceState::Uninitialized => return Err(Error::DeviceNotInitialized),
        }

        self.shared.state.store(DeviceState::Stopping);
        self.shared.break_handle.break_main_loop();
        self.shared.stop_event.wait();
        Ok(())
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        let was_started = self.shared.state.load() == DeviceState::Started;
        if was_started {
            let _ = self.stop();
        }
        self.shared.state.store(DeviceState::Uninitialized);
        self.shared.wakeup_event.signal();
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}
