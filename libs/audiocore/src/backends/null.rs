//! The `null` backend: a minimal `GenericWorker` backend with no real
//! device behind it, used for testing the device lifecycle and DSP
//! pipeline wiring without any OS dependency.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::backend::{
    Backend, BackendDevice, BreakHandle, DeviceInfo, DeviceKind, DriveMode, GrantedConfig, PumpSink,
};
use crate::config::DeviceConfig;
use crate::error::Error;

/// How long `main_loop` sleeps between periods. Real backends block on a
/// buffer-ready event instead; this backend has none, so it polls.
const PERIOD_POLL_INTERVAL: Duration = Duration::from_millis(1);

pub struct NullBackend;

impl NullBackend {
    pub fn new() -> Self {
        tracing::info!("null backend initialized");
        NullBackend
    }
}

impl Default for NullBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for NullBackend {
    fn context_init(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn context_uninit(&mut self) {}

    fn drive_mode(&self) -> DriveMode {
        DriveMode::GenericWorker
    }

    fn enumerate_devices(&self, _kind: DeviceKind) -> Result<Vec<DeviceInfo>, Error> {
        Ok(vec![DeviceInfo {
            id: "null".to_string(),
            name: "Null Device".to_string(),
        }])
    }

    fn device_init(
        &self,
        _kind: DeviceKind,
        _id: Option<&str>,
        config: &DeviceConfig,
    ) -> Result<(Box<dyn BackendDevice>, Arc<dyn BreakHandle>, GrantedConfig), Error> {
        let break_flag = Arc::new(AtomicBool::new(false));

        let granted = GrantedConfig {
            format: config.format,
            channels: config.channels,
            sample_rate: config.sample_rate,
            channel_map: config.channel_map.clone(),
            buffer_size_in_frames: config.buffer_size_in_frames,
        };

        let device = NullBackendDevice {
            break_flag: break_flag.clone(),
            frame_size: granted.format.size_in_bytes() * granted.channels,
            period_frames: (granted.buffer_size_in_frames as usize).max(1),
        };

        let handle = NullBreakHandle(break_flag);

        Ok((Box::new(device), Arc::new(handle), granted))
    }
}

struct NullBreakHandle(Arc<AtomicBool>);

impl BreakHandle for NullBreakHandle {
    fn break_main_loop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

struct NullBackendDevice {
    break_flag: Arc<AtomicBool>,
    frame_size: usize,
    period_frames: usize,
}

impl BackendDevice for NullBackendDevice {
    fn device_uninit(&mut self) {}

    fn start_backend(&mut self, sink: &mut dyn PumpSink) -> Result<(), Error> {
        self.break_flag.store(false, Ordering::Relaxed);
        let mut buf = vec![0u8; self.period_frames * self.frame_size];
        sink.pump(&mut buf, self.period_frames)
    }

    fn stop_backend(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn main_loop(&mut self, sink: &mut dyn PumpSink) -> Result<(), Error> {
        let mut buf = vec![0u8; self.period_frames * self.frame_size];
        while !self.break_flag.load(Ordering::Relaxed) {
            sink.pump(&mut buf, self.period_frames)?;
            std::thread::sleep(PERIOD_POLL_INTERVAL);
        }
        Ok(())
    }
}
