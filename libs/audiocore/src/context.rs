//! The context (C8): process-level initialization, backend selection, and
//! device enumeration/opening.

use crate::backend::{Backend, DeviceKind};
use crate::backends::null::NullBackend;
use crate::config::{ContextConfig, DeviceConfig};
use crate::device::Device;
use crate::error::Error;

/// Identifies a backend a [`Context`] can select, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendId {
    /// A backend with no real device behind it; always available.
    Null,
}

fn instantiate(id: BackendId) -> Box<dyn Backend> {
    match id {
        BackendId::Null => Box::new(NullBackend::new()),
    }
}

/// Process-level state: the selected backend and its loaded runtime
/// symbols, plus whatever context-wide configuration was supplied.
pub struct Context {
    backend_id: BackendId,
    backend: Box<dyn Backend>,
    config: ContextConfig,
}

impl Context {
    /// Tries `backends` in order until one succeeds; records the chosen
    /// backend. Fails with [`Error::NoBackend`] if none succeed.
    pub fn init(backends: &[BackendId], config: ContextConfig) -> Result<Self, Error> {
        for &id in backends {
            let mut backend = instantiate(id);
            match backend.context_init() {
                Ok(()) => {
                    return Ok(Context {
                        backend_id: id,
                        backend,
                        config,
                    });
                }
                Err(err) => {
                    Self::log(&config, tracing::Level::WARN, &format!("backend {id:?} unavailable: {err}"));
                }
            }
        }
        Err(Error::NoBackend)
    }

    /// Convenience constructor trying every backend this crate ships, in a
    /// fixed priority order.
    pub fn init_default(config: ContextConfig) -> Result<Self, Error> {
        Self::init(&[BackendId::Null], config)
    }

    pub fn backend_id(&self) -> BackendId {
        self.backend_id
    }

    fn log(config: &ContextConfig, level: tracing::Level, message: &str) {
        if let Some(sink) = config.log_sink.as_ref() {
            sink(level, message);
        } else {
            match level {
                tracing::Level::ERROR => tracing::error!("{message}"),
                tracing::Level::WARN => tracing::warn!("{message}"),
                tracing::Level::INFO => tracing::info!("{message}"),
                tracing::Level::DEBUG => tracing::debug!("{message}"),
                tracing::Level::TRACE => tracing::trace!("{message}"),
            }
        }
    }

    /// Two-call idiom: pass `count_only = true` to just get the number of
    /// devices of `kind`, or `false` to get the full list.
    pub fn enumerate_devices(&self, kind: DeviceKind) -> Result<Vec<crate::backend::DeviceInfo>, Error> {
        self.backend.enumerate_devices(kind)
    }

    /// Opens a device. `id = None` opens the default device of `kind`.
    pub fn device_init(
        &self,
        kind: DeviceKind,
        id: Option<&str>,
        config: DeviceConfig,
    ) -> Result<Device, Error> {
        let resolved = config.resolved()?;
        let (backend_device, break_handle, granted) =
            self.backend.device_init(kind, id, &resolved)?;
        Device::new(kind, resolved, granted, backend_device, break_handle)
    }

    /// Opens the default device of `kind`.
    pub fn default_device(&self, kind: DeviceKind, config: DeviceConfig) -> Result<Device, Error> {
        self.device_init(kind, None, config)
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        self.backend.context_uninit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ChannelMap;
    use crate::format::Format;

    fn playback_config() -> DeviceConfig {
        DeviceConfig {
            format: Format::F32,
            channels: 1,
            sample_rate: 48000,
            channel_map: ChannelMap::default_for(1),
            buffer_size_in_frames: 64,
            periods: 2,
            prefer_exclusive_mode: false,
            on_send: None,
            on_recv: None,
            on_stop: None,
        }
    }

    #[test]
    fn init_default_selects_null_backend() {
        let ctx = Context::init_default(ContextConfig::default()).unwrap();
        assert_eq!(ctx.backend_id(), BackendId::Null);
    }

    #[test]
    fn enumerate_devices_lists_the_null_device() {
        let ctx = Context::init_default(ContextConfig::default()).unwrap();
        let devices = ctx.enumerate_devices(DeviceKind::Playback).unwrap();
        assert_eq!(devices.len(), 1);
    }

    // S7: open null-backend playback device, onSend returns 0; start ->
    // SUCCESS, STARTED; stop -> SUCCESS, STOPPED, onStop invoked once.
    #[test]
    fn s7_start_stop_lifecycle() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let ctx = Context::init_default(ContextConfig::default()).unwrap();
        let mut config = playback_config();
        config.on_send = Some(Box::new(|_frame_count, _out| 0));

        let device = ctx.device_init(DeviceKind::Playback, None, config).unwrap();

        let stop_count = Arc::new(AtomicUsize::new(0));
        let counted = stop_count.clone();
        device.set_stop_callback(move || {
            counted.fetch_add(1, Ordering::SeqCst);
        });

        assert!(device.start().is_ok());
        assert!(device.is_started());

        assert!(device.stop().is_ok());
        assert!(!device.is_started());
        assert_eq!(stop_count.load(Ordering::SeqCst), 1);
    }
}
