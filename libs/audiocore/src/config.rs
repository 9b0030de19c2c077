//! Device and context configuration (§3's "Device configuration" bundle).

use crate::channel::ChannelMap;
use crate::error::Error;
use crate::format::Format;

/// Default period length used to resolve `buffer_size_in_frames == 0`.
const DEFAULT_PERIOD_MS: u32 = 25;

/// Whether a backend should be asked to open the device exclusively or let
/// it be shared with other applications. A hint only: a backend may ignore
/// it, same as the raw `prefer_exclusive_mode` flag it's derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShareMode {
    #[default]
    Share,
    Exclusive,
}

/// The application-facing device configuration bundle (§3).
pub struct DeviceConfig {
    pub format: Format,
    /// 1..=32.
    pub channels: usize,
    /// 1..=384000.
    pub sample_rate: u32,
    pub channel_map: ChannelMap,
    /// 0 resolves to `(sample_rate / 1000) * DEFAULT_PERIOD_MS`.
    pub buffer_size_in_frames: u32,
    /// 0 resolves to 2.
    pub periods: u32,
    pub prefer_exclusive_mode: bool,

    pub on_send: Option<Box<dyn FnMut(usize, &mut [u8]) -> usize + Send>>,
    pub on_recv: Option<Box<dyn FnMut(usize, &[u8]) + Send>>,
    pub on_stop: Option<Box<dyn FnMut() + Send>>,
}

impl DeviceConfig {
    /// Validates the bundle and resolves the two zero-defaulted fields,
    /// returning a config ready to hand to a backend's `device_init`.
    pub fn resolved(mut self) -> Result<Self, Error> {
        if !(1..=32).contains(&self.channels) {
            return Err(Error::InvalidDeviceConfig);
        }
        if !(1..=384_000).contains(&self.sample_rate) {
            return Err(Error::InvalidDeviceConfig);
        }
        if self.channel_map.len() != self.channels {
            return Err(Error::InvalidDeviceConfig);
        }

        if self.buffer_size_in_frames == 0 {
            self.buffer_size_in_frames = (self.sample_rate / 1000) * DEFAULT_PERIOD_MS;
        }
        if self.periods == 0 {
            self.periods = 2;
        }

        Ok(self)
    }

    pub(crate) fn share_mode(&self) -> ShareMode {
        if self.prefer_exclusive_mode {
            ShareMode::Exclusive
        } else {
            ShareMode::Share
        }
    }
}

impl std::fmt::Debug for DeviceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceConfig")
            .field("format", &self.format)
            .field("channels", &self.channels)
            .field("sample_rate", &self.sample_rate)
            .field("channel_map", &self.channel_map)
            .field("buffer_size_in_frames", &self.buffer_size_in_frames)
            .field("periods", &self.periods)
            .field("prefer_exclusive_mode", &self.prefer_exclusive_mode)
            .finish_non_exhaustive()
    }
}

/// Process-level configuration, handed to `context_init`.
#[derive(Default)]
pub struct ContextConfig {
    /// Receives backend diagnostics that would otherwise only go through the
    /// `tracing` subscriber (see the crate-level docs on logging).
    pub log_sink: Option<Box<dyn Fn(tracing::Level, &str) + Send + Sync>>,
}

impl std::fmt::Debug for ContextConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextConfig")
            .field("log_sink", &self.log_sink.as_ref().map(|_| "<fn>"))
            .finish()
    }
}
