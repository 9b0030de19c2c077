//! Sample-rate conversion: passthrough and two-tap linear interpolation.

use crate::error::Error;

/// Which resampling algorithm an [`SrcState`] runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    /// Identity, modulo format conversion. Used when `rate_in == rate_out`.
    None,
    /// Two-tap linear interpolation between successive input frames.
    Linear,
}

/// A source of f32 frames the resampler pulls from to refill its cache.
///
/// Implementations read up to `frames.len() / channels` frames and return
/// how many were actually produced; returning fewer than requested signals
/// exhaustion (end of stream for this read).
pub trait FrameSource {
    fn read(&mut self, out: &mut [f32], channels: usize) -> usize;
}

/// Resampler configuration. Rates may be changed between reads (dynamic
/// rate change), which recomputes `algorithm` but keeps the window state.
#[derive(Debug, Clone, Copy)]
pub struct SrcConfig {
    pub rate_in: u32,
    pub rate_out: u32,
    pub channels: usize,
}

const MAX_CACHE_FRAMES: usize = 512;

impl SrcConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if self.rate_in == 0 || self.rate_out == 0 {
            return Err(Error::InvalidArgs);
        }
        if self.channels == 0 || self.channels > 32 {
            return Err(Error::InvalidArgs);
        }
        Ok(())
    }

    fn algorithm(&self) -> Algorithm {
        if self.rate_in == self.rate_out {
            Algorithm::None
        } else {
            Algorithm::Linear
        }
    }
}

/// Per-device resampler state.
pub struct SrcState {
    config: SrcConfig,
    algorithm: Algorithm,
    cache: Vec<f32>,
    cache_capacity_frames: usize,
    prev: Vec<f32>,
    next: Vec<f32>,
    is_prev_loaded: bool,
    is_next_loaded: bool,
    alpha: f64,
}

impl SrcState {
    pub fn new(config: SrcConfig) -> Result<Self, Error> {
        config.validate()?;
        let channels = config.channels;
        Ok(SrcState {
            algorithm: config.algorithm(),
            config,
            cache: Vec::new(),
            cache_capacity_frames: MAX_CACHE_FRAMES,
            prev: vec![0.0; channels],
            next: vec![0.0; channels],
            is_prev_loaded: false,
            is_next_loaded: false,
            alpha: 0.0,
        })
    }

    #[inline]
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    #[inline]
    pub fn config(&self) -> SrcConfig {
        self.config
    }

    /// Applies a dynamic rate change. A `none <-> linear` transition simply
    /// recomputes `algorithm`; window state (`prev`/`next`/`alpha`) carries
    /// over unchanged, per §4.2.
    pub fn set_rates(&mut self, rate_in: u32, rate_out: u32) -> Result<(), Error> {
        let new_config = SrcConfig {
            rate_in,
            rate_out,
            channels: self.config.channels,
        };
        new_config.validate()?;
        self.config = new_config;
        self.algorithm = new_config.algorithm();
        Ok(())
    }

    /// Sets the cache capacity in frames, clamped to `MAX_CACHE_FRAMES`.
    pub fn set_cache_capacity(&mut self, frames: usize) {
        self.cache_capacity_frames = frames.min(MAX_CACHE_FRAMES);
    }

    fn ratio(&self) -> f64 {
        self.config.rate_in as f64 / self.config.rate_out as f64
    }

    fn channels(&self) -> usize {
        self.config.channels
    }

    /// Tries to load the next frame from `source` into `next`. Returns
    /// `false` if the source is exhausted.
    fn load_next(&mut self, source: &mut dyn FrameSource) -> bool {
        let channels = self.channels();
        let mut buf = vec![0.0f32; channels];
        let produced = source.read(&mut buf, channels);
        if produced == 0 {
            self.is_next_loaded = false;
            return false;
        }
        self.next.copy_from_slice(&buf);
        self.is_next_loaded = true;
        true
    }

    fn load_prev(&mut self, source: &mut dyn FrameSource) -> bool {
        let channels = self.channels();
        let mut buf = vec![0.0f32; channels];
        let produced = source.read(&mut buf, channels);
        if produced == 0 {
            self.is_prev_loaded = false;
            return false;
        }
        self.prev.copy_from_slice(&buf);
        self.is_prev_loaded = true;
        true
    }

    /// Produces up to `max_frames` output frames into `out` (f32,
    /// interleaved, `channels` per frame). Returns the number of frames
    /// actually written.
    ///
    /// `flush`: when the input is exhausted mid-window, `true` causes the
    /// unfinished window to be emitted with a zeroed `next` slot; `false`
    /// retains the partial window for a subsequent call.
    pub fn read(
        &mut self,
        source: &mut dyn FrameSource,
        out: &mut [f32],
        max_frames: usize,
        flush: bool,
    ) -> usize {
        match self.algorithm {
            Algorithm::None => self.read_passthrough(source, out, max_frames),
            Algorithm::Linear => self.read_linear(source, out, max_frames, flush),
        }
    }

    fn read_passthrough(
        &mut self,
        source: &mut dyn FrameSource,
        out: &mut [f32],
        max_frames: usize,
    ) -> usize {
        let channels = self.channels();
        let produced = source.read(&mut out[..max_frames * channels], channels);
        produced
    }

    fn read_linear(
        &mut self,
        source: &mut dyn FrameSource,
        out: &mut [f32],
        max_frames: usize,
        flush: bool,
    ) -> usize {
        let channels = self.channels();
        let phi = self.ratio();

        if !self.is_prev_loaded && !self.load_prev(source) {
            return 0;
        }
        if !self.is_next_loaded {
            self.load_next(source);
        }

        let mut written = 0usize;
        while written < max_frames {
            if !self.is_next_loaded {
                if flush {
                    self.next.iter_mut().for_each(|v| *v = 0.0);
                } else {
                    break;
                }
            }

            let alpha = self.alpha as f32;
            for c in 0..channels {
                out[written * channels + c] = self.prev[c] * (1.0 - alpha) + self.next[c] * alpha;
            }
            written += 1;

            let alpha_next = self.alpha + phi;
            let k = alpha_next.floor() as u64;
            self.alpha = alpha_next - k as f64;

            for _ in 0..k {
                let next_was_real = self.is_next_loaded;
                self.prev.copy_from_slice(&self.next);
                self.is_prev_loaded = next_was_real;
                if !self.load_next(source) {
                    // The first time the window runs dry we still have a
                    // real `prev` (just shifted in) to pair with a
                    // zero-padded `next`. Only once we shift a second time
                    // with nothing real behind `next` does `prev` itself
                    // become stale, per the flush-exhaustion rule.
                    if flush && !next_was_real {
                        self.is_prev_loaded = false;
                    }
                    break;
                }
            }

            if !self.is_next_loaded && !flush {
                break;
            }
            if !self.is_prev_loaded {
                break;
            }
        }

        written
    }
}
