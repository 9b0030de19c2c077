//! The DSP pipeline: `readFrames(n, flush) -> k`, composing format
//! conversion, sample-rate conversion, and channel mixing/remapping into one
//! lazy operation.

use crate::channel::ChannelMap;
use crate::error::Error;
use crate::format::{self, Format};
use crate::mix::{self, MixPolicy};
use crate::resample::{FrameSource, SrcConfig, SrcState};

/// Pulls raw, interleaved frames in the pipeline's upstream format.
///
/// Implemented by whatever sits on the other side of the pipeline: the
/// application's `onSend` callback for playback, or a backend ring buffer
/// for capture. Returning fewer frames than requested signals exhaustion.
pub trait FrameReader {
    fn read(&mut self, out: &mut [u8], max_frames: usize, frame_size: usize) -> usize;
}

/// Static description of both ends of the pipeline.
#[derive(Debug, Clone)]
pub struct DspConfig {
    pub src_format: Format,
    pub src_channels: usize,
    pub src_rate: u32,
    pub src_map: ChannelMap,

    pub dst_format: Format,
    pub dst_channels: usize,
    pub dst_rate: u32,
    pub dst_map: ChannelMap,

    /// Policy used when `src_channels != dst_channels`. Unused when channel
    /// counts match.
    pub mix_policy: MixPolicy,
}

/// Up to this many frames are staged through the intermediate f32 buffers
/// per internal chunk (matches the SRC's own cache bound).
const STAGING_FRAMES: usize = 512;

struct RawToF32Source<'a> {
    reader: &'a mut dyn FrameReader,
    format: Format,
}

impl FrameSource for RawToF32Source<'_> {
    fn read(&mut self, out: &mut [f32], channels: usize) -> usize {
        let n_frames = out.len() / channels;
        let sample_size = self.format.size_in_bytes();
        let mut raw = vec![0u8; n_frames * sample_size * channels];
        let got = self.reader.read(&mut raw, n_frames, sample_size * channels);
        for i in 0..got * channels {
            out[i] = format::read_to_f32(self.format, &raw[i * sample_size..]);
        }
        got
    }
}

fn read_raw_to_f32(
    reader: &mut dyn FrameReader,
    src_format: Format,
    channels: usize,
    out: &mut [f32],
    max_frames: usize,
) -> usize {
    let sample_size = src_format.size_in_bytes();
    let mut raw = vec![0u8; max_frames * sample_size * channels];
    let got = reader.read(&mut raw, max_frames, sample_size * channels);
    for i in 0..got * channels {
        out[i] = format::read_to_f32(src_format, &raw[i * sample_size..]);
    }
    got
}

/// Per-device DSP pipeline state (component C4).
pub struct Pipeline {
    config: DspConfig,
    src: Option<SrcState>,
    shuffle: Option<Vec<usize>>,
    mixing_required: bool,
    passthrough: bool,
    /// Ping-pong staging buffer: post-SRC, pre-mix (`src_channels` wide).
    buf_a: Vec<f32>,
    /// Ping-pong staging buffer: post-mix, pre-remap (`dst_channels` wide).
    buf_b: Vec<f32>,
}

impl Pipeline {
    pub fn new(config: DspConfig) -> Result<Self, Error> {
        if !(1..=32).contains(&config.src_channels) || !(1..=32).contains(&config.dst_channels) {
            return Err(Error::InvalidDeviceConfig);
        }
        if config.src_rate == 0 || config.dst_rate == 0 {
            return Err(Error::InvalidDeviceConfig);
        }

        let src_required = config.src_rate != config.dst_rate;
        let mixing_required = config.src_channels != config.dst_channels;
        let shuffle = mix::build_shuffle_table(&config.dst_map, &config.src_map);

        let passthrough = !src_required
            && !mixing_required
            && shuffle.is_none()
            && config.src_format == config.dst_format;

        let src = if src_required {
            Some(SrcState::new(SrcConfig {
                rate_in: config.src_rate,
                rate_out: config.dst_rate,
                channels: config.src_channels,
            })?)
        } else {
            None
        };

        let max_c = config.src_channels.max(config.dst_channels);
        Ok(Pipeline {
            shuffle,
            mixing_required,
            passthrough,
            src,
            buf_a: vec![0.0; STAGING_FRAMES * max_c],
            buf_b: vec![0.0; STAGING_FRAMES * max_c],
            config,
        })
    }

    /// True when format, channel count, rate and channel map are identical
    /// end-to-end; the fast path short-circuits every stage.
    #[inline]
    pub fn is_passthrough(&self) -> bool {
        self.passthrough
    }

    pub fn config(&self) -> &DspConfig {
        &self.config
    }

    /// Applies a dynamic rate change, lazily constructing the embedded SRC
    /// if the pipeline didn't need one before. §9: whether an in-flight
    /// stream must be drained first is left to the caller; this method
    /// performs the swap immediately.
    pub fn set_rates(&mut self, rate_in: u32, rate_out: u32) -> Result<(), Error> {
        if rate_in == 0 || rate_out == 0 {
            return Err(Error::InvalidDeviceConfig);
        }
        self.config.src_rate = rate_in;
        self.config.dst_rate = rate_out;
        if rate_in == rate_out {
            self.src = None;
        } else if let Some(src) = &mut self.src {
            src.set_rates(rate_in, rate_out)?;
        } else {
            self.src = Some(SrcState::new(SrcConfig {
                rate_in,
                rate_out,
                channels: self.config.src_channels,
            })?);
        }
        self.recompute_passthrough();
        Ok(())
    }

    fn recompute_passthrough(&mut self) {
        self.passthrough = self.src.is_none()
            && !self.mixing_required
            && self.shuffle.is_none()
            && self.config.src_format == self.config.dst_format;
    }

    /// Pulls up to `n` frames from `reader`, writing `k <= n` frames
    /// (interleaved, in `dst_format`) into `out`. `out` must hold at least
    /// `n * dst_channels * dst_format.size_in_bytes()` bytes.
    pub fn read_frames(
        &mut self,
        reader: &mut dyn FrameReader,
        out: &mut [u8],
        n: usize,
        flush: bool,
    ) -> usize {
        let dst_frame_size = self.config.dst_format.size_in_bytes() * self.config.dst_channels;

        if self.passthrough {
            return reader.read(out, n, dst_frame_size);
        }

        let cin = self.config.src_channels;
        let cout = self.config.dst_channels;
        let dst_sample_size = self.config.dst_format.size_in_bytes();

        let mut total = 0usize;
        while total < n {
            let chunk = (n - total).min(STAGING_FRAMES);

            let produced = if let Some(src) = &mut self.src {
                let mut adapter = RawToF32Source {
                    reader,
                    format: self.config.src_format,
                };
                src.read(&mut adapter, &mut self.buf_a[..chunk * cin], chunk, flush)
            } else {
                read_raw_to_f32(reader, self.config.src_format, cin, &mut self.buf_a, chunk)
            };

            if produced == 0 {
                break;
            }

            for i in 0..produced {
                let in_frame = &self.buf_a[i * cin..i * cin + cin];

                let mixed: &mut [f32] = if self.mixing_required {
                    let dst = &mut self.buf_b[..cout];
                    mix::mix_frame(self.config.mix_policy, in_frame, dst);
                    dst
                } else {
                    self.buf_b[..cout].copy_from_slice(in_frame);
                    &mut self.buf_b[..cout]
                };

                let out_off = (total + i) * dst_frame_size;
                if let Some(shuffle) = &self.shuffle {
                    let mut remapped = [0.0f32; 32];
                    mix::remap_frame(shuffle, mixed, &mut remapped[..cout]);
                    for c in 0..cout {
                        format::write_from_f32(
                            self.config.dst_format,
                            remapped[c],
                            &mut out[out_off + c * dst_sample_size..],
                        );
                    }
                } else {
                    for c in 0..cout {
                        format::write_from_f32(
                            self.config.dst_format,
                            mixed[c],
                            &mut out[out_off + c * dst_sample_size..],
                        );
                    }
                }
            }

            total += produced;
            if produced < chunk {
                break;
            }
        }

        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ChannelId;

    struct VecReader {
        data: Vec<u8>,
        pos: usize,
    }

    impl FrameReader for VecReader {
        fn read(&mut self, out: &mut [u8], max_frames: usize, frame_size: usize) -> usize {
            let remaining_frames = (self.data.len() - self.pos) / frame_size;
            let take_frames = remaining_frames.min(max_frames);
            let bytes = take_frames * frame_size;
            out[..bytes].copy_from_slice(&self.data[self.pos..self.pos + bytes]);
            self.pos += bytes;
            take_frames
        }
    }

    fn mono_map() -> ChannelMap {
        ChannelMap::new(vec![ChannelId::FrontCenter]).unwrap()
    }

    // S8: requested config matches granted config on all four axes ->
    // passthrough, single underlying read, no intermediate copy logic hit.
    #[test]
    fn s8_passthrough_detection() {
        let map = mono_map();
        let config = DspConfig {
            src_format: Format::F32,
            src_channels: 1,
            src_rate: 48000,
            src_map: map.clone(),
            dst_format: Format::F32,
            dst_channels: 1,
            dst_rate: 48000,
            dst_map: map,
            mix_policy: MixPolicy::Drop,
        };
        let pipeline = Pipeline::new(config).unwrap();
        assert!(pipeline.is_passthrough());
    }

    #[test]
    fn passthrough_reads_directly_from_source() {
        let map = mono_map();
        let config = DspConfig {
            src_format: Format::I16,
            src_channels: 1,
            src_rate: 44100,
            src_map: map.clone(),
            dst_format: Format::I16,
            dst_channels: 1,
            dst_rate: 44100,
            dst_map: map,
            mix_policy: MixPolicy::Drop,
        };
        let mut pipeline = Pipeline::new(config).unwrap();
        assert!(pipeline.is_passthrough());

        let samples: [i16; 4] = [1, 2, 3, 4];
        let mut data = Vec::new();
        for s in samples {
            data.extend_from_slice(&s.to_le_bytes());
        }
        let mut reader = VecReader { data, pos: 0 };
        let mut out = [0u8; 8];
        let k = pipeline.read_frames(&mut reader, &mut out, 4, false);
        assert_eq!(k, 4);
        assert_eq!(out, [1, 0, 2, 0, 3, 0, 4, 0]);
    }

    #[test]
    fn non_passthrough_converts_channel_count_and_format() {
        let stereo = ChannelMap::new(vec![ChannelId::FrontLeft, ChannelId::FrontRight]).unwrap();
        let mono = mono_map();
        let config = DspConfig {
            src_format: Format::F32,
            src_channels: 2,
            src_rate: 48000,
            src_map: stereo,
            dst_format: Format::I16,
            dst_channels: 1,
            dst_rate: 48000,
            dst_map: mono,
            mix_policy: MixPolicy::Blend,
        };
        let mut pipeline = Pipeline::new(config).unwrap();
        assert!(!pipeline.is_passthrough());

        // Two stereo frames: (1.0, 0.0), (0.5, 0.5) -> mono blend [0.5, 0.5]
        let frames: [f32; 4] = [1.0, 0.0, 0.5, 0.5];
        let mut data = Vec::new();
        for s in frames {
            data.extend_from_slice(&s.to_le_bytes());
        }
        let mut reader = VecReader { data, pos: 0 };
        let mut out = [0u8; 4];
        let k = pipeline.read_frames(&mut reader, &mut out, 2, false);
        assert_eq!(k, 2);
        let vals: Vec<i16> = out.chunks(2).map(|c| i16::from_le_bytes([c[0], c[1]])).collect();
        assert_eq!(vals, vec![16384, 16384]);
    }

    #[test]
    fn dynamic_rate_change_toggles_passthrough() {
        let map = mono_map();
        let config = DspConfig {
            src_format: Format::F32,
            src_channels: 1,
            src_rate: 48000,
            src_map: map.clone(),
            dst_format: Format::F32,
            dst_channels: 1,
            dst_rate: 48000,
            dst_map: map,
            mix_policy: MixPolicy::Drop,
        };
        let mut pipeline = Pipeline::new(config).unwrap();
        assert!(pipeline.is_passthrough());
        pipeline.set_rates(44100, 48000).unwrap();
        assert!(!pipeline.is_passthrough());
        pipeline.set_rates(48000, 48000).unwrap();
        assert!(pipeline.is_passthrough());
    }
}
