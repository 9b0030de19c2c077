//! Channel-count mixing (drop/zero/blend) and channel remapping.

use crate::channel::ChannelMap;

/// How the mixer changes channel count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MixPolicy {
    /// Down-mix: keep the first `Cout` channels, discard the rest.
    /// Up-mix: copy all `Cin` channels, zero the remainder. The same
    /// variant name covers both directions since the behavior falls out of
    /// whichever of `Cin`/`Cout` is larger.
    Drop,
    /// Identical byte-for-byte behavior to `Drop`; kept as a distinct name
    /// because zero-fill is the meaningful half of it (up-mixing).
    Zero,
    /// Down-mix to mono: average. Up-mix from mono: duplicate. Other shapes
    /// fall back to `Drop`/`Zero` (see §9 open question — not redesigned).
    Blend,
}

/// Mixes one frame of `cin` input channels into `cout` output channels,
/// in f32, per `policy`.
pub fn mix_frame(policy: MixPolicy, input: &[f32], output: &mut [f32]) {
    let cin = input.len();
    let cout = output.len();

    match policy {
        MixPolicy::Drop | MixPolicy::Zero => {
            let n = cin.min(cout);
            output[..n].copy_from_slice(&input[..n]);
            for slot in output.iter_mut().skip(n) {
                *slot = 0.0;
            }
        }
        MixPolicy::Blend => {
            if cout == 1 && cin > 1 {
                // Down-mix to mono: average all input channels.
                let sum: f32 = input.iter().sum();
                output[0] = sum / cin as f32;
            } else if cin == 1 && cout > 1 {
                // Up-mix from mono: duplicate to every output channel.
                output.iter_mut().for_each(|v| *v = input[0]);
            } else {
                // Other shapes: fall back to drop/zero.
                mix_frame(MixPolicy::Drop, input, output);
            }
        }
    }
}

/// Applies a precomputed shuffle table: `output[i] = intermediate[shuffle[i]]`.
/// A `shuffle[i]` of `usize::MAX` (no source channel found) zero-fills that
/// output channel instead.
pub fn remap_frame(shuffle: &[usize], intermediate: &[f32], output: &mut [f32]) {
    for (i, &src) in shuffle.iter().enumerate() {
        output[i] = if src == usize::MAX {
            0.0
        } else {
            intermediate[src]
        };
    }
}

/// Precomputes the shuffle table for remapping `input_map` frames into
/// `output_map` order. Returns `None` when no remap stage is needed (see
/// [`ChannelMap::build_shuffle`]).
pub fn build_shuffle_table(output_map: &ChannelMap, input_map: &ChannelMap) -> Option<Vec<usize>> {
    output_map.build_shuffle(input_map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ChannelId;

    // S4: stereo -> mono (blend): [(1.0, 0.0), (0.5, 0.5)] -> [0.5, 0.5]
    #[test]
    fn s4_blend_down_to_mono() {
        let mut out = [0.0f32; 1];
        mix_frame(MixPolicy::Blend, &[1.0, 0.0], &mut out);
        assert_eq!(out, [0.5]);
        mix_frame(MixPolicy::Blend, &[0.5, 0.5], &mut out);
        assert_eq!(out, [0.5]);
    }

    // S5: mono -> stereo (blend): [0.3, -0.7] -> [(0.3, 0.3), (-0.7, -0.7)]
    #[test]
    fn s5_blend_up_from_mono() {
        let mut out = [0.0f32; 2];
        mix_frame(MixPolicy::Blend, &[0.3], &mut out);
        assert_eq!(out, [0.3, 0.3]);
        mix_frame(MixPolicy::Blend, &[-0.7], &mut out);
        assert_eq!(out, [-0.7, -0.7]);
    }

    #[test]
    fn drop_truncates_down_mix() {
        let mut out = [0.0f32; 2];
        mix_frame(MixPolicy::Drop, &[1.0, 2.0, 3.0, 4.0], &mut out);
        assert_eq!(out, [1.0, 2.0]);
    }

    #[test]
    fn zero_pads_up_mix() {
        let mut out = [0.0f32; 4];
        mix_frame(MixPolicy::Zero, &[1.0, 2.0], &mut out);
        assert_eq!(out, [1.0, 2.0, 0.0, 0.0]);
    }

    #[test]
    fn blend_non_mono_shape_falls_back_to_drop() {
        let mut out = [0.0f32; 2];
        mix_frame(MixPolicy::Blend, &[1.0, 2.0, 3.0], &mut out);
        assert_eq!(out, [1.0, 2.0]);
    }

    // S6: input map [FL, FR], output map [FR, FL], frames [(1,2),(3,4)] -> [(2,1),(4,3)]
    #[test]
    fn s6_remap_swaps_channels() {
        let input_map = ChannelMap::new(vec![ChannelId::FrontLeft, ChannelId::FrontRight]).unwrap();
        let output_map = ChannelMap::new(vec![ChannelId::FrontRight, ChannelId::FrontLeft]).unwrap();
        let shuffle = build_shuffle_table(&output_map, &input_map).unwrap();

        let mut out = [0.0f32; 2];
        remap_frame(&shuffle, &[1.0, 2.0], &mut out);
        assert_eq!(out, [2.0, 1.0]);
        remap_frame(&shuffle, &[3.0, 4.0], &mut out);
        assert_eq!(out, [4.0, 3.0]);
    }
}
