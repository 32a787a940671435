//! Channel coercion and nearest-neighbour rate conversion.
//!
//! The resampler picks the nearest source frame for every output frame. It is
//! cheap and aliasing-prone at large ratios; callers rely on its exact output,
//! so it must not be swapped for a band-limited converter.

use crate::constants::CHANNELS;

/// Coerce interleaved audio with `channels` channels to interleaved stereo.
///
/// Mono is duplicated into both channels; anything wider keeps only the
/// first two channels.
pub fn coerce_stereo(samples: Vec<f32>, channels: usize) -> Vec<f32> {
    match channels {
        0 => Vec::new(),
        1 => samples.iter().flat_map(|&s| [s, s]).collect(),
        CHANNELS => samples,
        _ => samples
            .chunks_exact(channels)
            .flat_map(|frame| [frame[0], frame[1]])
            .collect(),
    }
}

/// Length in frames of a buffer of `frames` frames converted between rates.
pub fn resampled_len(frames: usize, source_rate: u32, target_rate: u32) -> usize {
    if source_rate == target_rate || source_rate == 0 {
        return frames;
    }
    (frames as f64 * target_rate as f64 / source_rate as f64).round() as usize
}

/// Convert interleaved audio from `source_rate` to `target_rate`.
///
/// Returns the input unchanged when the rates match. Otherwise output frame
/// `i` copies source frame `round(i * (len - 1) / max(new_len - 1, 1))`, so
/// the first and last frames of the result are the first and last frames of
/// the input.
pub fn resample(
    samples: Vec<f32>,
    channels: usize,
    source_rate: u32,
    target_rate: u32,
) -> Vec<f32> {
    if source_rate == target_rate || channels == 0 || source_rate == 0 {
        return samples;
    }

    let frames = samples.len() / channels;
    if frames == 0 {
        return Vec::new();
    }

    let new_frames = resampled_len(frames, source_rate, target_rate);
    let last = (frames - 1) as f64;
    let denominator = new_frames.saturating_sub(1).max(1) as f64;

    let mut out = Vec::with_capacity(new_frames * channels);
    for i in 0..new_frames {
        let source = ((i as f64 * last / denominator).round() as usize).min(frames - 1);
        let start = source * channels;
        out.extend_from_slice(&samples[start..start + channels]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(frames: usize) -> Vec<f32> {
        (0..frames).map(|i| i as f32 / frames as f32).collect()
    }

    #[test]
    fn equal_rates_are_identity() {
        let input = ramp(100);
        let output = resample(input.clone(), 1, 48_000, 48_000);
        assert_eq!(output, input);
    }

    #[test]
    fn upsample_length_and_endpoints() {
        let input = ramp(441);
        let output = resample(input.clone(), 1, 44_100, 48_000);
        assert_eq!(output.len(), 480);
        assert_eq!(output[0], input[0]);
        assert_eq!(output[output.len() - 1], input[input.len() - 1]);
    }

    #[test]
    fn downsample_length_and_endpoints() {
        let input = ramp(1000);
        let output = resample(input.clone(), 1, 48_000, 22_050);
        let expected = (1000.0_f64 * 22_050.0 / 48_000.0).round() as usize;
        assert_eq!(output.len(), expected);
        assert_eq!(output[0], input[0]);
        assert_eq!(output[output.len() - 1], input[999]);
    }

    #[test]
    fn picks_nearest_source_frame() {
        // 4 frames doubled to 8: index i maps to round(i * 3 / 7).
        let input = vec![0.0, 1.0, 2.0, 3.0];
        let output = resample(input, 1, 1, 2);
        assert_eq!(output, vec![0.0, 0.0, 1.0, 1.0, 2.0, 2.0, 3.0, 3.0]);
    }

    #[test]
    fn stereo_frames_stay_aligned() {
        let input = vec![0.1, -0.1, 0.2, -0.2, 0.3, -0.3];
        let output = resample(input, 2, 3, 6);
        assert_eq!(output.len(), 12);
        for frame in output.chunks_exact(2) {
            assert_eq!(frame[0], -frame[1]);
        }
        assert_eq!(&output[..2], &[0.1, -0.1]);
        assert_eq!(&output[10..], &[0.3, -0.3]);
    }

    #[test]
    fn empty_input_stays_empty() {
        assert!(resample(Vec::new(), 2, 44_100, 48_000).is_empty());
    }

    #[test]
    fn mono_is_duplicated() {
        assert_eq!(coerce_stereo(vec![0.5, -0.25], 1), vec![0.5, 0.5, -0.25, -0.25]);
    }

    #[test]
    fn wide_input_keeps_first_two_channels() {
        let input = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        assert_eq!(coerce_stereo(input, 3), vec![1.0, 2.0, 4.0, 5.0]);
    }

    #[test]
    fn stereo_passes_through() {
        let input = vec![0.1, 0.2, 0.3, 0.4];
        assert_eq!(coerce_stereo(input.clone(), 2), input);
    }
}
