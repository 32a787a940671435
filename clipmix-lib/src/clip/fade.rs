//! End-of-clip fade applied at load time.

/// Apply a linear fade-out over the last `fade_ms` of interleaved audio.
///
/// The ramp runs from 1.0 on the first faded frame to 0.0 on the last frame.
/// Clips shorter than the fade are left untouched.
pub fn apply_fade_out(samples: &mut [f32], channels: usize, sample_rate: u32, fade_ms: u32) {
    if channels == 0 {
        return;
    }
    let fade_frames = (sample_rate as u64 * fade_ms as u64 / 1000) as usize;
    let frames = samples.len() / channels;
    if fade_frames == 0 || frames < fade_frames {
        return;
    }

    let start = (frames - fade_frames) * channels;
    let steps = fade_frames.saturating_sub(1).max(1) as f32;
    for (index, frame) in samples[start..].chunks_exact_mut(channels).enumerate() {
        let gain = if fade_frames == 1 {
            1.0
        } else {
            1.0 - index as f32 / steps
        };
        for sample in frame {
            *sample *= gain;
        }
    }
}
