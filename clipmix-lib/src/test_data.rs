//! WAV fixtures written on demand for unit tests.

use std::path::Path;

/// Write 16-bit PCM `samples` (interleaved) to a WAV file at `path`.
pub(crate) fn write_wav(path: &Path, channels: u16, sample_rate: u32, samples: &[i16]) {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).expect("create wav");
    for &sample in samples {
        writer.write_sample(sample).expect("write sample");
    }
    writer.finalize().expect("finalize wav");
}

/// Interleaved stereo buffer holding `frames` frames of a constant value.
pub(crate) fn constant_stereo(frames: usize, value: f32) -> Vec<f32> {
    vec![value; frames * 2]
}
