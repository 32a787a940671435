//! Sample format conversion helpers for clip decoding.

use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::sample::Sample;

/// Convert a signed 24-bit sample stored in an `i32` to `f32`.
pub fn convert_signed_24bit_to_f32(sample: i32) -> f32 {
    // The 24-bit sample lives in the least significant bits.
    let shifted_sample = sample << 8 >> 8;
    shifted_sample as f32 / 2f32.powi(23)
}

/// Convert an unsigned 24-bit sample stored in a `u32` to `f32`.
pub fn convert_unsigned_24bit_to_f32(sample: u32) -> f32 {
    let shifted_sample = sample as i32 - 2i32.pow(23);
    shifted_sample as f32 / 2f32.powi(23)
}

/// Convert a signed 16-bit sample to `f32`.
pub fn convert_signed_16bit_to_f32(sample: i16) -> f32 {
    sample as f32 / 2f32.powi(15)
}

/// Convert an unsigned 16-bit sample to `f32`.
pub fn convert_unsigned_16bit_to_f32(sample: u16) -> f32 {
    let shifted_sample = sample as i32 - 2i32.pow(15);
    shifted_sample as f32 / 2f32.powi(15)
}

/// Convert a signed 8-bit sample to `f32`.
pub fn convert_signed_8bit_to_f32(sample: i8) -> f32 {
    sample as f32 / 2f32.powi(7)
}

/// Convert an unsigned 8-bit sample to `f32`.
pub fn convert_unsigned_8bit_to_f32(sample: u8) -> f32 {
    let shifted_sample = sample as i16 - 2i16.pow(7);
    shifted_sample as f32 / 2f32.powi(7)
}

/// Convert a signed 32-bit sample to `f32`.
pub fn convert_signed_32bit_to_f32(sample: i32) -> f32 {
    sample as f32 / 2f32.powi(31)
}

/// Convert an unsigned 32-bit sample to `f32`.
pub fn convert_unsigned_32bit_to_f32(sample: u32) -> f32 {
    let shifted_sample = sample as i64 - 2i64.pow(31);
    shifted_sample as f32 / 2f32.powi(31)
}

/// Append a decoded packet to `out` as interleaved `f32` frames.
///
/// Returns the number of channels in the packet.
pub fn append_interleaved(decoded: &AudioBufferRef<'_>, out: &mut Vec<f32>) -> usize {
    match decoded {
        AudioBufferRef::U8(buf) => interleave(&**buf, out, convert_unsigned_8bit_to_f32),
        AudioBufferRef::S8(buf) => interleave(&**buf, out, convert_signed_8bit_to_f32),
        AudioBufferRef::U16(buf) => interleave(&**buf, out, convert_unsigned_16bit_to_f32),
        AudioBufferRef::S16(buf) => interleave(&**buf, out, convert_signed_16bit_to_f32),
        AudioBufferRef::U24(buf) => {
            interleave(&**buf, out, |s| convert_unsigned_24bit_to_f32(s.0))
        }
        AudioBufferRef::S24(buf) => interleave(&**buf, out, |s| convert_signed_24bit_to_f32(s.0)),
        AudioBufferRef::U32(buf) => interleave(&**buf, out, convert_unsigned_32bit_to_f32),
        AudioBufferRef::S32(buf) => interleave(&**buf, out, convert_signed_32bit_to_f32),
        AudioBufferRef::F32(buf) => interleave(&**buf, out, |s| s),
        AudioBufferRef::F64(buf) => interleave(&**buf, out, |s| s as f32),
    }
}

fn interleave<S: Sample>(
    buf: &AudioBuffer<S>,
    out: &mut Vec<f32>,
    convert: impl Fn(S) -> f32,
) -> usize {
    let channels = buf.spec().channels.count();
    let frames = buf.frames();
    out.reserve(frames * channels);
    for frame in 0..frames {
        for channel in 0..channels {
            out.push(convert(buf.chan(channel)[frame]));
        }
    }
    channels
}
