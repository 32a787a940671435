//! Turn files into stereo clips at the engine rate.

use std::path::Path;
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::constants::CHANNELS;
use crate::error::DecodeError;

use super::decode::{decode, DecodedAudio};
use super::fade::apply_fade_out;
use super::resample::{coerce_stereo, resample};

/// A decoded clip ready to enqueue: interleaved stereo at the engine rate.
///
/// The sample buffer is shared, so cached clips can be played many times
/// without copying.
#[derive(Debug, Clone)]
pub struct ClipData {
    pub samples: Arc<[f32]>,
    pub sample_rate: u32,
    pub source_rate: u32,
    pub source_channels: usize,
}

impl ClipData {
    /// Always stereo after loading.
    pub fn channels(&self) -> usize {
        CHANNELS
    }

    pub fn frames(&self) -> usize {
        self.samples.len() / CHANNELS
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Largest absolute sample value.
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0_f32, |peak, s| peak.max(s.abs()))
    }
}

/// Decodes, coerces and resamples files for one engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipLoader {
    sample_rate: u32,
    fade_out_ms: u32,
}

impl ClipLoader {
    pub fn new(sample_rate: u32, fade_out_ms: u32) -> Self {
        Self {
            sample_rate,
            fade_out_ms,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.sample_rate, config.fade_out_ms)
    }

    /// Target sample rate of every clip this loader produces.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Decode `path` and convert it to a stereo clip at the engine rate.
    ///
    /// Runs on the calling thread. Never call this from the audio callback.
    pub fn load(&self, path: &Path) -> Result<ClipData, DecodeError> {
        let decoded = decode(path)?;
        Ok(self.prepare(decoded))
    }

    /// Convert already decoded audio into a clip.
    pub fn prepare(&self, decoded: DecodedAudio) -> ClipData {
        let DecodedAudio {
            samples,
            channels,
            sample_rate: source_rate,
        } = decoded;

        let stereo = coerce_stereo(samples, channels);
        let mut samples = resample(stereo, CHANNELS, source_rate, self.sample_rate);
        if self.fade_out_ms > 0 {
            apply_fade_out(&mut samples, CHANNELS, self.sample_rate, self.fade_out_ms);
        }

        ClipData {
            samples: samples.into(),
            sample_rate: self.sample_rate,
            source_rate,
            source_channels: channels,
        }
    }
}
