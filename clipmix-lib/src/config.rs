//! Engine configuration.
//!
//! [`EngineConfig`] is fixed for the lifetime of a running stream. Every field
//! is optional when deserializing, so a partial JSON file only overrides what
//! it names.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    BLOCK_SIZE, CHANNELS, MAX_BLOCK_SIZE, MAX_MIC_QUEUE_BLOCKS, MAX_SAMPLE_RATE,
    MIC_QUEUE_BLOCKS, MONITOR_QUEUE_BLOCKS, SAMPLE_RATE,
};
use crate::error::ConfigError;

/// Stream and clip-loading settings for an [`AudioMixer`](crate::mixer::AudioMixer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Sample rate of both device streams and every loaded clip (Hz).
    pub sample_rate: u32,
    /// Frames mixed per block.
    pub block_size: usize,
    /// Capacity of the mic capture bridge, in blocks.
    pub mic_queue_blocks: usize,
    /// Linear fade applied to the tail of each loaded clip. 0 disables it.
    pub fade_out_ms: u32,
    /// Open the local monitor output when the stream starts.
    pub monitor: bool,
    /// Keep decoded clips in memory keyed by path.
    pub cache_clips: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            block_size: BLOCK_SIZE,
            mic_queue_blocks: MIC_QUEUE_BLOCKS,
            fade_out_ms: 0,
            monitor: false,
            cache_clips: true,
        }
    }
}

impl EngineConfig {
    /// Load a config from a JSON file and validate it.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Parse a config from a JSON string and validate it.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot run with.
    ///
    /// Every buffer the engine allocates is sized from these fields, so a
    /// config that passes here can always be started.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_SAMPLE_RATE).contains(&self.sample_rate) {
            return Err(ConfigError::Invalid(format!(
                "sample_rate must be between 1 and {}",
                MAX_SAMPLE_RATE
            )));
        }
        if !(1..=MAX_BLOCK_SIZE).contains(&self.block_size) {
            return Err(ConfigError::Invalid(format!(
                "block_size must be between 1 and {}",
                MAX_BLOCK_SIZE
            )));
        }
        if !(1..=MAX_MIC_QUEUE_BLOCKS).contains(&self.mic_queue_blocks) {
            return Err(ConfigError::Invalid(format!(
                "mic_queue_blocks must be between 1 and {}",
                MAX_MIC_QUEUE_BLOCKS
            )));
        }
        self.queue_samples(self.mic_queue_blocks.max(MONITOR_QUEUE_BLOCKS))
            .ok_or_else(|| ConfigError::Invalid("buffer sizes overflow".to_string()))?;
        Ok(())
    }

    /// Interleaved stereo samples in `blocks` blocks, or `None` on overflow.
    pub fn queue_samples(&self, blocks: usize) -> Option<usize> {
        self.block_size.checked_mul(CHANNELS)?.checked_mul(blocks)
    }

    /// Output channel count. Always stereo.
    pub fn channels(&self) -> usize {
        CHANNELS
    }

    /// Interleaved samples in one output block.
    pub fn block_samples(&self) -> usize {
        self.block_size * CHANNELS
    }

    /// Real-time deadline for one block.
    pub fn block_duration(&self) -> Duration {
        Duration::from_secs_f64(self.block_size as f64 / self.sample_rate as f64)
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn with_fade_out_ms(mut self, fade_out_ms: u32) -> Self {
        self.fade_out_ms = fade_out_ms;
        self
    }

    pub fn with_monitor(mut self, monitor: bool) -> Self {
        self.monitor = monitor;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_constants() {
        let config = EngineConfig::default();
        assert_eq!(config.sample_rate, 48_000);
        assert_eq!(config.block_size, 1024);
        assert_eq!(config.channels(), 2);
        assert_eq!(config.block_samples(), 2048);
        assert!(config.cache_clips);
        assert!(!config.monitor);
    }

    #[test]
    fn block_duration_is_block_over_rate() {
        let config = EngineConfig::default();
        let ms = config.block_duration().as_secs_f64() * 1000.0;
        assert!((ms - 21.333).abs() < 0.01);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = EngineConfig::from_json_str(r#"{"block_size":256}"#).expect("parse config");
        assert_eq!(config.block_size, 256);
        assert_eq!(config.sample_rate, 48_000);
        assert_eq!(config.fade_out_ms, 0);
    }

    #[test]
    fn zero_block_size_is_rejected() {
        let err = EngineConfig::from_json_str(r#"{"block_size":0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn oversized_values_are_rejected() {
        for json in [
            r#"{"block_size":9223372036854775807}"#,
            r#"{"block_size":16385}"#,
            r#"{"sample_rate":4000000000}"#,
            r#"{"mic_queue_blocks":18446744073709551615}"#,
        ] {
            let err = EngineConfig::from_json_str(json).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{json}");
        }
    }

    #[test]
    fn largest_accepted_config_sizes_fit() {
        let config = EngineConfig {
            sample_rate: MAX_SAMPLE_RATE,
            block_size: MAX_BLOCK_SIZE,
            mic_queue_blocks: MAX_MIC_QUEUE_BLOCKS,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.queue_samples(2), Some(MAX_BLOCK_SIZE * 4));
        assert_eq!(config.with_block_size(usize::MAX).queue_samples(2), None);
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = EngineConfig::from_json_str("{sample_rate:").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn reads_config_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("engine.json");
        std::fs::write(&path, r#"{"sample_rate":44100,"monitor":true}"#).expect("write");
        let config = EngineConfig::from_json_file(&path).expect("load");
        assert_eq!(config.sample_rate, 44_100);
        assert!(config.monitor);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = EngineConfig::from_json_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
