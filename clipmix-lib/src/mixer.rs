//! The engine's control surface.

use std::path::Path;
use std::sync::Arc;

use log::{debug, info};

use crate::audio::{DeviceStream, MicBridge, MonitorTap, StreamParts};
use crate::clip::{ClipCache, ClipData, ClipLoader};
use crate::config::EngineConfig;
use crate::constants::MONITOR_QUEUE_BLOCKS;
use crate::engine::{EngineCounters, EngineStats, MicState, MixEngine, PendingClip, PlaybackQueue};
use crate::error::{ConfigError, DecodeError, DeviceError};

/// Volume used when a trigger does not name one.
pub const DEFAULT_CLIP_VOLUME: f32 = 1.0;

/// Mixes a live mic with triggered clips into one stereo output.
///
/// `AudioMixer` is `Send + Sync`: wrap it in an `Arc` and trigger clips from
/// any thread. Loading happens on the calling thread; the audio thread only
/// ever sees decoded buffers.
#[derive(Debug)]
pub struct AudioMixer {
    config: EngineConfig,
    cache: ClipCache,
    queue: Arc<PlaybackQueue>,
    mic: Arc<MicState>,
    counters: Arc<EngineCounters>,
    monitor: MonitorTap,
    stream: DeviceStream,
}

impl AudioMixer {
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        debug!("engine config: {:?}", config);
        let monitor_capacity = config
            .queue_samples(MONITOR_QUEUE_BLOCKS)
            .ok_or_else(|| ConfigError::Invalid("monitor buffer size overflows".to_string()))?;
        let monitor = MonitorTap::new(config.sample_rate, monitor_capacity, config.monitor);
        Ok(Self {
            cache: ClipCache::new(ClipLoader::from_config(&config)),
            queue: Arc::new(PlaybackQueue::new()),
            mic: Arc::new(MicState::default()),
            counters: Arc::new(EngineCounters::default()),
            monitor,
            stream: DeviceStream::new(config.clone()),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Open the named devices (`None` for host defaults) and start mixing.
    ///
    /// No-op while running. On error the mixer stays stopped and the call can
    /// be retried with other devices.
    pub fn start(&self, input: Option<&str>, output: Option<&str>) -> Result<(), DeviceError> {
        self.stream.start(input, output, self.stream_parts())
    }

    /// Stop mixing and release the devices. No-op while stopped.
    ///
    /// Clips that were playing are dropped with the stream. Clips still
    /// pending play after the next `start`.
    pub fn stop(&self) {
        self.stream.stop();
        self.counters.clear_active();
        self.queue.release_finished();
    }

    pub fn is_running(&self) -> bool {
        self.stream.is_running()
    }

    /// A mixing engine bound to this mixer's queue, mic state and counters.
    ///
    /// `start` uses one of these for the output device. Driving one by hand
    /// renders blocks without hardware; do not do both at once, since each
    /// queued clip goes to whichever engine drains it first.
    pub fn mix_engine(&self) -> MixEngine {
        MixEngine::new(
            &self.config,
            Arc::clone(&self.queue),
            Arc::clone(&self.mic),
            Arc::clone(&self.counters),
        )
    }

    /// Load `path` and queue it for the next block.
    ///
    /// Returns the clip duration in seconds. A failed load leaves the stream
    /// and every playing clip untouched.
    pub fn play_sound(&self, path: impl AsRef<Path>, volume: f32) -> Result<f64, DecodeError> {
        let path = path.as_ref();
        let clip = self.load(path)?;
        let duration = clip.duration_secs();
        self.enqueue(clip, volume);
        debug!(
            "queued {} ({:.2}s) at volume {}",
            path.display(),
            duration,
            volume
        );
        Ok(duration)
    }

    /// Queue interleaved samples already at the engine rate.
    pub fn play_samples(&self, samples: impl Into<Arc<[f32]>>, channels: usize, volume: f32) {
        self.queue.enqueue(PendingClip::new(samples.into(), channels, volume));
    }

    /// Drop every queued and playing clip. No clip is heard in any block that
    /// starts after this returns.
    pub fn stop_all_sounds(&self) {
        self.queue.clear();
        self.counters.clear_active();
        info!("stopped all sounds");
    }

    pub fn mic_volume(&self) -> f32 {
        self.mic.volume()
    }

    /// Set the mic gain. Not clamped; the usual range is 0.0 to 1.5.
    pub fn set_mic_volume(&self, volume: f32) {
        self.mic.set_volume(volume);
    }

    pub fn mic_muted(&self) -> bool {
        self.mic.muted()
    }

    pub fn set_mic_muted(&self, muted: bool) {
        self.mic.set_muted(muted);
    }

    pub fn monitor_enabled(&self) -> bool {
        self.monitor.is_enabled()
    }

    /// Toggle playing clips on the local monitor device.
    ///
    /// While running, the device is opened or closed on the stream thread.
    /// If it cannot be opened the flag falls back to off. While stopped, the
    /// flag decides whether the next `start` opens it.
    pub fn set_monitor_enabled(&self, enabled: bool) {
        self.monitor.set_enabled(enabled);
        self.stream.set_monitor(enabled);
    }

    pub fn stats(&self) -> EngineStats {
        self.counters.snapshot(self.queue.len())
    }

    /// Clips playing or waiting for the next block.
    pub fn playing_count(&self) -> usize {
        let stats = self.stats();
        stats.active_clips + stats.pending_clips
    }

    /// Decode `paths` into the clip cache ahead of their first trigger.
    pub fn preload<P: AsRef<Path>>(&self, paths: &[P]) -> usize {
        self.cache.preload(paths)
    }

    pub fn cache(&self) -> &ClipCache {
        &self.cache
    }

    fn stream_parts(&self) -> StreamParts {
        StreamParts {
            engine: self.mix_engine(),
            mic: MicBridge::with_blocks(self.config.block_size, self.config.mic_queue_blocks),
            monitor: self.monitor.clone(),
            counters: Arc::clone(&self.counters),
        }
    }

    fn load(&self, path: &Path) -> Result<ClipData, DecodeError> {
        if self.config.cache_clips {
            self.cache.get_or_load(path)
        } else {
            self.cache.loader().load(path)
        }
    }

    fn enqueue(&self, clip: ClipData, volume: f32) {
        let channels = clip.channels();
        self.queue.enqueue(PendingClip::new(clip.samples, channels, volume));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::stream::OutputStage;
    use crate::test_data::write_wav;

    fn assert_send_sync<T: Send + Sync>() {}

    fn silent(block: &[f32]) -> bool {
        block.iter().all(|&s| s == 0.0)
    }

    fn mixer() -> AudioMixer {
        AudioMixer::new(EngineConfig::default()).expect("default config")
    }

    #[test]
    fn mixer_is_shareable_across_threads() {
        assert_send_sync::<AudioMixer>();
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = EngineConfig::default().with_block_size(0);
        assert!(AudioMixer::new(config).is_err());
    }

    #[test]
    fn beep_plays_for_exactly_two_blocks() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("beep.wav");
        write_wav(&path, 1, 48_000, &vec![16384; 2048]);

        let mixer = mixer();
        mixer.set_mic_muted(true);
        let duration = mixer.play_sound(&path, 0.5).expect("play beep");
        assert!((duration - 2048.0 / 48_000.0).abs() < 1e-9);
        assert_eq!(mixer.playing_count(), 1);

        let mut engine = mixer.mix_engine();
        let mic = vec![0.0; engine.block_size()];
        let mut blocks = Vec::new();
        for _ in 0..4 {
            let mut out = vec![0.0; engine.block_samples()];
            engine.process_block(&mic, &mut out);
            blocks.push(out);
        }

        assert!(blocks[0].iter().all(|&s| s == 0.25));
        assert!(blocks[1].iter().all(|&s| s == 0.25));
        assert!(silent(&blocks[2]));
        assert!(silent(&blocks[3]));
        assert_eq!(mixer.stats().blocks_mixed, 4);
        assert_eq!(mixer.playing_count(), 0);
    }

    #[test]
    fn decode_error_leaves_playing_clips_alone() {
        let dir = tempfile::tempdir().expect("tempdir");
        let bad = dir.path().join("bad.wav");
        std::fs::write(&bad, b"not audio at all").expect("write");

        let mixer = mixer();
        mixer.play_samples(vec![0.1; 2 * 4096], 2, 1.0);
        assert!(mixer.play_sound(&bad, 1.0).is_err());
        assert_eq!(mixer.playing_count(), 1);
    }

    #[test]
    fn stop_all_silences_the_next_block() {
        let mixer = mixer();
        mixer.set_mic_muted(false);
        mixer.set_mic_volume(0.5);
        let mut engine = mixer.mix_engine();
        let block = engine.block_size();
        let mic = vec![0.5; block];

        mixer.play_samples(vec![0.3; 2 * block * 4], 2, 1.0);
        let mut out = vec![0.0; engine.block_samples()];
        engine.process_block(&mic, &mut out);
        assert!(out.iter().all(|&s| (s - 0.55).abs() < 1e-6));

        mixer.play_samples(vec![0.3; 2 * block], 2, 1.0);
        mixer.stop_all_sounds();
        engine.process_block(&mic, &mut out);
        assert!(out.iter().all(|&s| s == 0.25));
        assert_eq!(mixer.playing_count(), 0);
    }

    #[test]
    fn clips_are_cached_by_default() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("click.wav");
        write_wav(&path, 2, 44_100, &[1000; 2 * 441]);

        let mixer = mixer();
        assert_eq!(mixer.preload(&[path.clone()]), 1);
        assert!(mixer.cache().contains(&path));
        assert_eq!(mixer.cache().duration(&path), Some(0.01));
    }

    #[test]
    fn cache_can_be_disabled() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("click.wav");
        write_wav(&path, 1, 48_000, &[1000; 480]);

        let config = EngineConfig {
            cache_clips: false,
            ..EngineConfig::default()
        };
        let mixer = AudioMixer::new(config).expect("config");
        mixer.play_sound(&path, 1.0).expect("play");
        assert!(mixer.cache().is_empty());
    }

    #[test]
    fn mic_and_monitor_controls_round_trip() {
        let mixer = mixer();
        mixer.set_mic_volume(1.5);
        mixer.set_mic_muted(true);
        mixer.set_monitor_enabled(true);
        assert_eq!(mixer.mic_volume(), 1.5);
        assert!(mixer.mic_muted());
        assert!(mixer.monitor_enabled());
    }

    #[test]
    fn oversized_block_is_a_config_error() {
        let config = EngineConfig::default().with_block_size(usize::MAX / 2);
        assert!(matches!(
            AudioMixer::new(config),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn monitor_can_be_enabled_after_construction() {
        let mixer = mixer();
        assert!(!mixer.monitor_enabled());
        let mut stage = OutputStage::new(mixer.stream_parts(), 2);
        let block = mixer.config().block_size;

        mixer.set_monitor_enabled(true);
        mixer.play_samples(vec![0.2; 2 * block], 2, 1.0);
        let mut data = vec![0.0; 2 * block];
        stage.fill(&mut data);

        let monitored: Vec<f32> = mixer.monitor.source().take(2 * block).collect();
        assert!(monitored.iter().all(|&s| (s - 0.2).abs() < 1e-6));
    }

    #[test]
    fn playing_count_drops_after_stop_all_and_stop() {
        let mixer = mixer();
        let mut engine = mixer.mix_engine();
        let mic = vec![0.0; engine.block_size()];
        let mut out = vec![0.0; engine.block_samples()];

        mixer.play_samples(vec![0.1; 2 * 8192], 2, 1.0);
        engine.process_block(&mic, &mut out);
        assert_eq!(mixer.playing_count(), 1);
        mixer.stop_all_sounds();
        assert_eq!(mixer.playing_count(), 0);

        mixer.play_samples(vec![0.1; 2 * 8192], 2, 1.0);
        engine.process_block(&mic, &mut out);
        assert_eq!(mixer.playing_count(), 1);
        mixer.stop();
        assert_eq!(mixer.playing_count(), 0);
    }

    #[test]
    fn failed_start_leaves_mixer_stopped() {
        let mixer = mixer();
        let result = mixer.start(Some("no such input 7f3a"), Some("no such output 7f3a"));
        assert!(result.is_err());
        assert!(!mixer.is_running());
        mixer.stop();
        assert!(!mixer.is_running());
    }
}
