//! The per-block mixing callback.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::error;

use crate::config::EngineConfig;
use crate::constants::CHANNELS;

use super::clip::ActiveClipSet;
use super::queue::PlaybackQueue;
use super::state::{EngineCounters, MicState};

/// Saturate a mixed sample to `[-1, 1]`. NaN becomes silence.
pub fn hard_clip(sample: f32) -> f32 {
    if sample.is_nan() {
        0.0
    } else {
        sample.clamp(-1.0, 1.0)
    }
}

/// Mixes mic input and active clips into stereo blocks.
///
/// Owned by whichever thread drives the output device. Only one engine
/// should drain a given queue at a time.
#[derive(Debug)]
pub struct MixEngine {
    block_size: usize,
    deadline: Duration,
    queue: Arc<PlaybackQueue>,
    mic: Arc<MicState>,
    counters: Arc<EngineCounters>,
    active: ActiveClipSet,
    sounds: Vec<f32>,
}

impl MixEngine {
    pub fn new(
        config: &EngineConfig,
        queue: Arc<PlaybackQueue>,
        mic: Arc<MicState>,
        counters: Arc<EngineCounters>,
    ) -> Self {
        Self {
            block_size: config.block_size,
            deadline: config.block_duration(),
            queue,
            mic,
            counters,
            active: ActiveClipSet::default(),
            sounds: vec![0.0; config.block_samples()],
        }
    }

    /// Frames per block.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Interleaved stereo samples per block.
    pub fn block_samples(&self) -> usize {
        self.block_size * CHANNELS
    }

    pub fn active(&self) -> &ActiveClipSet {
        &self.active
    }

    /// Clipped sounds-only mix of the last block, without the mic.
    pub fn sounds(&self) -> &[f32] {
        &self.sounds
    }

    /// Produce one block into `out` from the mono `mic` block.
    ///
    /// `out` holds `block_size` interleaved stereo frames. A `mic` slice
    /// shorter than the block is padded with silence. A panic anywhere in
    /// the block is caught and the block is replaced with silence.
    pub fn process_block(&mut self, mic: &[f32], out: &mut [f32]) {
        let started = Instant::now();
        match panic::catch_unwind(AssertUnwindSafe(|| self.mix(mic, out))) {
            Ok(peak) => {
                let late = started.elapsed() > self.deadline;
                self.counters.record_block(self.active.len(), peak, late);
            }
            Err(payload) => {
                out.fill(0.0);
                self.sounds.fill(0.0);
                self.counters.record_dropped();
                error!("mix block dropped: {}", panic_message(payload.as_ref()));
            }
        }
    }

    fn mix(&mut self, mic: &[f32], out: &mut [f32]) -> f32 {
        let out = &mut out[..self.block_size * CHANNELS];

        if self.mic.muted() {
            out.fill(0.0);
        } else {
            let gain = self.mic.volume();
            for (index, frame) in out.chunks_exact_mut(CHANNELS).enumerate() {
                let sample = mic.get(index).copied().unwrap_or(0.0) * gain;
                frame[0] = sample;
                frame[1] = sample;
            }
        }

        self.queue.drain_into(&mut self.active);

        self.sounds.fill(0.0);
        self.active.mix_block(&mut self.sounds, self.block_size);

        let mut peak = 0.0_f32;
        for (sample, sound) in out.iter_mut().zip(self.sounds.iter_mut()) {
            *sample = hard_clip(*sample + *sound);
            *sound = hard_clip(*sound);
            peak = peak.max(sample.abs());
        }
        peak
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}
