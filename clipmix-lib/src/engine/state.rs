//! Lock-free state shared between controller threads and the mixing callback.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};

use serde::Serialize;

/// Microphone gain and mute flag. Last write wins.
#[derive(Debug)]
pub struct MicState {
    volume: AtomicU32,
    muted: AtomicBool,
}

impl Default for MicState {
    fn default() -> Self {
        Self::new(1.0, false)
    }
}

impl MicState {
    pub fn new(volume: f32, muted: bool) -> Self {
        Self {
            volume: AtomicU32::new(volume.to_bits()),
            muted: AtomicBool::new(muted),
        }
    }

    /// Gain applied to captured mic samples. Not clamped.
    pub fn volume(&self) -> f32 {
        f32::from_bits(self.volume.load(Ordering::Relaxed))
    }

    pub fn set_volume(&self, volume: f32) {
        self.volume.store(volume.to_bits(), Ordering::Relaxed);
    }

    pub fn muted(&self) -> bool {
        self.muted.load(Ordering::Relaxed)
    }

    pub fn set_muted(&self, muted: bool) {
        self.muted.store(muted, Ordering::Relaxed);
    }
}

/// Counters updated by the audio callbacks.
#[derive(Debug, Default)]
pub struct EngineCounters {
    blocks_mixed: AtomicU64,
    dropped_blocks: AtomicU64,
    late_blocks: AtomicU64,
    mic_underruns: AtomicU64,
    active_clips: AtomicUsize,
    last_peak: AtomicU32,
}

impl EngineCounters {
    pub(crate) fn record_block(&self, active_clips: usize, peak: f32, late: bool) {
        self.blocks_mixed.fetch_add(1, Ordering::Relaxed);
        self.active_clips.store(active_clips, Ordering::Relaxed);
        self.last_peak.store(peak.to_bits(), Ordering::Relaxed);
        if late {
            self.late_blocks.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_dropped(&self) {
        self.dropped_blocks.fetch_add(1, Ordering::Relaxed);
        self.last_peak.store(0.0_f32.to_bits(), Ordering::Relaxed);
    }

    /// Forget the clip count of the last block once those clips can no
    /// longer play.
    pub(crate) fn clear_active(&self) {
        self.active_clips.store(0, Ordering::Relaxed);
    }

    pub(crate) fn record_mic_underrun(&self) {
        self.mic_underruns.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot the counters. `pending_clips` comes from the playback queue.
    pub fn snapshot(&self, pending_clips: usize) -> EngineStats {
        EngineStats {
            blocks_mixed: self.blocks_mixed.load(Ordering::Relaxed),
            dropped_blocks: self.dropped_blocks.load(Ordering::Relaxed),
            late_blocks: self.late_blocks.load(Ordering::Relaxed),
            mic_underruns: self.mic_underruns.load(Ordering::Relaxed),
            active_clips: self.active_clips.load(Ordering::Relaxed),
            pending_clips,
            last_peak: f32::from_bits(self.last_peak.load(Ordering::Relaxed)),
        }
    }
}

/// Point-in-time view of engine activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EngineStats {
    /// Blocks mixed successfully.
    pub blocks_mixed: u64,
    /// Blocks replaced by silence after a fault in the mixing callback.
    pub dropped_blocks: u64,
    /// Blocks whose mixing took longer than the block duration.
    pub late_blocks: u64,
    /// Blocks that reused the previous mic block because capture fell behind.
    pub mic_underruns: u64,
    /// Clips still playing after the last block.
    pub active_clips: usize,
    /// Clips waiting for the next block.
    pub pending_clips: usize,
    /// Largest absolute output sample of the last block.
    pub last_peak: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mic_state_round_trips_volume_bits() {
        let mic = MicState::default();
        assert_eq!(mic.volume(), 1.0);
        mic.set_volume(1.35);
        assert_eq!(mic.volume(), 1.35);
        mic.set_muted(true);
        assert!(mic.muted());
    }

    #[test]
    fn snapshot_reflects_recorded_blocks() {
        let counters = EngineCounters::default();
        counters.record_block(2, 0.5, false);
        counters.record_block(1, 0.75, true);
        counters.record_dropped();
        counters.record_mic_underrun();

        let stats = counters.snapshot(3);
        assert_eq!(stats.blocks_mixed, 2);
        assert_eq!(stats.late_blocks, 1);
        assert_eq!(stats.dropped_blocks, 1);
        assert_eq!(stats.mic_underruns, 1);
        assert_eq!(stats.active_clips, 1);
        assert_eq!(stats.pending_clips, 3);
        assert_eq!(stats.last_peak, 0.0);
    }
}
