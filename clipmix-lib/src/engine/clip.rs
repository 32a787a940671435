//! Playing clips and the set the mixing callback advances.

use std::sync::Arc;

use crate::constants::{ACTIVE_CLIP_CAPACITY, CHANNELS};

/// A clip waiting in the [`PlaybackQueue`](super::PlaybackQueue).
#[derive(Debug, Clone)]
pub struct PendingClip {
    pub samples: Arc<[f32]>,
    pub channels: usize,
    pub volume: f32,
}

impl PendingClip {
    pub fn new(samples: Arc<[f32]>, channels: usize, volume: f32) -> Self {
        Self {
            samples,
            channels: channels.max(1),
            volume,
        }
    }
}

/// A clip being played: shared samples plus a frame cursor.
#[derive(Debug, Clone)]
pub struct Clip {
    samples: Arc<[f32]>,
    channels: usize,
    position: usize,
    volume: f32,
}

impl From<PendingClip> for Clip {
    fn from(pending: PendingClip) -> Self {
        Self {
            samples: pending.samples,
            channels: pending.channels.max(1),
            position: 0,
            volume: pending.volume,
        }
    }
}

impl Clip {
    /// Length in frames.
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels
    }

    /// Frames consumed so far. Never exceeds [`Clip::frames`].
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn remaining(&self) -> usize {
        self.frames().saturating_sub(self.position)
    }

    pub fn is_finished(&self) -> bool {
        self.remaining() == 0
    }

    /// Add the next chunk of at most `block_size` frames into the stereo
    /// buffer `out` and advance the cursor by the chunk size.
    ///
    /// Mono clips are written to both channels, wider clips contribute their
    /// first two channels. Frames past the end of the clip are left as they
    /// are, which is the zero padding of a short final chunk.
    pub fn mix_into(&mut self, out: &mut [f32], block_size: usize) -> usize {
        let chunk = block_size.min(self.remaining());
        if chunk == 0 {
            return 0;
        }

        let start = self.position * self.channels;
        let source = &self.samples[start..start + chunk * self.channels];
        let frames = out[..chunk * CHANNELS].chunks_exact_mut(CHANNELS);
        for (dest, frame) in frames.zip(source.chunks_exact(self.channels)) {
            let left = frame[0] * self.volume;
            let right = if self.channels > 1 {
                frame[1] * self.volume
            } else {
                left
            };
            dest[0] += left;
            dest[1] += right;
        }

        self.position += chunk;
        chunk
    }
}

/// Clips currently advancing. Owned by the mixing callback.
///
/// Sample buffers of clips that end are parked in `retired` rather than
/// dropped, so the callback never frees a buffer. The playback queue hands
/// them to a controller thread.
#[derive(Debug)]
pub struct ActiveClipSet {
    clips: Vec<Clip>,
    pub(super) incoming: Vec<PendingClip>,
    pub(super) retired: Vec<Arc<[f32]>>,
}

impl Default for ActiveClipSet {
    fn default() -> Self {
        Self::with_capacity(ACTIVE_CLIP_CAPACITY)
    }
}

impl ActiveClipSet {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            clips: Vec::with_capacity(capacity),
            incoming: Vec::with_capacity(capacity),
            retired: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Clip> {
        self.clips.iter()
    }

    pub fn clear(&mut self) {
        let retired = &mut self.retired;
        retired.extend(self.clips.drain(..).map(|clip| clip.samples));
    }

    /// Move clips swapped out of the queue into the playing set.
    pub(super) fn admit_incoming(&mut self) -> usize {
        let count = self.incoming.len();
        self.clips.extend(self.incoming.drain(..).map(Clip::from));
        count
    }

    /// Mix one block of every clip into `out`, then retire the clips that
    /// ran out. `retain` keeps the relative order of survivors, so removal
    /// cannot skip a clip.
    pub fn mix_block(&mut self, out: &mut [f32], block_size: usize) {
        for clip in self.clips.iter_mut() {
            clip.mix_into(out, block_size);
        }
        let retired = &mut self.retired;
        self.clips.retain(|clip| {
            if clip.is_finished() {
                retired.push(Arc::clone(&clip.samples));
                false
            } else {
                true
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip(samples: Vec<f32>, channels: usize, volume: f32) -> Clip {
        Clip::from(PendingClip::new(samples.into(), channels, volume))
    }

    #[test]
    fn mono_is_duplicated_and_scaled() {
        let mut clip = clip(vec![0.5, -0.5], 1, 0.5);
        let mut out = vec![0.0; 8];
        assert_eq!(clip.mix_into(&mut out, 4), 2);
        assert_eq!(out, vec![0.25, 0.25, -0.25, -0.25, 0.0, 0.0, 0.0, 0.0]);
        assert!(clip.is_finished());
    }

    #[test]
    fn wide_clip_keeps_first_two_channels() {
        let mut clip = clip(vec![0.1, 0.2, 0.9, 0.3, 0.4, 0.9], 3, 1.0);
        let mut out = vec![0.0; 4];
        clip.mix_into(&mut out, 2);
        assert_eq!(out, vec![0.1, 0.2, 0.3, 0.4]);
    }

    #[test]
    fn position_advances_by_chunk_and_stops_at_length() {
        let mut clip = clip(vec![0.1; 2 * 10], 2, 1.0);
        let mut out = vec![0.0; 2 * 4];
        let chunks: Vec<usize> = (0..4)
            .map(|_| {
                out.fill(0.0);
                clip.mix_into(&mut out, 4)
            })
            .collect();
        assert_eq!(chunks, vec![4, 4, 2, 0]);
        assert_eq!(clip.position(), 10);
        assert_eq!(clip.position(), clip.frames());
    }

    #[test]
    fn finished_clips_leave_in_the_same_block() {
        let mut set = ActiveClipSet::with_capacity(4);
        set.incoming.push(PendingClip::new(vec![0.1; 2 * 3].into(), 2, 1.0));
        set.incoming.push(PendingClip::new(vec![0.1; 2 * 8].into(), 2, 1.0));
        set.incoming.push(PendingClip::new(vec![0.1; 2 * 2].into(), 2, 1.0));
        assert_eq!(set.admit_incoming(), 3);

        let mut out = vec![0.0; 2 * 4];
        set.mix_block(&mut out, 4);
        assert_eq!(set.len(), 1);
        assert!(set.iter().all(|clip| !clip.is_finished()));
        assert_eq!(set.iter().next().map(Clip::position), Some(4));
    }

    #[test]
    fn ended_and_cleared_clips_keep_their_buffers_alive() {
        let mut set = ActiveClipSet::with_capacity(4);
        let short: Arc<[f32]> = vec![0.1; 2 * 2].into();
        let long: Arc<[f32]> = vec![0.1; 2 * 16].into();
        let (short_ref, long_ref) = (Arc::downgrade(&short), Arc::downgrade(&long));
        set.incoming.push(PendingClip::new(short, 2, 1.0));
        set.incoming.push(PendingClip::new(long, 2, 1.0));
        set.admit_incoming();

        let mut out = vec![0.0; 2 * 4];
        set.mix_block(&mut out, 4);
        assert_eq!(set.len(), 1);
        assert_eq!(set.retired.len(), 1);
        assert!(short_ref.upgrade().is_some());

        set.clear();
        assert!(set.is_empty());
        assert_eq!(set.retired.len(), 2);
        assert!(long_ref.upgrade().is_some());

        set.retired.clear();
        assert!(short_ref.upgrade().is_none());
        assert!(long_ref.upgrade().is_none());
    }

    #[test]
    fn empty_clip_is_removed_without_contributing() {
        let mut set = ActiveClipSet::with_capacity(1);
        set.incoming.push(PendingClip::new(Vec::<f32>::new().into(), 2, 1.0));
        set.admit_incoming();
        let mut out = vec![0.0; 4];
        set.mix_block(&mut out, 2);
        assert!(set.is_empty());
        assert!(out.iter().all(|&s| s == 0.0));
    }
}
