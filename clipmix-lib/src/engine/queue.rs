//! Handoff of triggered clips from controller threads to the audio thread.

use std::sync::{Arc, Mutex};

use crate::constants::{ACTIVE_CLIP_CAPACITY, PENDING_CLIP_CAPACITY};
use crate::sync::lock;

use super::clip::{ActiveClipSet, PendingClip};

#[derive(Debug)]
struct QueueState {
    pending: Vec<PendingClip>,
    clear_requested: bool,
    /// Buffers of clips the mixing callback finished with.
    retired: Vec<Arc<[f32]>>,
}

/// Mutex-guarded list of clips waiting for the next block.
///
/// Every critical section is a push, a vector swap or a clear. Nothing that
/// decodes or mixes ever runs under this lock.
#[derive(Debug)]
pub struct PlaybackQueue {
    state: Mutex<QueueState>,
}

impl Default for PlaybackQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackQueue {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                pending: Vec::with_capacity(PENDING_CLIP_CAPACITY),
                clear_requested: false,
                retired: Vec::with_capacity(ACTIVE_CLIP_CAPACITY),
            }),
        }
    }

    /// Queue a decoded clip. Callable from any thread.
    pub fn enqueue(&self, clip: PendingClip) {
        lock(&self.state).pending.push(clip);
        self.release_finished();
    }

    /// Free the sample buffers of clips that finished or were stopped.
    ///
    /// Called from controller threads; the buffers are dropped after the
    /// lock is released. Returns how many buffers were handed back.
    pub fn release_finished(&self) -> usize {
        let finished: Vec<Arc<[f32]>> = lock(&self.state).retired.drain(..).collect();
        finished.len()
    }

    /// Clips waiting for the next block.
    pub fn len(&self) -> usize {
        lock(&self.state).pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Discard pending clips and have the next drain empty the active set.
    ///
    /// Clips enqueued after this call returns are kept.
    pub fn clear(&self) {
        let mut state = lock(&self.state);
        state.pending.clear();
        state.clear_requested = true;
        drop(state);
        self.release_finished();
    }

    /// Move every pending clip into `active`. Called by the mixing callback
    /// once per block.
    ///
    /// The pending vector is swapped with the set's (empty) incoming vector,
    /// so both allocations are reused and the lock is held for O(1). Retired
    /// buffers travel the other way once the previous batch was released.
    pub fn drain_into(&self, active: &mut ActiveClipSet) -> usize {
        let clear = {
            let mut state = lock(&self.state);
            std::mem::swap(&mut state.pending, &mut active.incoming);
            if state.retired.is_empty() {
                std::mem::swap(&mut state.retired, &mut active.retired);
            }
            std::mem::take(&mut state.clear_requested)
        };
        if clear {
            active.clear();
        }
        active.admit_incoming()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn pending(frames: usize) -> PendingClip {
        PendingClip::new(vec![0.1; frames * 2].into(), 2, 1.0)
    }

    #[test]
    fn drain_moves_everything_once() {
        let queue = PlaybackQueue::new();
        let mut active = ActiveClipSet::with_capacity(8);
        queue.enqueue(pending(4));
        queue.enqueue(pending(4));
        assert_eq!(queue.len(), 2);

        assert_eq!(queue.drain_into(&mut active), 2);
        assert_eq!(active.len(), 2);
        assert!(queue.is_empty());
        assert_eq!(queue.drain_into(&mut active), 0);
        assert_eq!(active.len(), 2);
    }

    #[test]
    fn clear_discards_pending_and_active() {
        let queue = PlaybackQueue::new();
        let mut active = ActiveClipSet::with_capacity(8);
        queue.enqueue(pending(4));
        queue.drain_into(&mut active);
        queue.enqueue(pending(4));

        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.drain_into(&mut active), 0);
        assert!(active.is_empty());
    }

    #[test]
    fn clips_enqueued_after_clear_survive() {
        let queue = PlaybackQueue::new();
        let mut active = ActiveClipSet::with_capacity(8);
        queue.enqueue(pending(4));
        queue.drain_into(&mut active);

        queue.clear();
        queue.enqueue(pending(4));
        assert_eq!(queue.drain_into(&mut active), 1);
        assert_eq!(active.len(), 1);
    }

    #[test]
    fn finished_buffers_are_freed_by_the_controller() {
        let queue = PlaybackQueue::new();
        let mut active = ActiveClipSet::with_capacity(4);
        let samples: Arc<[f32]> = vec![0.1; 2 * 2].into();
        let weak = Arc::downgrade(&samples);
        queue.enqueue(PendingClip::new(samples, 2, 1.0));
        queue.drain_into(&mut active);

        let mut out = vec![0.0; 2 * 4];
        active.mix_block(&mut out, 4);
        assert!(active.is_empty());
        assert!(weak.upgrade().is_some());

        queue.drain_into(&mut active);
        assert!(weak.upgrade().is_some());
        assert_eq!(queue.release_finished(), 1);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn stopped_buffers_reach_the_controller() {
        let queue = PlaybackQueue::new();
        let mut active = ActiveClipSet::with_capacity(4);
        let samples: Arc<[f32]> = vec![0.1; 2 * 64].into();
        let weak = Arc::downgrade(&samples);
        queue.enqueue(PendingClip::new(samples, 2, 1.0));
        queue.drain_into(&mut active);

        queue.clear();
        queue.drain_into(&mut active);
        assert!(active.is_empty());
        queue.drain_into(&mut active);
        queue.enqueue(pending(1));
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn concurrent_producers_lose_nothing() {
        let queue = Arc::new(PlaybackQueue::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    for _ in 0..50 {
                        queue.enqueue(pending(1));
                    }
                })
            })
            .collect();

        let mut active = ActiveClipSet::with_capacity(8);
        let mut drained = 0;
        for handle in handles {
            drained += queue.drain_into(&mut active);
            handle.join().expect("producer thread");
        }
        drained += queue.drain_into(&mut active);
        assert_eq!(drained, 200);
        assert_eq!(active.len(), 200);
    }
}
