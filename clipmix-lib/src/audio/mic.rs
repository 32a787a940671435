//! Mic capture handoff from the input callback to the output callback.

use std::sync::{Arc, Mutex};

use dasp_ring_buffer::Bounded;

use crate::sync::lock;

/// Bounded ring of mono mic samples shared by the two device callbacks.
///
/// When full, new samples overwrite the oldest ones, so a stalled output side
/// never makes the input side wait.
#[derive(Debug, Clone)]
pub struct MicBridge {
    buffer: Arc<Mutex<Bounded<Vec<f32>>>>,
}

impl MicBridge {
    /// Bridge holding at most `capacity` mono samples.
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: Arc::new(Mutex::new(Bounded::from(vec![0.0; capacity.max(1)]))),
        }
    }

    /// Bridge sized for `blocks` blocks of `block_size` frames.
    pub fn with_blocks(block_size: usize, blocks: usize) -> Self {
        Self::new(block_size * blocks)
    }

    #[cfg(test)]
    pub(crate) fn capacity(&self) -> usize {
        lock(&self.buffer).max_len()
    }

    /// Samples waiting to be read.
    pub fn len(&self) -> usize {
        lock(&self.buffer).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Push the first channel of interleaved `data`.
    ///
    /// Returns the number of old samples overwritten because the ring was full.
    pub fn push_interleaved(&self, data: &[f32], channels: usize) -> usize {
        let channels = channels.max(1);
        let mut buffer = lock(&self.buffer);
        let mut overwritten = 0;
        for frame in data.chunks_exact(channels) {
            if buffer.push(frame[0]).is_some() {
                overwritten += 1;
            }
        }
        overwritten
    }

    /// Fill `block` with the next `block.len()` samples.
    ///
    /// Returns `false` and leaves `block` untouched when fewer samples are
    /// buffered, so the caller keeps playing its previous block.
    pub fn pop_block(&self, block: &mut [f32]) -> bool {
        let mut buffer = lock(&self.buffer);
        if buffer.len() < block.len() {
            return false;
        }
        for sample in block.iter_mut() {
            *sample = buffer.pop().unwrap_or(0.0);
        }
        true
    }

    #[cfg(test)]
    pub(crate) fn clear(&self) {
        let mut buffer = lock(&self.buffer);
        while buffer.pop().is_some() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn takes_first_channel_only() {
        let bridge = MicBridge::new(8);
        bridge.push_interleaved(&[0.1, 0.9, 0.2, 0.9, 0.3, 0.9], 2);
        let mut block = [0.0; 3];
        assert!(bridge.pop_block(&mut block));
        assert_eq!(block, [0.1, 0.2, 0.3]);
        assert!(bridge.is_empty());
    }

    #[test]
    fn short_buffer_keeps_previous_block() {
        let bridge = MicBridge::new(16);
        bridge.push_interleaved(&[0.5; 4], 1);
        let mut block = [0.5; 4];
        assert!(bridge.pop_block(&mut block));

        bridge.push_interleaved(&[0.25; 2], 1);
        assert!(!bridge.pop_block(&mut block));
        assert_eq!(block, [0.5; 4]);
        assert_eq!(bridge.len(), 2);
    }

    #[test]
    fn full_bridge_drops_oldest() {
        let bridge = MicBridge::with_blocks(2, 2);
        assert_eq!(bridge.capacity(), 4);
        let overwritten = bridge.push_interleaved(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 1);
        assert_eq!(overwritten, 2);

        let mut block = [0.0; 4];
        assert!(bridge.pop_block(&mut block));
        assert_eq!(block, [3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn clear_empties_the_ring() {
        let bridge = MicBridge::new(4);
        bridge.push_interleaved(&[0.1, 0.2], 1);
        bridge.clear();
        assert!(bridge.is_empty());
    }
}
