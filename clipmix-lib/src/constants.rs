//! Shared constants for engine defaults.

/// Default engine sample rate (Hz).
pub const SAMPLE_RATE: u32 = 48_000;

/// Highest sample rate a config may ask for (Hz).
pub const MAX_SAMPLE_RATE: u32 = 384_000;

/// Default block size in frames (~21.3ms at 48kHz).
pub const BLOCK_SIZE: usize = 1024;

/// Largest block a config may ask for, in frames.
pub const MAX_BLOCK_SIZE: usize = 16_384;

/// Output channel count. The engine always mixes to stereo.
pub const CHANNELS: usize = 2;

/// Default capacity of the mic bridge, in blocks.
pub const MIC_QUEUE_BLOCKS: usize = 8;

/// Largest mic bridge a config may ask for, in blocks.
pub const MAX_MIC_QUEUE_BLOCKS: usize = 256;

/// Active clips the mixer can hold before its clip vector has to grow.
pub const ACTIVE_CLIP_CAPACITY: usize = 64;

/// Pending clips the playback queue can hold before it has to grow.
pub const PENDING_CLIP_CAPACITY: usize = 32;

/// Capacity of the monitor tap, in blocks.
pub const MONITOR_QUEUE_BLOCKS: usize = 8;
