//! Real-time mixing: the playback queue, the active clip set and the block
//! callback that combines them with the mic.
//!
//! Data moves in one direction. Controller threads push [`PendingClip`]s into
//! the [`PlaybackQueue`]; once per block the [`MixEngine`] swaps them into its
//! [`ActiveClipSet`], sums every clip over the mic signal and hard-clips the
//! result. Mic gain, mute and the counters behind [`EngineStats`] are atomics
//! and never take a lock.

mod clip;
mod mixer;
mod queue;
mod state;

pub use clip::{ActiveClipSet, Clip, PendingClip};
pub use mixer::{hard_clip, MixEngine};
pub use queue::PlaybackQueue;
pub use state::{EngineCounters, EngineStats, MicState};
