//! Clip loading: decode, channel coercion, resampling, fade and caching.

pub mod cache;
mod convert;
pub mod decode;
pub mod fade;
pub mod loader;
pub mod resample;

pub use cache::ClipCache;
pub use decode::{decode, DecodedAudio};
pub use loader::{ClipData, ClipLoader};
pub use resample::{coerce_stereo, resample};
