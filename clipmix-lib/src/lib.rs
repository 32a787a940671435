//! # clipmix
//!
//! Real-time engine that mixes a live microphone with triggered sound clips
//! into one stereo output stream.
//!
//! - [`clip`] decodes files with symphonia, coerces them to stereo, resamples
//!   them to the engine rate and caches the result.
//! - [`engine`] holds the playback queue and the per-block mixing callback.
//! - [`audio`] binds the engine to cpal input/output devices and an optional
//!   rodio monitor output.
//! - [`mixer::AudioMixer`] is the control surface applications hold.
//!
//! ```no_run
//! use clipmix_lib::{AudioMixer, EngineConfig};
//!
//! let mixer = AudioMixer::new(EngineConfig::default())?;
//! mixer.start(None, None)?;
//! mixer.play_sound("airhorn.wav", 0.8)?;
//! mixer.set_mic_volume(1.2);
//! mixer.stop_all_sounds();
//! mixer.stop();
//! # Ok::<(), clipmix_lib::Error>(())
//! ```

pub mod audio;
pub mod clip;
pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod mixer;
mod sync;
#[cfg(test)]
mod test_data;

pub use config::EngineConfig;
pub use engine::EngineStats;
pub use error::{ConfigError, DecodeError, DeviceError, Error, Result};
pub use mixer::{AudioMixer, DEFAULT_CLIP_VOLUME};
