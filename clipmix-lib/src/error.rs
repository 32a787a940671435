//! Error types for device, decode and configuration failures.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to open or start the bound audio devices.
///
/// Fatal to a single `start()` attempt only; the stream stays stopped.
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("no default {0} device available")]
    NoDefaultDevice(&'static str),

    #[error("{kind} device not found: {name}")]
    DeviceNotFound { kind: &'static str, name: String },

    #[error("failed to enumerate {kind} devices: {reason}")]
    Enumerate { kind: &'static str, reason: String },

    #[error("failed to query {kind} device config: {reason}")]
    Config { kind: &'static str, reason: String },

    #[error("unsupported {kind} configuration: {reason}")]
    UnsupportedConfig { kind: &'static str, reason: String },

    #[error("failed to build {kind} stream: {reason}")]
    StreamBuild { kind: &'static str, reason: String },

    #[error("failed to start {kind} stream: {reason}")]
    StreamPlay { kind: &'static str, reason: String },

    #[error("stream owner thread failed: {0}")]
    Thread(String),
}

/// Failure to turn a source file into a playable clip.
///
/// Scoped to a single `play_sound` call.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported audio format in {path}: {reason}")]
    Unsupported { path: PathBuf, reason: String },

    #[error("no decodable audio track in {0}")]
    NoTrack(PathBuf),

    #[error("missing sample rate in {0}")]
    MissingSampleRate(PathBuf),

    #[error("corrupt audio stream in {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("no audio frames decoded from {0}")]
    Empty(PathBuf),
}

/// Failure to load or validate an [`EngineConfig`](crate::config::EngineConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config json: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config value: {0}")]
    Invalid(String),
}

/// Any error surfaced by the engine's public operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
