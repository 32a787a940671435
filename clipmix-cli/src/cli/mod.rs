//! Argument parsing and the CLI error type.

use std::str::FromStr;

use clap::ArgMatches;
use clipmix_lib::{ConfigError, DecodeError, DeviceError, EngineConfig};
use thiserror::Error;

pub mod args;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("terminal error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid value for --{name}: {value}")]
    InvalidArg { name: &'static str, value: String },
}

/// Parse an optional argument into `T`.
pub fn parse_arg<T: FromStr>(args: &ArgMatches, name: &'static str) -> Result<Option<T>, CliError> {
    match args.get_one::<String>(name) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| CliError::InvalidArg {
                name,
                value: value.clone(),
            }),
        None => Ok(None),
    }
}

/// Engine config from `--config` (or defaults) with flag overrides applied.
pub fn engine_config(args: &ArgMatches) -> Result<EngineConfig, CliError> {
    let mut config = match args.get_one::<String>("config") {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };

    if let Some(sample_rate) = parse_arg::<u32>(args, "sample-rate")? {
        config = config.with_sample_rate(sample_rate);
    }
    if let Some(block_size) = parse_arg::<usize>(args, "block-size")? {
        config = config.with_block_size(block_size);
    }
    if let Some(fade_out_ms) = parse_arg::<u32>(args, "fade-out-ms")? {
        config = config.with_fade_out_ms(fade_out_ms);
    }
    if args.get_flag("monitor") {
        config = config.with_monitor(true);
    }

    config.validate()?;
    Ok(config)
}
