//! Top-level command dispatch and the interactive soundboard loop.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::ArgMatches;
use clipmix_lib::audio::{list_input_devices, list_output_devices, DeviceInfo};
use clipmix_lib::clip::ClipLoader;
use clipmix_lib::{AudioMixer, EngineConfig};
use crossterm::terminal;
use log::{error, info, warn};
use serde::Serialize;

use crate::cli::{self, CliError};
use crate::controls;

const KEY_SLOTS: usize = 9;

/// Route parsed arguments to the matching command.
pub fn run(args: &ArgMatches) -> Result<i32, CliError> {
    match args.subcommand() {
        Some(("devices", _)) => list_devices(),
        Some(("decode", sub)) => decode(sub),
        Some(("create", sub)) => match sub.subcommand() {
            Some(("config-json", _)) => {
                println!("{}", serde_json::to_string_pretty(&EngineConfig::default())?);
                Ok(0)
            }
            _ => Ok(2),
        },
        _ => play(args),
    }
}

fn print_devices(title: &str, devices: &[DeviceInfo]) {
    println!("{}:", title);
    if devices.is_empty() {
        println!("  (none)");
    }
    for device in devices {
        println!(
            "  {} ({} ch){}",
            device.name,
            device.max_channels,
            if device.is_default { " [default]" } else { "" }
        );
    }
}

fn list_devices() -> Result<i32, CliError> {
    print_devices("Input devices", &list_input_devices()?);
    print_devices("Output devices", &list_output_devices()?);
    Ok(0)
}

#[derive(Serialize)]
struct DecodeSummary {
    path: String,
    source_rate: u32,
    source_channels: usize,
    sample_rate: u32,
    frames: usize,
    duration_secs: f64,
    peak: f32,
}

fn decode(args: &ArgMatches) -> Result<i32, CliError> {
    let Some(path) = args.get_one::<String>("INPUT") else {
        return Ok(2);
    };
    let defaults = EngineConfig::default();
    let sample_rate = cli::parse_arg::<u32>(args, "sample-rate")?.unwrap_or(defaults.sample_rate);
    let config = defaults.with_sample_rate(sample_rate);
    config.validate()?;

    let clip = ClipLoader::from_config(&config).load(Path::new(path))?;
    let summary = DecodeSummary {
        path: path.clone(),
        source_rate: clip.source_rate,
        source_channels: clip.source_channels,
        sample_rate: clip.sample_rate,
        frames: clip.frames(),
        duration_secs: clip.duration_secs(),
        peak: clip.peak(),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(0)
}

/// Restores cooked mode when the key loop exits, including on error.
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> Result<Self, CliError> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn play(args: &ArgMatches) -> Result<i32, CliError> {
    let config = cli::engine_config(args)?;
    let sounds: Vec<PathBuf> = args
        .get_many::<String>("SOUND")
        .map(|values| values.map(PathBuf::from).collect())
        .unwrap_or_default();
    if sounds.is_empty() {
        error!("no sound files given");
        return Ok(2);
    }
    if sounds.len() > KEY_SLOTS {
        warn!(
            "{} sounds given, only the first {} are bound to keys",
            sounds.len(),
            KEY_SLOTS
        );
    }
    let mic_volume = cli::parse_arg::<f32>(args, "mic-volume")?.unwrap_or(1.0);
    let volume = cli::parse_arg::<f32>(args, "volume")?.unwrap_or(clipmix_lib::DEFAULT_CLIP_VOLUME);

    let mixer = AudioMixer::new(config)?;
    mixer.set_mic_volume(mic_volume);
    mixer.set_mic_muted(args.get_flag("mute"));

    if mixer.config().cache_clips {
        let loaded = mixer.preload(&sounds);
        info!("preloaded {}/{} sounds", loaded, sounds.len());
    }

    let input = args.get_one::<String>("input").map(String::as_str);
    let output = args.get_one::<String>("output").map(String::as_str);
    mixer.start(input, output)?;

    for (slot, path) in sounds.iter().take(KEY_SLOTS).enumerate() {
        info!("  {}: {}", slot + 1, path.display());
    }
    info!("keys: 1-9 play | space stop all | m mute | -/= mic volume | o monitor | i status | q quit");

    let result = key_loop(&mixer, &sounds, volume);
    mixer.stop();
    info!("{}", controls::status_text(&mixer));
    result.map(|_| 0)
}

fn key_loop(mixer: &AudioMixer, sounds: &[PathBuf], volume: f32) -> Result<(), CliError> {
    let _raw = RawModeGuard::enable()?;
    loop {
        if let Some(action) = controls::poll_action(Duration::from_millis(100))? {
            if !controls::apply(mixer, sounds, volume, action) {
                return Ok(());
            }
        }
    }
}
