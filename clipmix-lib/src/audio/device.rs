//! Device lookup, enumeration and stream config selection.

use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{
    BufferSize, Device, Host, SampleFormat, SampleRate, StreamConfig, SupportedBufferSize,
    SupportedStreamConfigRange,
};
use log::debug;
use serde::Serialize;

use crate::constants::CHANNELS;
use crate::error::DeviceError;

/// Which side of the engine a device feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

impl Direction {
    pub fn kind(self) -> &'static str {
        match self {
            Direction::Input => "input",
            Direction::Output => "output",
        }
    }

    /// Fewest channels a device must offer on this side.
    fn min_channels(self) -> u16 {
        match self {
            Direction::Input => 1,
            Direction::Output => CHANNELS as u16,
        }
    }
}

/// A device as reported by the default host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub name: String,
    pub max_channels: u16,
    pub is_default: bool,
}

/// Capture devices of the default host.
pub fn list_input_devices() -> Result<Vec<DeviceInfo>, DeviceError> {
    list_devices(&cpal::default_host(), Direction::Input)
}

/// Playback devices of the default host.
pub fn list_output_devices() -> Result<Vec<DeviceInfo>, DeviceError> {
    list_devices(&cpal::default_host(), Direction::Output)
}

fn list_devices(host: &Host, direction: Direction) -> Result<Vec<DeviceInfo>, DeviceError> {
    let enumerate_error = |err: cpal::DevicesError| DeviceError::Enumerate {
        kind: direction.kind(),
        reason: err.to_string(),
    };
    let (default_name, devices): (Option<String>, Vec<Device>) = match direction {
        Direction::Input => (
            host.default_input_device().and_then(|d| d.name().ok()),
            host.input_devices().map_err(enumerate_error)?.collect(),
        ),
        Direction::Output => (
            host.default_output_device().and_then(|d| d.name().ok()),
            host.output_devices().map_err(enumerate_error)?.collect(),
        ),
    };

    let mut infos = Vec::with_capacity(devices.len());
    for device in devices {
        let Ok(name) = device.name() else {
            continue;
        };
        let max_channels = match supported_configs(&device, direction) {
            Ok(configs) => configs.iter().map(|c| c.channels()).max().unwrap_or(0),
            Err(err) => {
                debug!("skipping {} device {}: {}", direction.kind(), name, err);
                continue;
            }
        };
        infos.push(DeviceInfo {
            is_default: default_name.as_deref() == Some(name.as_str()),
            name,
            max_channels,
        });
    }
    Ok(infos)
}

/// Find a device by name, or the host default when `name` is `None`.
pub(crate) fn find_device(
    host: &Host,
    direction: Direction,
    name: Option<&str>,
) -> Result<Device, DeviceError> {
    let Some(name) = name else {
        let device = match direction {
            Direction::Input => host.default_input_device(),
            Direction::Output => host.default_output_device(),
        };
        return device.ok_or(DeviceError::NoDefaultDevice(direction.kind()));
    };

    let devices: Vec<Device> = match direction {
        Direction::Input => host.input_devices().map(|devices| devices.collect()),
        Direction::Output => host.output_devices().map(|devices| devices.collect()),
    }
    .map_err(|err| DeviceError::Enumerate {
        kind: direction.kind(),
        reason: err.to_string(),
    })?;

    devices
        .into_iter()
        .find(|device| device.name().ok().as_deref() == Some(name))
        .ok_or_else(|| DeviceError::DeviceNotFound {
            kind: direction.kind(),
            name: name.to_string(),
        })
}

fn supported_configs(
    device: &Device,
    direction: Direction,
) -> Result<Vec<SupportedStreamConfigRange>, DeviceError> {
    let configs: Result<Vec<_>, _> = match direction {
        Direction::Input => device.supported_input_configs().map(|c| c.collect()),
        Direction::Output => device.supported_output_configs().map(|c| c.collect()),
    };
    configs.map_err(|err| DeviceError::Config {
        kind: direction.kind(),
        reason: err.to_string(),
    })
}

/// Pick an f32 stream config at exactly `sample_rate`.
///
/// The config with the fewest channels that still satisfies the direction
/// wins, so a mic opens mono where it can and an output opens stereo. The
/// host buffer is pinned to `block_size` when the device allows it.
pub(crate) fn stream_config(
    device: &Device,
    direction: Direction,
    sample_rate: u32,
    block_size: usize,
) -> Result<StreamConfig, DeviceError> {
    let configs = supported_configs(device, direction)?;
    let min_channels = direction.min_channels();

    let range = configs
        .iter()
        .filter(|c| c.sample_format() == SampleFormat::F32)
        .filter(|c| c.channels() >= min_channels)
        .filter(|c| {
            sample_rate >= c.min_sample_rate().0 && sample_rate <= c.max_sample_rate().0
        })
        .min_by_key(|c| c.channels())
        .ok_or_else(|| DeviceError::UnsupportedConfig {
            kind: direction.kind(),
            reason: format!(
                "no f32 config with at least {} channel(s) at {} Hz",
                min_channels, sample_rate
            ),
        })?;

    let buffer_size = match range.buffer_size() {
        SupportedBufferSize::Range { min, max }
            if (*min as usize..=*max as usize).contains(&block_size) =>
        {
            BufferSize::Fixed(block_size as u32)
        }
        _ => BufferSize::Default,
    };

    debug!(
        "{} config: {} channel(s), {} Hz, buffer {:?}",
        direction.kind(),
        range.channels(),
        sample_rate,
        buffer_size
    );

    Ok(StreamConfig {
        channels: range.channels(),
        sample_rate: SampleRate(sample_rate),
        buffer_size,
    })
}
