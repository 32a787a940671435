//! Input/output device streams and their start/stop lifecycle.

use std::sync::{mpsc, Arc, Mutex};
use std::thread::{self, JoinHandle};

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use log::{debug, error, info, warn};

use crate::config::EngineConfig;
use crate::constants::CHANNELS;
use crate::engine::{EngineCounters, MixEngine};
use crate::error::DeviceError;
use crate::sync::lock;

use super::device::{find_device, stream_config, Direction};
use super::mic::MicBridge;
use super::monitor::MonitorTap;

/// Everything the device callbacks need. Built fresh for every start.
#[derive(Debug)]
pub struct StreamParts {
    pub engine: MixEngine,
    pub mic: MicBridge,
    /// Always fed; the tap drops blocks while it is disabled.
    pub monitor: MonitorTap,
    pub counters: Arc<EngineCounters>,
}

/// Output-side state: stages whole engine blocks into host buffers of any
/// size.
#[derive(Debug)]
pub(crate) struct OutputStage {
    engine: MixEngine,
    mic: MicBridge,
    monitor: MonitorTap,
    counters: Arc<EngineCounters>,
    mic_block: Vec<f32>,
    block: Vec<f32>,
    cursor: usize,
    device_channels: usize,
}

impl OutputStage {
    pub(crate) fn new(parts: StreamParts, device_channels: usize) -> Self {
        let block_size = parts.engine.block_size();
        let block_samples = parts.engine.block_samples();
        Self {
            engine: parts.engine,
            mic: parts.mic,
            monitor: parts.monitor,
            counters: parts.counters,
            mic_block: vec![0.0; block_size],
            block: vec![0.0; block_samples],
            cursor: block_size,
            device_channels: device_channels.max(CHANNELS),
        }
    }

    /// Fill one host buffer. Channels past the first two are silenced.
    pub(crate) fn fill(&mut self, data: &mut [f32]) {
        for frame in data.chunks_exact_mut(self.device_channels) {
            if self.cursor >= self.engine.block_size() {
                self.render_block();
            }
            let index = self.cursor * CHANNELS;
            frame[0] = self.block[index];
            frame[1] = self.block[index + 1];
            for sample in frame.iter_mut().skip(CHANNELS) {
                *sample = 0.0;
            }
            self.cursor += 1;
        }
    }

    fn render_block(&mut self) {
        if !self.mic.pop_block(&mut self.mic_block) {
            self.counters.record_mic_underrun();
        }
        self.engine.process_block(&self.mic_block, &mut self.block);
        self.monitor.push_block(self.engine.sounds());
        self.cursor = 0;
    }
}

/// Streams kept alive by the owner thread.
struct OpenStreams {
    _input: Stream,
    _output: Stream,
    tap: MonitorTap,
    monitor: Option<rodio::OutputStream>,
}

impl OpenStreams {
    /// Open or close the monitor device. A monitor that fails to open turns
    /// the tap off again so its flag reports what is audible.
    fn set_monitor(&mut self, enabled: bool) {
        match (enabled, self.monitor.is_some()) {
            (true, false) => match self.tap.open() {
                Ok(stream) => self.monitor = Some(stream),
                Err(err) => {
                    warn!("monitor output unavailable: {}", err);
                    self.tap.set_enabled(false);
                }
            },
            (false, true) => {
                self.monitor = None;
                info!("monitor output closed");
            }
            _ => {}
        }
    }
}

/// Requests handled by the owner thread while the streams run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamCommand {
    Monitor(bool),
    Stop,
}

struct StreamThread {
    commands: mpsc::Sender<StreamCommand>,
    handle: JoinHandle<()>,
}

/// Owns the bound input and output devices.
///
/// Platform stream handles cannot leave the thread that created them, so
/// `start` spawns an owner thread that opens the streams, reports back and
/// then serves monitor requests until `stop`.
pub struct DeviceStream {
    config: EngineConfig,
    lifecycle: Mutex<Option<StreamThread>>,
}

impl std::fmt::Debug for DeviceStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceStream")
            .field("config", &self.config)
            .field("running", &self.is_running())
            .finish()
    }
}

impl DeviceStream {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            lifecycle: Mutex::new(None),
        }
    }

    pub fn is_running(&self) -> bool {
        lock(&self.lifecycle).is_some()
    }

    /// Open the devices and start the callbacks.
    ///
    /// Device names select devices of the default host; `None` picks the host
    /// default. Calling this while running is a no-op and `parts` is dropped.
    /// On error nothing keeps running.
    pub fn start(
        &self,
        input: Option<&str>,
        output: Option<&str>,
        parts: StreamParts,
    ) -> Result<(), DeviceError> {
        let mut lifecycle = lock(&self.lifecycle);
        if lifecycle.is_some() {
            debug!("device stream already running");
            return Ok(());
        }

        let (ready_tx, ready_rx) = mpsc::channel();
        let (commands, command_rx) = mpsc::channel();
        let config = self.config.clone();
        let input = input.map(str::to_owned);
        let output = output.map(str::to_owned);

        let handle = thread::Builder::new()
            .name("clipmix-stream".to_string())
            .spawn(move || {
                let mut streams =
                    match open_streams(&config, input.as_deref(), output.as_deref(), parts) {
                        Ok(streams) => streams,
                        Err(err) => {
                            let _ = ready_tx.send(Err(err));
                            return;
                        }
                    };
                let _ = ready_tx.send(Ok(()));
                // A closed channel means the DeviceStream is gone.
                while let Ok(command) = command_rx.recv() {
                    match command {
                        StreamCommand::Monitor(enabled) => streams.set_monitor(enabled),
                        StreamCommand::Stop => break,
                    }
                }
                drop(streams);
                debug!("device streams released");
            })
            .map_err(|err| DeviceError::Thread(err.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                *lifecycle = Some(StreamThread { commands, handle });
                info!(
                    "device stream started at {} Hz, {} frame blocks",
                    self.config.sample_rate, self.config.block_size
                );
                Ok(())
            }
            Ok(Err(err)) => {
                let _ = handle.join();
                Err(err)
            }
            Err(_) => {
                let _ = handle.join();
                Err(DeviceError::Thread(
                    "stream thread exited before opening devices".to_string(),
                ))
            }
        }
    }

    /// Stop the callbacks and release the devices. No-op when stopped.
    pub fn stop(&self) {
        let mut lifecycle = lock(&self.lifecycle);
        let Some(thread) = lifecycle.take() else {
            return;
        };
        let _ = thread.commands.send(StreamCommand::Stop);
        if thread.handle.join().is_err() {
            error!("stream thread panicked while shutting down");
        }
        info!("device stream stopped");
    }

    /// Open or close the monitor device of a running stream. No-op when
    /// stopped; the next `start` follows the tap's flag.
    pub fn set_monitor(&self, enabled: bool) {
        if let Some(thread) = lock(&self.lifecycle).as_ref() {
            let _ = thread.commands.send(StreamCommand::Monitor(enabled));
        }
    }
}

impl Drop for DeviceStream {
    fn drop(&mut self) {
        self.stop();
    }
}

fn open_streams(
    config: &EngineConfig,
    input: Option<&str>,
    output: Option<&str>,
    parts: StreamParts,
) -> Result<OpenStreams, DeviceError> {
    let host = cpal::default_host();
    let input_device = find_device(&host, Direction::Input, input)?;
    let output_device = find_device(&host, Direction::Output, output)?;
    info!(
        "input: {}, output: {}",
        input_device.name().unwrap_or_else(|_| "unknown".to_string()),
        output_device.name().unwrap_or_else(|_| "unknown".to_string())
    );

    let input_config = stream_config(
        &input_device,
        Direction::Input,
        config.sample_rate,
        config.block_size,
    )?;
    let output_config = stream_config(
        &output_device,
        Direction::Output,
        config.sample_rate,
        config.block_size,
    )?;

    let tap = parts.monitor.clone();
    let input_stream = build_input_stream(&input_device, &input_config, parts.mic.clone())?;
    let output_stream = build_output_stream(
        &output_device,
        &output_config,
        OutputStage::new(parts, output_config.channels as usize),
    )?;

    input_stream.play().map_err(|err| DeviceError::StreamPlay {
        kind: "input",
        reason: err.to_string(),
    })?;
    output_stream.play().map_err(|err| DeviceError::StreamPlay {
        kind: "output",
        reason: err.to_string(),
    })?;

    let mut streams = OpenStreams {
        _input: input_stream,
        _output: output_stream,
        monitor: None,
        tap,
    };
    let enabled = streams.tap.is_enabled();
    streams.set_monitor(enabled);
    Ok(streams)
}

fn build_input_stream(
    device: &Device,
    config: &StreamConfig,
    mic: MicBridge,
) -> Result<Stream, DeviceError> {
    let channels = config.channels as usize;
    device
        .build_input_stream(
            config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                mic.push_interleaved(data, channels);
            },
            |err| error!("input stream error: {}", err),
            None,
        )
        .map_err(|err| DeviceError::StreamBuild {
            kind: "input",
            reason: err.to_string(),
        })
}

fn build_output_stream(
    device: &Device,
    config: &StreamConfig,
    mut stage: OutputStage,
) -> Result<Stream, DeviceError> {
    device
        .build_output_stream(
            config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| stage.fill(data),
            |err| error!("output stream error: {}", err),
            None,
        )
        .map_err(|err| DeviceError::StreamBuild {
            kind: "output",
            reason: err.to_string(),
        })
}
