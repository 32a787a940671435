//! Local monitor output: a sounds-only copy of the mix on the default device.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use dasp_ring_buffer::Bounded;
use log::info;
use rodio::source::SeekError;
use rodio::{OutputStream, OutputStreamBuilder, Source};

use crate::constants::CHANNELS;
use crate::error::DeviceError;
use crate::sync::lock;

/// Samples handed to rodio per refill. Even, so stereo frames stay aligned.
const MONITOR_CHUNK: usize = 512;

/// Feed side of the monitor. Cheap to clone and `Send`.
#[derive(Debug, Clone)]
pub struct MonitorTap {
    buffer: Arc<Mutex<Bounded<Vec<f32>>>>,
    enabled: Arc<AtomicBool>,
    sample_rate: u32,
}

impl MonitorTap {
    /// Tap holding at most `capacity` interleaved stereo samples.
    pub fn new(sample_rate: u32, capacity: usize, enabled: bool) -> Self {
        Self {
            buffer: Arc::new(Mutex::new(Bounded::from(vec![0.0; capacity.max(CHANNELS)]))),
            enabled: Arc::new(AtomicBool::new(enabled)),
            sample_rate,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Start or stop feeding blocks. Disabling drops whatever is buffered.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
        if !enabled {
            let mut buffer = lock(&self.buffer);
            while buffer.pop().is_some() {}
        }
    }

    /// Samples buffered for the monitor device.
    #[cfg(test)]
    pub(crate) fn buffered(&self) -> usize {
        lock(&self.buffer).len()
    }

    /// Queue one interleaved stereo block. Oldest samples are overwritten
    /// when the monitor device falls behind.
    pub fn push_block(&self, block: &[f32]) {
        if !self.is_enabled() {
            return;
        }
        let mut buffer = lock(&self.buffer);
        for &sample in block {
            buffer.push(sample);
        }
    }

    /// Endless rodio source reading from this tap.
    pub fn source(&self) -> MonitorSource {
        MonitorSource {
            buffer: Arc::clone(&self.buffer),
            chunk: Vec::with_capacity(MONITOR_CHUNK),
            cursor: 0,
            sample_rate: self.sample_rate,
        }
    }

    /// Open the default output device and start playing the tap into it.
    ///
    /// The returned stream must stay alive for as long as the monitor plays.
    pub fn open(&self) -> Result<OutputStream, DeviceError> {
        let stream =
            OutputStreamBuilder::open_default_stream().map_err(|err| DeviceError::StreamBuild {
                kind: "monitor",
                reason: err.to_string(),
            })?;
        stream.mixer().add(self.source());
        info!("monitor output opened at {} Hz", self.sample_rate);
        Ok(stream)
    }
}

/// Stereo source that plays tap samples and fills gaps with silence.
#[derive(Debug)]
pub struct MonitorSource {
    buffer: Arc<Mutex<Bounded<Vec<f32>>>>,
    chunk: Vec<f32>,
    cursor: usize,
    sample_rate: u32,
}

impl MonitorSource {
    fn refill(&mut self) {
        self.chunk.clear();
        self.cursor = 0;
        {
            let mut buffer = lock(&self.buffer);
            let available = buffer.len().min(MONITOR_CHUNK);
            let take = available - available % CHANNELS;
            for _ in 0..take {
                self.chunk.push(buffer.pop().unwrap_or(0.0));
            }
        }
        if self.chunk.is_empty() {
            self.chunk.resize(MONITOR_CHUNK, 0.0);
        }
    }
}

impl Iterator for MonitorSource {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.chunk.len() {
            self.refill();
        }
        let sample = self.chunk[self.cursor];
        self.cursor += 1;
        Some(sample)
    }
}

impl Source for MonitorSource {
    fn current_span_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        CHANNELS as u16
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }

    fn try_seek(&mut self, _pos: Duration) -> Result<(), SeekError> {
        Err(SeekError::NotSupported {
            underlying_source: "MonitorSource",
        })
    }
}
