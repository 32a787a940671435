//! Symphonia helpers for decoding a whole audio file into memory.

use std::fs::File;
use std::path::Path;

use log::{debug, warn};
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::DecodeError;

use super::convert::append_interleaved;

/// Interleaved PCM decoded at the file's native rate and channel count.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub channels: usize,
    pub sample_rate: u32,
}

impl DecodedAudio {
    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels
        }
    }
}

/// Decode every packet of the first audio track in `path`.
///
/// Unsupported or corrupt input is reported as a [`DecodeError`]. Packets that
/// fail with a recoverable decode error are logged and skipped.
pub fn decode(path: &Path) -> Result<DecodedAudio, DecodeError> {
    let mut format = get_reader(path)?;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| DecodeError::NoTrack(path.to_path_buf()))?;
    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| DecodeError::MissingSampleRate(path.to_path_buf()))?;
    let mut decoder = get_decoder(path, track)?;

    let mut samples = Vec::new();
    let mut channels = 0usize;
    let mut packet_samples = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(Error::IoError(err)) if err.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(Error::ResetRequired) => {
                debug!("decoder reset required in {}, stopping", path.display());
                break;
            }
            Err(err) => {
                return Err(DecodeError::Corrupt {
                    path: path.to_path_buf(),
                    reason: err.to_string(),
                })
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                packet_samples.clear();
                let packet_channels = append_interleaved(&decoded, &mut packet_samples);
                if packet_channels == 0 {
                    continue;
                }
                if channels == 0 {
                    channels = packet_channels;
                } else if packet_channels != channels {
                    warn!(
                        "channel count changed from {} to {} in {}, skipping packet",
                        channels,
                        packet_channels,
                        path.display()
                    );
                    continue;
                }
                samples.extend_from_slice(&packet_samples);
            }
            Err(Error::DecodeError(err)) => {
                warn!("decode error in {}: {}", path.display(), err);
            }
            Err(err) => {
                return Err(DecodeError::Corrupt {
                    path: path.to_path_buf(),
                    reason: err.to_string(),
                })
            }
        }
    }

    if channels == 0 || samples.is_empty() {
        return Err(DecodeError::Empty(path.to_path_buf()));
    }

    debug!(
        "decoded {} ({} frames, {} ch, {}Hz)",
        path.display(),
        samples.len() / channels,
        channels,
        sample_rate
    );

    Ok(DecodedAudio {
        samples,
        channels,
        sample_rate,
    })
}

/// Probe `path` and return its format reader.
fn get_reader(path: &Path) -> Result<Box<dyn FormatReader>, DecodeError> {
    let src = File::open(path).map_err(|source| DecodeError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mss = MediaSourceStream::new(Box::new(src), Default::default());

    // The extension is only a probe hint; the probe still sniffs the content.
    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(extension);
    }

    let meta_opts: MetadataOptions = Default::default();
    let fmt_opts: FormatOptions = Default::default();

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &fmt_opts, &meta_opts)
        .map_err(|err| DecodeError::Unsupported {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;

    Ok(probed.format)
}

/// Build a decoder for `track`.
fn get_decoder(
    path: &Path,
    track: &symphonia::core::formats::Track,
) -> Result<Box<dyn Decoder>, DecodeError> {
    let dec_opts: DecoderOptions = Default::default();

    symphonia::default::get_codecs()
        .make(&track.codec_params, &dec_opts)
        .map_err(|err| DecodeError::Unsupported {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })
}
