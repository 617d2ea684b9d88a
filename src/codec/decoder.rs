//! Audio decoding using symphonia
//!
//! Decodes audio files to mono f32 samples at the source's native sample
//! rate. No resampling happens here: the asset's sample rate field must
//! reflect the file exactly, and transforms downstream depend on that.

use crate::codec::AudioDecoder;
use crate::error::{Result, TrackshiftError};
use crate::types::AudioBuffer;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, trace};

/// Maximum file size we'll attempt to decode (2GB)
/// Prevents OOM on extremely large files
const MAX_FILE_SIZE: u64 = 2 * 1024 * 1024 * 1024;

/// Decoder backend built on symphonia's probe + codec registry
pub struct SymphoniaDecoder;

impl SymphoniaDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SymphoniaDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioDecoder for SymphoniaDecoder {
    fn decode(&self, path: &Path) -> Result<AudioBuffer> {
        // Check file size before attempting to decode
        let metadata = std::fs::metadata(path).map_err(|e| {
            TrackshiftError::decode_error(path, format!("Failed to read file metadata: {}", e))
        })?;

        if metadata.len() > MAX_FILE_SIZE {
            return Err(TrackshiftError::decode_error(
                path,
                format!(
                    "File too large ({:.1} GB). Maximum supported size is 2 GB.",
                    metadata.len() as f64 / (1024.0 * 1024.0 * 1024.0)
                ),
            ));
        }

        let file = std::fs::File::open(path).map_err(|e| {
            TrackshiftError::decode_error(path, format!("Failed to open file: {}", e))
        })?;

        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        // Provide a hint based on file extension
        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        // Probe the media source
        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| {
                TrackshiftError::decode_error(path, format!("Failed to probe format: {}", e))
            })?;

        let mut format = probed.format;

        // Find the first audio track
        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
            .ok_or_else(|| {
                TrackshiftError::decode_error(path, "No audio tracks found".to_string())
            })?;

        let track_id = track.id;
        let codec_params = track.codec_params.clone();

        // The native rate is required; guessing one here would silently
        // break every duration and frequency computation downstream
        let sample_rate = codec_params.sample_rate.ok_or_else(|| {
            TrackshiftError::decode_error(path, "Source reports no sample rate".to_string())
        })?;
        let channels = codec_params.channels.map(|c| c.count()).unwrap_or(2);

        debug!(
            "Decoding: {} @ {}Hz, {} channels",
            path.display(),
            sample_rate,
            channels
        );

        // Create decoder
        let mut decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| {
                TrackshiftError::decode_error(path, format!("Failed to create decoder: {}", e))
            })?;

        // Collect all samples
        let mut all_samples: Vec<f32> = Vec::new();

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(symphonia::core::errors::Error::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break; // End of stream
                }
                Err(e) => {
                    return Err(TrackshiftError::decode_error(
                        path,
                        format!("Failed to read packet: {}", e),
                    ));
                }
            };

            // Skip packets from other tracks
            if packet.track_id() != track_id {
                continue;
            }

            // Decode packet
            let decoded = match decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(symphonia::core::errors::Error::DecodeError(e)) => {
                    // Skip corrupted frames
                    trace!("Skipping corrupted frame: {}", e);
                    continue;
                }
                Err(e) => {
                    return Err(TrackshiftError::decode_error(
                        path,
                        format!("Decode error: {}", e),
                    ));
                }
            };

            // Convert to f32 samples
            let spec = *decoded.spec();
            let num_frames = decoded.frames();

            let mut sample_buf = SampleBuffer::<f32>::new(num_frames as u64, spec);
            sample_buf.copy_interleaved_ref(decoded);
            let samples = sample_buf.samples();

            // Convert to mono by averaging channels
            all_samples.extend(to_mono(samples, channels));
        }

        if all_samples.is_empty() {
            return Err(TrackshiftError::decode_error(
                path,
                "File contains no decodable audio".to_string(),
            ));
        }

        debug!(
            "Decoded {} samples ({:.2}s)",
            all_samples.len(),
            all_samples.len() as f64 / sample_rate as f64
        );

        Ok(AudioBuffer::new(all_samples, sample_rate))
    }

    fn name(&self) -> &'static str {
        "symphonia"
    }
}

/// Convert interleaved multi-channel audio to mono
fn to_mono(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels == 1 {
        return samples.to_vec();
    }

    samples
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}
