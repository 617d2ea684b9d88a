//! WAV encoding using hound
//!
//! Always writes mono 32-bit float WAV at the buffer's sample rate,
//! regardless of what format the source file used. Higher precision than
//! most sources, so repeated edit/export cycles don't accumulate
//! quantization loss.

use crate::codec::AudioEncoder;
use crate::error::{Result, TrackshiftError};
use crate::types::AudioBuffer;
use std::path::Path;
use tracing::debug;

/// Encoder backend writing 32-bit float WAV via hound
pub struct WavEncoder;

impl WavEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WavEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioEncoder for WavEncoder {
    fn encode(&self, buffer: &AudioBuffer, path: &Path) -> Result<()> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: buffer.sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };

        let mut writer = hound::WavWriter::create(path, spec).map_err(|e| {
            TrackshiftError::encode_error(path, format!("Failed to create output file: {}", e))
        })?;

        for &sample in &buffer.samples {
            writer.write_sample(sample).map_err(|e| {
                TrackshiftError::encode_error(path, format!("Failed to write sample: {}", e))
            })?;
        }

        writer.finalize().map_err(|e| {
            TrackshiftError::encode_error(path, format!("Failed to finalize file: {}", e))
        })?;

        debug!(
            "Wrote {} samples @ {}Hz to {}",
            buffer.len(),
            buffer.sample_rate,
            path.display()
        );

        Ok(())
    }

    fn name(&self) -> &'static str {
        "hound"
    }
}
