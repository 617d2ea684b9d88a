//! Spectral feature-extraction backend
//!
//! Pitch contour comes from the STFT peak tracker in [`crate::analysis::pitch`];
//! tempo comes from stratum-dsp's autocorrelation + comb filterbank analysis.

use crate::analysis::pitch;
use crate::analysis::traits::FeatureExtractor;
use crate::error::{Result, TrackshiftError};
use crate::types::{AudioBuffer, PitchContour, TempoEstimate};
use stratum_dsp::{analyze_audio, AnalysisConfig};
use tracing::debug;

/// Minimum audio duration in seconds required for reliable tempo analysis.
/// stratum-dsp needs at least 3-5 seconds of material.
const MIN_TEMPO_DURATION_SECS: f64 = 3.0;

/// Feature extractor combining STFT pitch tracking with stratum-dsp tempo
pub struct SpectralExtractor;

impl SpectralExtractor {
    pub fn new() -> Self {
        Self
    }

    fn check_buffer(buffer: &AudioBuffer) -> Result<()> {
        if buffer.is_empty() || buffer.sample_rate == 0 {
            return Err(TrackshiftError::analysis_error("No audio to analyze"));
        }
        Ok(())
    }
}

impl Default for SpectralExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureExtractor for SpectralExtractor {
    fn pitch(&self, buffer: &AudioBuffer) -> Result<PitchContour> {
        Self::check_buffer(buffer)?;

        debug!(
            "Tracking pitch ({} samples, {}Hz)",
            buffer.len(),
            buffer.sample_rate
        );

        let contour = pitch::track_contour(buffer);

        debug!(
            "Pitch contour: {} frames, median {:?} Hz",
            contour.len(),
            contour.median_frequency()
        );

        Ok(contour)
    }

    fn tempo(&self, buffer: &AudioBuffer) -> Result<TempoEstimate> {
        Self::check_buffer(buffer)?;

        if buffer.duration < MIN_TEMPO_DURATION_SECS {
            return Err(TrackshiftError::analysis_error(format!(
                "Audio too short ({:.1}s). Minimum {:.0}s required for reliable tempo analysis.",
                buffer.duration, MIN_TEMPO_DURATION_SECS
            )));
        }

        debug!(
            "Analyzing tempo with stratum-dsp ({} samples, {}Hz)",
            buffer.len(),
            buffer.sample_rate
        );

        let config = AnalysisConfig::default();

        let result = analyze_audio(&buffer.samples, buffer.sample_rate, config).map_err(|e| {
            TrackshiftError::analysis_error(format!("Tempo analysis failed: {}", e))
        })?;

        let estimate = TempoEstimate {
            bpm: result.bpm as f64,
            confidence: result.bpm_confidence as f64,
        };

        debug!(
            "Detected tempo: {:.2} BPM (confidence: {:.2})",
            estimate.bpm, estimate.confidence
        );

        Ok(estimate)
    }

    fn name(&self) -> &'static str {
        "spectral"
    }
}
