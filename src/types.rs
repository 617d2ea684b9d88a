//! Core data types for trackshift
//!
//! These types represent the domain model: decoded audio and the musical
//! features derived from it.

use serde::{Deserialize, Serialize};

// =============================================================================
// Audio buffer
// =============================================================================

/// Decoded audio samples ready for analysis and editing
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Mono samples normalized to [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Sample rate in Hz, as reported by the source (never resampled)
    pub sample_rate: u32,
    /// Duration in seconds
    pub duration: f64,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        // Guard against division by zero - use 0 duration for invalid sample rate
        let duration = if sample_rate > 0 {
            samples.len() as f64 / sample_rate as f64
        } else {
            0.0
        };
        Self {
            samples,
            sample_rate,
            duration,
        }
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

// =============================================================================
// Analysis results
// =============================================================================

/// Per-frame pitch contour
///
/// One fundamental-frequency estimate per analysis frame; 0.0 marks a frame
/// with no detectable pitch (silence or noise).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PitchContour {
    /// Estimated f0 per frame, in Hz (0.0 = unvoiced)
    pub frequencies: Vec<f32>,
    /// Hop between frame starts, in samples
    pub hop_size: usize,
    /// Sample rate of the buffer the contour was computed from
    pub sample_rate: u32,
}

impl PitchContour {
    /// Number of frames
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    /// Check if the contour has no frames
    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Start time of a frame, in seconds
    pub fn time_of_frame(&self, frame: usize) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        (frame * self.hop_size) as f64 / self.sample_rate as f64
    }

    /// Median frequency over voiced frames, or None if every frame is unvoiced
    pub fn median_frequency(&self) -> Option<f32> {
        let mut voiced: Vec<f32> = self
            .frequencies
            .iter()
            .copied()
            .filter(|&f| f > 0.0)
            .collect();
        if voiced.is_empty() {
            return None;
        }
        voiced.sort_by(|a, b| a.total_cmp(b));
        Some(voiced[voiced.len() / 2])
    }
}

/// Tempo analysis result
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempoEstimate {
    /// Estimated beats per minute
    pub bpm: f64,
    /// Confidence score (0.0 - 1.0)
    pub confidence: f64,
}

// =============================================================================
// Analysis report (CLI output)
// =============================================================================

/// JSON-friendly snapshot of a track's analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Source file path
    pub path: String,
    /// Duration in seconds
    pub duration_seconds: f64,
    /// Sample rate of source file
    pub sample_rate: u32,
    /// Tempo analysis
    pub tempo: TempoEstimate,
    /// Pitch summary
    pub pitch: PitchSummary,
}

/// Condensed pitch information for the report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PitchSummary {
    /// Number of analysis frames
    pub frames: usize,
    /// Number of frames with a detectable pitch
    pub voiced_frames: usize,
    /// Median f0 over voiced frames, in Hz
    #[serde(skip_serializing_if = "Option::is_none")]
    pub median_hz: Option<f32>,
}

impl PitchSummary {
    pub fn from_contour(contour: &PitchContour) -> Self {
        Self {
            frames: contour.len(),
            voiced_frames: contour.frequencies.iter().filter(|&&f| f > 0.0).count(),
            median_hz: contour.median_frequency(),
        }
    }
}
