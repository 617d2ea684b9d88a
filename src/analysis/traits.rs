//! Feature-extraction trait abstraction

use crate::error::Result;
use crate::types::{AudioBuffer, PitchContour, TempoEstimate};

/// Pitch and tempo analysis backend
///
/// Implementations are pure with respect to the asset: they read the buffer
/// and share no state with it, so results can be memoized per buffer.
pub trait FeatureExtractor: Send + Sync {
    /// Estimate the per-frame pitch contour
    fn pitch(&self, buffer: &AudioBuffer) -> Result<PitchContour>;

    /// Estimate the overall tempo
    fn tempo(&self, buffer: &AudioBuffer) -> Result<TempoEstimate>;

    /// Get the name of this extractor (for logging)
    fn name(&self) -> &'static str;
}
