//! Time-stretch and pitch-shift processing
//!
//! The trait seam keeps the asset ignorant of how transforms are computed;
//! the shipped backend is a phase vocoder.

pub mod phase_vocoder;

use crate::error::Result;
use crate::types::AudioBuffer;

pub use phase_vocoder::PhaseVocoderEngine;

/// Time-stretch / pitch-shift backend
///
/// Both operations return a bare sample vector; the caller pairs it with
/// the previous sample rate, which these transforms never change.
pub trait TimePitchEngine: Send + Sync {
    /// Stretch playback time by `rate` without changing pitch
    ///
    /// `1.0` = no change, `>1.0` = faster (shorter), `<1.0` = slower (longer).
    fn time_stretch(&self, buffer: &AudioBuffer, rate: f64) -> Result<Vec<f32>>;

    /// Shift pitch by a signed number of semitones without changing duration
    fn pitch_shift(&self, buffer: &AudioBuffer, semitones: f64) -> Result<Vec<f32>>;

    /// Get the name of this engine (for logging)
    fn name(&self) -> &'static str;
}
