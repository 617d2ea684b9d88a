//! Audio decoding and encoding
//!
//! The trait seams let the asset be tested with fakes instead of real audio
//! files; the shipped backends use symphonia (decode) and hound (encode).

pub mod decoder;
pub mod encoder;

use crate::error::Result;
use crate::types::AudioBuffer;
use std::path::Path;

pub use decoder::SymphoniaDecoder;
pub use encoder::WavEncoder;

/// Audio decoding backend
pub trait AudioDecoder: Send + Sync {
    /// Decode a file to mono samples at the source's native sample rate
    ///
    /// Implementations must not resample: the buffer's rate has to reflect
    /// the source file exactly.
    fn decode(&self, path: &Path) -> Result<AudioBuffer>;

    /// Get the name of this decoder (for logging)
    fn name(&self) -> &'static str;
}

/// Audio encoding backend
pub trait AudioEncoder: Send + Sync {
    /// Persist samples to a file at the buffer's sample rate
    ///
    /// Output uses a fixed high-precision sample format (32-bit float)
    /// regardless of what the source file used.
    fn encode(&self, buffer: &AudioBuffer, path: &Path) -> Result<()>;

    /// Get the name of this encoder (for logging)
    fn name(&self) -> &'static str;
}
