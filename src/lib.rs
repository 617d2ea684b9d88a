//! trackshift - Pitch & Tempo Editing for Single Audio Tracks
//!
//! Models one audio file as a mutable, lazily-analyzed asset: load a
//! waveform once, derive musical features (pitch contour, tempo) on demand,
//! apply time-stretch / pitch-shift edits, and persist the result as 32-bit
//! float WAV. Edits are non-destructive until exported.
//!
//! # Architecture
//!
//! The library is organized into several key modules:
//!
//! - `asset`: the audio-asset state machine (load / analyze / edit / export)
//! - `codec`: audio decoding (symphonia) and encoding (hound)
//! - `analysis`: pitch and tempo extraction (with swappable backends)
//! - `effects`: time-stretch and pitch-shift (phase vocoder)
//! - `config`: CLI argument parsing and runtime settings
//! - `job`: single-run orchestration for the CLI
//!
//! # Example
//!
//! ```no_run
//! use trackshift::AudioAsset;
//!
//! let mut asset = AudioAsset::builder().open("track.mp3").expect("load failed");
//! let tempo = asset.tempo().expect("analysis failed");
//! println!("{:.1} BPM", tempo.bpm);
//!
//! asset.change_tempo(1.1).expect("stretch failed");
//! asset.export_to("track_faster.wav").expect("export failed");
//! ```

pub mod analysis;
pub mod asset;
pub mod codec;
pub mod config;
pub mod dsp;
pub mod effects;
pub mod error;
pub mod job;
pub mod types;

// Re-export key types at crate root
pub use asset::{AssetBuilder, AudioAsset};
pub use error::{Result, TrackshiftError};
pub use types::{AudioBuffer, PitchContour, TempoEstimate};
