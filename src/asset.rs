//! The audio asset state machine
//!
//! An [`AudioAsset`] owns one decoded track and moves through
//! {unloaded → loaded → analyzed/transformed → exported}. Operations that
//! need samples lazily satisfy their own precondition by reloading from the
//! last known path instead of failing. Pitch and tempo analyses are
//! memoized per buffer; every operation that replaces the buffer clears
//! both caches, so a cached feature can never outlive the samples it was
//! computed from.
//!
//! Edits are non-destructive until exported: transforms only rewrite the
//! in-memory buffer, and the source file is never touched.
//!
//! The asset is synchronous and not internally synchronized; callers
//! serialize access to an instance (or give each instance a single owner).

use crate::analysis::{FeatureExtractor, SpectralExtractor};
use crate::codec::{AudioDecoder, AudioEncoder, SymphoniaDecoder, WavEncoder};
use crate::effects::{PhaseVocoderEngine, TimePitchEngine};
use crate::error::{Result, TrackshiftError};
use crate::types::{AudioBuffer, PitchContour, TempoEstimate};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// A single audio track with lazy analysis and in-memory editing
pub struct AudioAsset {
    /// Last path used to (re)load samples
    source_path: Option<PathBuf>,
    /// Decoded samples + sample rate; one Option keeps the pair atomic
    buffer: Option<AudioBuffer>,
    /// Memoized pitch analysis for the current buffer
    cached_pitch: Option<PitchContour>,
    /// Memoized tempo analysis for the current buffer, independent of pitch
    cached_tempo: Option<TempoEstimate>,

    decoder: Arc<dyn AudioDecoder>,
    extractor: Arc<dyn FeatureExtractor>,
    engine: Arc<dyn TimePitchEngine>,
    encoder: Arc<dyn AudioEncoder>,
}

impl AudioAsset {
    /// Start building an asset; collaborators default to the shipped backends
    pub fn builder() -> AssetBuilder {
        AssetBuilder::default()
    }

    /// Load (or reload) samples from a file
    ///
    /// On success the buffer and `source_path` are replaced and both
    /// feature caches are cleared. On failure the asset is left exactly as
    /// it was: a decode error must not corrupt a previously valid asset.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(TrackshiftError::InvalidArgument(
                "Load path must not be empty".to_string(),
            ));
        }

        // Decode fully before touching any state
        let buffer = self.decoder.decode(path)?;

        info!(
            "Loaded {} ({:.2}s @ {}Hz, {} decoder)",
            path.display(),
            buffer.duration,
            buffer.sample_rate,
            self.decoder.name()
        );

        self.buffer = Some(buffer);
        self.source_path = Some(path.to_path_buf());
        self.invalidate_features();
        Ok(())
    }

    /// Drop the in-memory samples and both caches, keeping `source_path`
    ///
    /// Any later operation that needs samples reloads them lazily.
    pub fn unload(&mut self) {
        debug!("Dropping in-memory samples");
        self.buffer = None;
        self.invalidate_features();
    }

    /// Pitch contour of the current buffer, computed at most once per buffer
    pub fn pitch(&mut self) -> Result<&PitchContour> {
        self.ensure_loaded()?;
        if self.cached_pitch.is_none() {
            let buffer = self.buffer.as_ref().ok_or(TrackshiftError::NotLoaded)?;
            debug!("Computing pitch with {} extractor", self.extractor.name());
            let contour = self.extractor.pitch(buffer)?;
            self.cached_pitch = Some(contour);
        }
        self.cached_pitch.as_ref().ok_or(TrackshiftError::NotLoaded)
    }

    /// Tempo of the current buffer, computed at most once per buffer
    pub fn tempo(&mut self) -> Result<TempoEstimate> {
        self.ensure_loaded()?;
        if let Some(estimate) = self.cached_tempo {
            return Ok(estimate);
        }
        let buffer = self.buffer.as_ref().ok_or(TrackshiftError::NotLoaded)?;
        debug!("Computing tempo with {} extractor", self.extractor.name());
        let estimate = self.extractor.tempo(buffer)?;
        self.cached_tempo = Some(estimate);
        Ok(estimate)
    }

    /// Time-stretch the track by `factor`
    ///
    /// `1.0` = no change, `>1.0` = faster, `<1.0` = slower. The sample rate
    /// is unchanged; both feature caches are cleared because they described
    /// the old buffer.
    pub fn change_tempo(&mut self, factor: f64) -> Result<()> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(TrackshiftError::InvalidArgument(format!(
                "Tempo factor must be positive, got {}",
                factor
            )));
        }
        self.ensure_loaded()?;

        let buffer = self.buffer.as_ref().ok_or(TrackshiftError::NotLoaded)?;
        let samples = self.engine.time_stretch(buffer, factor)?;
        let sample_rate = buffer.sample_rate;

        info!(
            "Changed tempo by {:.3}x: {} -> {} samples",
            factor,
            buffer.len(),
            samples.len()
        );

        self.buffer = Some(AudioBuffer::new(samples, sample_rate));
        self.invalidate_features();
        Ok(())
    }

    /// Shift the track's pitch by a signed number of semitones
    ///
    /// `0.0` is a legal no-op; the cache-invalidation rule still applies
    /// uniformly. Duration and sample rate are unchanged.
    pub fn change_pitch(&mut self, semitones: f64) -> Result<()> {
        if !semitones.is_finite() {
            return Err(TrackshiftError::InvalidArgument(format!(
                "Semitone shift must be finite, got {}",
                semitones
            )));
        }
        self.ensure_loaded()?;

        let buffer = self.buffer.as_ref().ok_or(TrackshiftError::NotLoaded)?;
        let samples = self.engine.pitch_shift(buffer, semitones)?;
        let sample_rate = buffer.sample_rate;

        info!("Shifted pitch by {:+.2} semitones", semitones);

        self.buffer = Some(AudioBuffer::new(samples, sample_rate));
        self.invalidate_features();
        Ok(())
    }

    /// Persist the current in-memory buffer as 32-bit float audio
    ///
    /// Export never reloads: it writes exactly what is in memory, or fails
    /// with [`TrackshiftError::NothingToExport`] when nothing is. The
    /// asset's own state is untouched either way.
    pub fn export_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let buffer = self.buffer.as_ref().ok_or(TrackshiftError::NothingToExport)?;

        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(TrackshiftError::InvalidArgument(
                "Export path must not be empty".to_string(),
            ));
        }

        self.encoder.encode(buffer, path)?;

        info!(
            "Exported {:.2}s @ {}Hz to {}",
            buffer.duration,
            buffer.sample_rate,
            path.display()
        );
        Ok(())
    }

    /// Last path used to (re)load samples
    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    /// Whether samples are currently in memory
    pub fn is_loaded(&self) -> bool {
        self.buffer.is_some()
    }

    /// Sample rate of the loaded buffer, if any
    pub fn sample_rate(&self) -> Option<u32> {
        self.buffer.as_ref().map(|b| b.sample_rate)
    }

    /// Samples of the loaded buffer, if any
    pub fn samples(&self) -> Option<&[f32]> {
        self.buffer.as_ref().map(|b| b.samples.as_slice())
    }

    /// Duration in seconds of the loaded buffer, if any
    pub fn duration(&self) -> Option<f64> {
        self.buffer.as_ref().map(|b| b.duration)
    }

    /// Reload from `source_path` if no samples are in memory
    fn ensure_loaded(&mut self) -> Result<()> {
        if self.buffer.is_some() {
            return Ok(());
        }
        match self.source_path.clone() {
            Some(path) => {
                debug!("Lazily reloading from {}", path.display());
                self.load(path)
            }
            None => Err(TrackshiftError::NotLoaded),
        }
    }

    fn invalidate_features(&mut self) {
        self.cached_pitch = None;
        self.cached_tempo = None;
    }
}

/// Builder wiring an [`AudioAsset`]'s collaborators
///
/// Every collaborator defaults to the shipped backend, so
/// `AudioAsset::builder().open(path)` is the common case and tests swap in
/// fakes selectively.
#[derive(Default)]
pub struct AssetBuilder {
    decoder: Option<Arc<dyn AudioDecoder>>,
    extractor: Option<Arc<dyn FeatureExtractor>>,
    engine: Option<Arc<dyn TimePitchEngine>>,
    encoder: Option<Arc<dyn AudioEncoder>>,
}

impl AssetBuilder {
    pub fn decoder(mut self, decoder: Arc<dyn AudioDecoder>) -> Self {
        self.decoder = Some(decoder);
        self
    }

    pub fn extractor(mut self, extractor: Arc<dyn FeatureExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn engine(mut self, engine: Arc<dyn TimePitchEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn encoder(mut self, encoder: Arc<dyn AudioEncoder>) -> Self {
        self.encoder = Some(encoder);
        self
    }

    /// Finish building an unloaded asset
    pub fn build(self) -> AudioAsset {
        AudioAsset {
            source_path: None,
            buffer: None,
            cached_pitch: None,
            cached_tempo: None,
            decoder: self
                .decoder
                .unwrap_or_else(|| Arc::new(SymphoniaDecoder::new())),
            extractor: self
                .extractor
                .unwrap_or_else(|| Arc::new(SpectralExtractor::new())),
            engine: self
                .engine
                .unwrap_or_else(|| Arc::new(PhaseVocoderEngine::new())),
            encoder: self.encoder.unwrap_or_else(|| Arc::new(WavEncoder::new())),
        }
    }

    /// Finish building and eagerly load from `path`
    ///
    /// Load failures propagate: supplying a path never yields a silently
    /// unloaded asset.
    pub fn open(self, path: impl AsRef<Path>) -> Result<AudioAsset> {
        let mut asset = self.build();
        asset.load(path)?;
        Ok(asset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const MOCK_RATE: u32 = 8000;

    /// Decoder yielding one second of constant samples; any path whose file
    /// name starts with "bad" fails to decode
    struct MockDecoder {
        calls: AtomicUsize,
    }

    impl MockDecoder {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl AudioDecoder for MockDecoder {
        fn decode(&self, path: &Path) -> Result<AudioBuffer> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let is_bad = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("bad"));
            if is_bad {
                return Err(TrackshiftError::decode_error(path, "mock decode failure"));
            }
            Ok(AudioBuffer::new(vec![0.25; MOCK_RATE as usize], MOCK_RATE))
        }

        fn name(&self) -> &'static str {
            "mock"
        }
    }

    struct CountingExtractor {
        pitch_calls: AtomicUsize,
        tempo_calls: AtomicUsize,
    }

    impl CountingExtractor {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                pitch_calls: AtomicUsize::new(0),
                tempo_calls: AtomicUsize::new(0),
            })
        }

        fn pitch_calls(&self) -> usize {
            self.pitch_calls.load(Ordering::SeqCst)
        }

        fn tempo_calls(&self) -> usize {
            self.tempo_calls.load(Ordering::SeqCst)
        }
    }

    impl FeatureExtractor for CountingExtractor {
        fn pitch(&self, buffer: &AudioBuffer) -> Result<PitchContour> {
            self.pitch_calls.fetch_add(1, Ordering::SeqCst);
            Ok(PitchContour {
                frequencies: vec![440.0; 4],
                hop_size: 256,
                sample_rate: buffer.sample_rate,
            })
        }

        fn tempo(&self, _buffer: &AudioBuffer) -> Result<TempoEstimate> {
            self.tempo_calls.fetch_add(1, Ordering::SeqCst);
            Ok(TempoEstimate {
                bpm: 120.0,
                confidence: 0.9,
            })
        }

        fn name(&self) -> &'static str {
            "counting"
        }
    }

    /// Engine that drops every other sample on stretch and negates on shift
    struct ToyEngine;

    impl TimePitchEngine for ToyEngine {
        fn time_stretch(&self, buffer: &AudioBuffer, _rate: f64) -> Result<Vec<f32>> {
            Ok(buffer.samples.iter().copied().step_by(2).collect())
        }

        fn pitch_shift(&self, buffer: &AudioBuffer, _semitones: f64) -> Result<Vec<f32>> {
            Ok(buffer.samples.iter().map(|s| -s).collect())
        }

        fn name(&self) -> &'static str {
            "toy"
        }
    }

    struct FailingEngine;

    impl TimePitchEngine for FailingEngine {
        fn time_stretch(&self, _buffer: &AudioBuffer, _rate: f64) -> Result<Vec<f32>> {
            Err(TrackshiftError::processing_error("mock engine failure"))
        }

        fn pitch_shift(&self, _buffer: &AudioBuffer, _semitones: f64) -> Result<Vec<f32>> {
            Err(TrackshiftError::processing_error("mock engine failure"))
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    struct CountingEncoder {
        calls: AtomicUsize,
    }

    impl CountingEncoder {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl AudioEncoder for CountingEncoder {
        fn encode(&self, _buffer: &AudioBuffer, _path: &Path) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn name(&self) -> &'static str {
            "counting"
        }
    }

    fn mock_builder(
        decoder: &Arc<MockDecoder>,
        extractor: &Arc<CountingExtractor>,
        encoder: &Arc<CountingEncoder>,
    ) -> AssetBuilder {
        AudioAsset::builder()
            .decoder(decoder.clone())
            .extractor(extractor.clone())
            .engine(Arc::new(ToyEngine))
            .encoder(encoder.clone())
    }

    #[test]
    fn test_feature_access_without_source_fails() {
        let (decoder, extractor, encoder) =
            (MockDecoder::new(), CountingExtractor::new(), CountingEncoder::new());
        let mut asset = mock_builder(&decoder, &extractor, &encoder).build();

        assert!(matches!(asset.tempo(), Err(TrackshiftError::NotLoaded)));
        assert!(matches!(asset.pitch(), Err(TrackshiftError::NotLoaded)));
        assert_eq!(decoder.calls(), 0);
    }

    #[test]
    fn test_load_empty_path_is_invalid_argument() {
        let (decoder, extractor, encoder) =
            (MockDecoder::new(), CountingExtractor::new(), CountingEncoder::new());
        let mut asset = mock_builder(&decoder, &extractor, &encoder).build();

        assert!(matches!(
            asset.load(""),
            Err(TrackshiftError::InvalidArgument(_))
        ));
        assert_eq!(decoder.calls(), 0);
    }

    #[test]
    fn test_open_eagerly_loads() {
        let (decoder, extractor, encoder) =
            (MockDecoder::new(), CountingExtractor::new(), CountingEncoder::new());
        let asset = mock_builder(&decoder, &extractor, &encoder)
            .open("a.wav")
            .unwrap();

        assert!(asset.is_loaded());
        assert_eq!(asset.sample_rate(), Some(MOCK_RATE));
        assert_eq!(asset.source_path(), Some(Path::new("a.wav")));
        assert_eq!(decoder.calls(), 1);
    }

    #[test]
    fn test_open_propagates_decode_failure() {
        let (decoder, extractor, encoder) =
            (MockDecoder::new(), CountingExtractor::new(), CountingEncoder::new());
        let result = mock_builder(&decoder, &extractor, &encoder).open("bad.wav");

        assert!(matches!(result, Err(TrackshiftError::DecodeError { .. })));
    }

    #[test]
    fn test_pitch_is_memoized() {
        let (decoder, extractor, encoder) =
            (MockDecoder::new(), CountingExtractor::new(), CountingEncoder::new());
        let mut asset = mock_builder(&decoder, &extractor, &encoder)
            .open("a.wav")
            .unwrap();

        let first = asset.pitch().unwrap().clone();
        let second = asset.pitch().unwrap().clone();

        assert_eq!(first, second);
        assert_eq!(extractor.pitch_calls(), 1);
    }

    #[test]
    fn test_pitch_and_tempo_caches_are_independent() {
        let (decoder, extractor, encoder) =
            (MockDecoder::new(), CountingExtractor::new(), CountingEncoder::new());
        let mut asset = mock_builder(&decoder, &extractor, &encoder)
            .open("a.wav")
            .unwrap();

        // Computing tempo must not populate or disturb the pitch cache
        asset.tempo().unwrap();
        assert_eq!(extractor.tempo_calls(), 1);
        assert_eq!(extractor.pitch_calls(), 0);

        asset.pitch().unwrap();
        assert_eq!(extractor.pitch_calls(), 1);

        // And computing pitch must not evict the tempo cache
        asset.tempo().unwrap();
        assert_eq!(extractor.tempo_calls(), 1);
    }

    #[test]
    fn test_change_tempo_invalidates_both_caches() {
        let (decoder, extractor, encoder) =
            (MockDecoder::new(), CountingExtractor::new(), CountingEncoder::new());
        let mut asset = mock_builder(&decoder, &extractor, &encoder)
            .open("a.wav")
            .unwrap();

        asset.pitch().unwrap();
        asset.tempo().unwrap();
        asset.change_tempo(1.5).unwrap();
        asset.pitch().unwrap();
        asset.tempo().unwrap();

        assert_eq!(extractor.pitch_calls(), 2);
        assert_eq!(extractor.tempo_calls(), 2);
    }

    #[test]
    fn test_change_pitch_invalidates_tempo_cache() {
        let (decoder, extractor, encoder) =
            (MockDecoder::new(), CountingExtractor::new(), CountingEncoder::new());
        let mut asset = mock_builder(&decoder, &extractor, &encoder)
            .open("a.wav")
            .unwrap();

        asset.tempo().unwrap();
        asset.change_pitch(2.0).unwrap();
        asset.tempo().unwrap();

        assert_eq!(extractor.tempo_calls(), 2);
    }

    #[test]
    fn test_change_tempo_rejects_bad_factor() {
        let (decoder, extractor, encoder) =
            (MockDecoder::new(), CountingExtractor::new(), CountingEncoder::new());
        let mut asset = mock_builder(&decoder, &extractor, &encoder)
            .open("a.wav")
            .unwrap();

        asset.pitch().unwrap();
        let before = asset.samples().unwrap().to_vec();

        for factor in [0.0, -2.0, f64::NAN] {
            assert!(matches!(
                asset.change_tempo(factor),
                Err(TrackshiftError::InvalidArgument(_))
            ));
        }

        // Buffer and caches untouched by the rejected calls
        assert_eq!(asset.samples().unwrap(), before.as_slice());
        asset.pitch().unwrap();
        assert_eq!(extractor.pitch_calls(), 1);
    }

    #[test]
    fn test_engine_failure_leaves_state_unchanged() {
        let (decoder, extractor, encoder) =
            (MockDecoder::new(), CountingExtractor::new(), CountingEncoder::new());
        let mut asset = AudioAsset::builder()
            .decoder(decoder.clone())
            .extractor(extractor.clone())
            .engine(Arc::new(FailingEngine))
            .encoder(encoder.clone())
            .open("a.wav")
            .unwrap();

        asset.pitch().unwrap();
        let before = asset.samples().unwrap().to_vec();

        assert!(matches!(
            asset.change_tempo(2.0),
            Err(TrackshiftError::ProcessingError { .. })
        ));

        assert_eq!(asset.samples().unwrap(), before.as_slice());
        asset.pitch().unwrap();
        assert_eq!(extractor.pitch_calls(), 1);
    }

    #[test]
    fn test_failed_reload_preserves_previous_buffer() {
        let (decoder, extractor, encoder) =
            (MockDecoder::new(), CountingExtractor::new(), CountingEncoder::new());
        let mut asset = mock_builder(&decoder, &extractor, &encoder)
            .open("a.wav")
            .unwrap();

        let before = asset.samples().unwrap().to_vec();

        assert!(matches!(
            asset.load("bad.wav"),
            Err(TrackshiftError::DecodeError { .. })
        ));

        // No partial replacement: buffer and remembered path are intact
        assert_eq!(asset.samples().unwrap(), before.as_slice());
        assert_eq!(asset.source_path(), Some(Path::new("a.wav")));
    }

    #[test]
    fn test_transform_replaces_samples_keeps_rate() {
        let (decoder, extractor, encoder) =
            (MockDecoder::new(), CountingExtractor::new(), CountingEncoder::new());
        let mut asset = mock_builder(&decoder, &extractor, &encoder)
            .open("a.wav")
            .unwrap();

        asset.change_tempo(2.0).unwrap();

        assert_eq!(asset.samples().unwrap().len(), MOCK_RATE as usize / 2);
        assert_eq!(asset.sample_rate(), Some(MOCK_RATE));
    }

    #[test]
    fn test_export_without_buffer_fails() {
        let (decoder, extractor, encoder) =
            (MockDecoder::new(), CountingExtractor::new(), CountingEncoder::new());
        let asset = mock_builder(&decoder, &extractor, &encoder).build();

        assert!(matches!(
            asset.export_to("out.wav"),
            Err(TrackshiftError::NothingToExport)
        ));
        assert_eq!(encoder.calls(), 0);
    }

    #[test]
    fn test_export_empty_path_is_invalid_argument() {
        let (decoder, extractor, encoder) =
            (MockDecoder::new(), CountingExtractor::new(), CountingEncoder::new());
        let asset = mock_builder(&decoder, &extractor, &encoder)
            .open("a.wav")
            .unwrap();

        assert!(matches!(
            asset.export_to(""),
            Err(TrackshiftError::InvalidArgument(_))
        ));
        assert_eq!(encoder.calls(), 0);
    }

    #[test]
    fn test_export_never_lazily_reloads() {
        let (decoder, extractor, encoder) =
            (MockDecoder::new(), CountingExtractor::new(), CountingEncoder::new());
        let mut asset = mock_builder(&decoder, &extractor, &encoder)
            .open("a.wav")
            .unwrap();

        asset.unload();

        assert!(matches!(
            asset.export_to("out.wav"),
            Err(TrackshiftError::NothingToExport)
        ));
        assert_eq!(decoder.calls(), 1);
        assert_eq!(encoder.calls(), 0);
    }

    #[test]
    fn test_unloaded_asset_recovers_through_lazy_reload() {
        let (decoder, extractor, encoder) =
            (MockDecoder::new(), CountingExtractor::new(), CountingEncoder::new());
        let mut asset = mock_builder(&decoder, &extractor, &encoder)
            .open("a.wav")
            .unwrap();

        asset.unload();
        assert!(!asset.is_loaded());

        asset.pitch().unwrap();
        assert!(asset.is_loaded());
        assert_eq!(decoder.calls(), 2);
    }

    #[test]
    fn test_export_writes_through_encoder() {
        let (decoder, extractor, encoder) =
            (MockDecoder::new(), CountingExtractor::new(), CountingEncoder::new());
        let asset = mock_builder(&decoder, &extractor, &encoder)
            .open("a.wav")
            .unwrap();

        asset.export_to("out.wav").unwrap();
        assert_eq!(encoder.calls(), 1);
        // Export leaves the asset loaded and reusable
        assert!(asset.is_loaded());
    }
}
