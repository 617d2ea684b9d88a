//! Single-track run orchestration
//!
//! Drives an [`AudioAsset`](crate::asset::AudioAsset) through one CLI
//! invocation: load, analyze (when asked), apply edits, export, and write
//! the optional JSON report.

use crate::asset::AudioAsset;
use crate::config::Settings;
use crate::error::{Result, TrackshiftError};
use crate::types::{AnalysisReport, PitchSummary, TempoEstimate};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Run result summary
#[derive(Debug)]
pub struct JobSummary {
    pub input: PathBuf,
    pub input_duration: f64,
    pub sample_rate: u32,
    pub tempo: Option<TempoEstimate>,
    pub pitch: Option<PitchSummary>,
    pub output: Option<PathBuf>,
    pub output_duration: Option<f64>,
}

/// Run a full trackshift job
pub fn run(settings: &Settings) -> Result<JobSummary> {
    let mut asset = AudioAsset::builder().open(&settings.input)?;

    let input_duration = asset.duration().unwrap_or(0.0);
    let sample_rate = asset.sample_rate().unwrap_or(0);

    // Analysis happens before any edit so the report describes the source
    let mut tempo = None;
    let mut pitch = None;
    if settings.wants_analysis() {
        let estimate = asset.tempo()?;
        let summary = PitchSummary::from_contour(asset.pitch()?);

        let report = AnalysisReport {
            path: settings.input.to_string_lossy().to_string(),
            duration_seconds: input_duration,
            sample_rate,
            tempo: estimate,
            pitch: summary.clone(),
        };

        if settings.print_json {
            let json = serde_json::to_string_pretty(&report)
                .map_err(|e| TrackshiftError::Io(std::io::Error::other(e)))?;
            println!("{}", json);
        }

        if let Some(path) = &settings.report {
            write_report(&report, path)?;
        }

        tempo = Some(estimate);
        pitch = Some(summary);
    }

    if let Some(factor) = settings.tempo {
        asset.change_tempo(factor)?;
    }

    if let Some(semitones) = settings.pitch {
        asset.change_pitch(semitones)?;
    }

    let mut output_duration = None;
    if let Some(output) = &settings.output {
        // The output directory itself is created; a bad parent still fails
        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        asset.export_to(output)?;
        output_duration = asset.duration();
    }

    Ok(JobSummary {
        input: settings.input.clone(),
        input_duration,
        sample_rate,
        tempo,
        pitch,
        output: settings.output.clone(),
        output_duration,
    })
}

/// Write the analysis report as pretty JSON
///
/// Uses atomic write pattern: writes to a temp file first, then renames.
/// This prevents a half-written report if the run is interrupted.
fn write_report(report: &AnalysisReport, output_path: &Path) -> Result<()> {
    let temp_path = output_path.with_extension("json.tmp");

    let file = File::create(&temp_path)?;
    let writer = BufWriter::new(file);

    serde_json::to_writer_pretty(writer, report).map_err(|e| {
        // Clean up temp file on error
        let _ = std::fs::remove_file(&temp_path);
        TrackshiftError::Io(std::io::Error::other(e))
    })?;

    // Atomic rename: either succeeds completely or fails without modifying target
    std::fs::rename(&temp_path, output_path).map_err(|e| {
        let _ = std::fs::remove_file(&temp_path);
        TrackshiftError::Io(e)
    })?;

    info!("Wrote analysis report to {}", output_path.display());
    debug!("Report: {:?}", report);

    Ok(())
}
