//! CLI argument parsing and configuration

use clap::Parser;
use std::path::PathBuf;

/// trackshift - pitch and tempo editing for a single audio track
///
/// Loads an audio file, analyzes tempo and pitch on demand, applies
/// time-stretch and pitch-shift edits, and exports the result as 32-bit
/// float WAV. With no edit flags, prints the track's analysis.
#[derive(Parser, Debug)]
#[command(name = "trackshift")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Input audio file
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Output file for the edited audio (written as 32-bit float WAV)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Tempo factor (1.0 = unchanged, 1.25 = 25% faster, 0.8 = slower)
    #[arg(long, value_name = "FACTOR")]
    pub tempo: Option<f64>,

    /// Pitch shift in semitones (positive = up, negative = down)
    #[arg(long, value_name = "SEMITONES", allow_negative_numbers = true)]
    pub pitch: Option<f64>,

    /// Write the analysis report to a JSON file
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Print the analysis report to stdout as JSON
    #[arg(long, default_value = "false")]
    pub json: bool,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, default_value = "false")]
    pub quiet: bool,
}

impl Cli {
    /// Get the log level based on verbosity flags
    pub fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}
