//! Runtime configuration settings

use std::path::PathBuf;

/// Runtime settings for a trackshift run
#[derive(Debug, Clone)]
pub struct Settings {
    /// Input audio file
    pub input: PathBuf,
    /// Output file for the edited audio, if exporting
    pub output: Option<PathBuf>,
    /// Tempo factor to apply, if any
    pub tempo: Option<f64>,
    /// Pitch shift in semitones to apply, if any
    pub pitch: Option<f64>,
    /// Analysis report destination, if any
    pub report: Option<PathBuf>,
    /// Print the analysis report to stdout as JSON
    pub print_json: bool,
}

impl Settings {
    /// Create settings from CLI arguments
    pub fn from_cli(cli: &super::cli::Cli) -> Self {
        Self {
            input: cli.input.clone(),
            output: cli.output.clone(),
            tempo: cli.tempo,
            pitch: cli.pitch,
            report: cli.report.clone(),
            print_json: cli.json,
        }
    }

    /// Whether this run needs pitch/tempo analysis
    ///
    /// Explicit report destinations always analyze; a run with no edits and
    /// no output has nothing else to do, so it analyzes too.
    pub fn wants_analysis(&self) -> bool {
        self.report.is_some()
            || self.print_json
            || (self.output.is_none() && self.tempo.is_none() && self.pitch.is_none())
    }
}
