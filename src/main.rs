//! trackshift CLI entry point

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use trackshift::config::{Cli, Settings};
use trackshift::job::{self, JobSummary};

fn main() -> ExitCode {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    init_logging(&cli);

    // Build settings from CLI
    let settings = Settings::from_cli(&cli);

    // Validate inputs
    if let Err(e) = validate_inputs(&cli) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    // Run the job
    match job::run(&settings) {
        Ok(summary) => {
            // When JSON went to stdout, keep stdout clean
            if !settings.print_json {
                print_summary(&summary);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            // Usage-style exit code for errors only a different input can fix
            if e.is_invalid_input() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn init_logging(cli: &Cli) {
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = if cli.quiet { "error" } else { filter };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();
}

fn validate_inputs(cli: &Cli) -> Result<(), String> {
    // Check input exists
    if !cli.input.exists() {
        return Err(format!(
            "Input file does not exist: {}\n\n  Tip: Check the path is correct and accessible.\n  Examples:\n    trackshift -i track.mp3\n    trackshift -i track.wav --tempo 1.1 -o faster.wav",
            cli.input.display()
        ));
    }

    // Fail fast on an impossible factor; the asset would reject it anyway
    if let Some(factor) = cli.tempo {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(format!(
                "Tempo factor must be positive, got {}\n  Example: --tempo 1.25 makes the track 25% faster",
                factor
            ));
        }
    }

    Ok(())
}

fn print_summary(summary: &JobSummary) {
    println!(
        "{}: {:.2}s @ {}Hz",
        summary.input.display(),
        summary.input_duration,
        summary.sample_rate
    );

    if let Some(tempo) = &summary.tempo {
        println!(
            "  Tempo: {:.1} BPM (confidence {:.2})",
            tempo.bpm, tempo.confidence
        );
    }

    if let Some(pitch) = &summary.pitch {
        match pitch.median_hz {
            Some(hz) => println!(
                "  Pitch: median {:.1} Hz over {}/{} voiced frames",
                hz, pitch.voiced_frames, pitch.frames
            ),
            None => println!("  Pitch: no voiced frames detected"),
        }
    }

    if let (Some(output), Some(duration)) = (&summary.output, summary.output_duration) {
        println!("  Wrote {} ({:.2}s)", output.display(), duration);
    }
}
