//! STFT dominant-peak pitch tracking
//!
//! Estimates one fundamental frequency per frame by picking the strongest
//! spectral peak inside the musical pitch range and refining it with
//! parabolic interpolation on log magnitudes. Frames whose peak falls below
//! the voicing threshold are reported as 0.0 (unvoiced).

use crate::dsp::hann_window;
use crate::types::{AudioBuffer, PitchContour};
use rustfft::{num_complex::Complex, FftPlanner};

/// FFT window size (4096 samples = ~93ms at 44.1kHz, ~10.8 Hz bin width)
pub const NFFT: usize = 4096;

/// Hop length between frames (75% overlap)
pub const HOP_LENGTH: usize = 1024;

/// Musical pitch search range in Hz
const MIN_PITCH_HZ: f32 = 50.0;
const MAX_PITCH_HZ: f32 = 2000.0;

/// Peaks quieter than this magnitude count as unvoiced.
/// Scaled to NFFT so the threshold tracks the window's magnitude gain
/// (a full-scale windowed sine peaks near NFFT/4).
const VOICING_THRESHOLD: f32 = NFFT as f32 * 1e-3;

/// Track the pitch contour of a mono buffer
///
/// Buffers shorter than one window produce a single zero-padded frame.
pub fn track_contour(buffer: &AudioBuffer) -> PitchContour {
    let samples = &buffer.samples;
    let sample_rate = buffer.sample_rate;

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(NFFT);
    let window = hann_window(NFFT);

    // Bin range corresponding to the pitch search range
    let bin_width = sample_rate as f32 / NFFT as f32;
    let min_bin = ((MIN_PITCH_HZ / bin_width).ceil() as usize).max(1);
    let max_bin = ((MAX_PITCH_HZ / bin_width).floor() as usize).min(NFFT / 2 - 1);

    let num_frames = samples.len().saturating_sub(NFFT) / HOP_LENGTH + 1;
    let mut frequencies = Vec::with_capacity(num_frames);

    for frame_idx in 0..num_frames {
        let start = frame_idx * HOP_LENGTH;
        let end = (start + NFFT).min(samples.len());

        // Windowed frame, zero-padded past the end of the signal
        let mut frame: Vec<Complex<f32>> = vec![Complex::new(0.0, 0.0); NFFT];
        for (i, &w) in window.iter().enumerate() {
            if start + i < end {
                frame[i] = Complex::new(samples[start + i] * w, 0.0);
            }
        }

        fft.process(&mut frame);

        frequencies.push(dominant_frequency(
            &frame, min_bin, max_bin, bin_width,
        ));
    }

    PitchContour {
        frequencies,
        hop_size: HOP_LENGTH,
        sample_rate,
    }
}

/// Pick the strongest peak in [min_bin, max_bin] and refine it
fn dominant_frequency(
    spectrum: &[Complex<f32>],
    min_bin: usize,
    max_bin: usize,
    bin_width: f32,
) -> f32 {
    if min_bin >= max_bin {
        return 0.0;
    }

    let mut peak_bin = min_bin;
    let mut peak_mag = 0.0f32;
    for (bin, value) in spectrum
        .iter()
        .enumerate()
        .take(max_bin + 1)
        .skip(min_bin)
    {
        let mag = value.norm();
        if mag > peak_mag {
            peak_mag = mag;
            peak_bin = bin;
        }
    }

    if peak_mag < VOICING_THRESHOLD {
        return 0.0;
    }

    // Parabolic interpolation on log magnitudes refines the peak position
    // well below the bin width
    let offset = if peak_bin > 0 && peak_bin + 1 < spectrum.len() {
        let alpha = (spectrum[peak_bin - 1].norm() + f32::EPSILON).ln();
        let beta = (peak_mag + f32::EPSILON).ln();
        let gamma = (spectrum[peak_bin + 1].norm() + f32::EPSILON).ln();
        let denom = alpha - 2.0 * beta + gamma;
        if denom.abs() > f32::EPSILON {
            (0.5 * (alpha - gamma) / denom).clamp(-1.0, 1.0)
        } else {
            0.0
        }
    } else {
        0.0
    };

    (peak_bin as f32 + offset) * bin_width
}
