//! Reference-vs-render comparison.
//!
//! A single pass over both buffers accumulates the reference signal power,
//! the power of the difference, the largest absolute difference and the
//! number of samples where the render is above the reference. All three
//! metrics are always computed and reported, even when one has already
//! failed.
//!
//! `signal_power` includes the silent tail of the reference (the sweep ends
//! above Nyquist), so the SNR depends on the sweep duration. Recalibrate
//! thresholds whenever the duration changes.

use tracing::debug;

use crate::config::Thresholds;
use crate::error::Error;
use crate::report::{Metric, MetricCheck, Relation};
use crate::sample_buffer::SampleBuffer;

/// SNR in dB from accumulated powers.
///
/// A zero noise power is a perfect match and yields `+inf`, including the
/// all-silent case where the ratio would otherwise be `0 / 0`.
pub fn calculate_snr(signal_power: f64, noise_power: f64) -> f64 {
    if noise_power == 0.0 {
        return f64::INFINITY;
    }
    10.0 * (signal_power / noise_power).log10()
}

/// Metrics of one comparison and their verdict against the thresholds used.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComparisonResult {
    frames: usize,
    signal_power: f64,
    noise_power: f64,
    snr_db: f64,
    max_error: f64,
    max_error_position: Option<usize>,
    diff_count: usize,
    thresholds: Thresholds,
}

/// Compares `rendered` against `reference` and evaluates `thresholds`.
///
/// Fails with [`Error::LengthMismatch`] when the buffers differ in length or
/// are empty, and with [`Error::SampleRateMismatch`] when their rates
/// differ. No metric is computed in either case.
pub fn compare(
    reference: &SampleBuffer,
    rendered: &SampleBuffer,
    thresholds: &Thresholds,
) -> Result<ComparisonResult, Error> {
    if reference.len() != rendered.len() || reference.is_empty() {
        return Err(Error::LengthMismatch {
            reference: reference.len(),
            rendered: rendered.len(),
        });
    }
    if reference.sample_rate_hz() != rendered.sample_rate_hz() {
        return Err(Error::SampleRateMismatch {
            reference: reference.sample_rate_hz(),
            rendered: rendered.sample_rate_hz(),
        });
    }

    let mut signal_power = 0.0f64;
    let mut noise_power = 0.0f64;
    let mut diff_count = 0usize;
    let mut max_error = -1.0f64;
    let mut max_error_position = None;

    for (k, (&r, &x)) in rendered
        .samples()
        .iter()
        .zip(reference.samples())
        .enumerate()
    {
        let diff = f64::from(r) - f64::from(x);
        noise_power += diff * diff;
        signal_power += f64::from(x) * f64::from(x);
        if diff.abs() > max_error {
            max_error = diff.abs();
            max_error_position = Some(k);
        }
        // Only renders above the reference count; a 16-bit reference almost
        // never matches the float render exactly.
        if diff > 0.0 {
            diff_count += 1;
        }
    }

    let result = ComparisonResult {
        frames: reference.len(),
        signal_power,
        noise_power,
        snr_db: calculate_snr(signal_power, noise_power),
        max_error,
        max_error_position,
        diff_count,
        thresholds: *thresholds,
    };
    debug!(
        frames = result.frames,
        snr_db = result.snr_db,
        max_error = result.max_error,
        max_error_position = ?result.max_error_position,
        diff_count = result.diff_count,
        passed = result.passed(),
        "comparison complete"
    );
    Ok(result)
}

impl ComparisonResult {
    /// Number of frames compared.
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Sum of squared reference samples.
    pub fn signal_power(&self) -> f64 {
        self.signal_power
    }

    /// Sum of squared differences.
    pub fn noise_power(&self) -> f64 {
        self.noise_power
    }

    /// `10 * log10(signal_power / noise_power)`; `+inf` for a perfect match.
    pub fn snr_db(&self) -> f64 {
        self.snr_db
    }

    /// Largest absolute difference; `-1` if no difference could be measured
    /// (every difference was NaN).
    pub fn max_error(&self) -> f64 {
        self.max_error
    }

    /// Index of the first sample with the largest absolute difference.
    pub fn max_error_position(&self) -> Option<usize> {
        self.max_error_position
    }

    /// Number of samples where the render is strictly above the reference.
    pub fn diff_count(&self) -> usize {
        self.diff_count
    }

    /// The thresholds this result was evaluated against.
    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn snr_passed(&self) -> bool {
        self.noise_power == 0.0 || self.snr_db >= self.thresholds.min_snr_db
    }

    pub fn max_error_passed(&self) -> bool {
        self.max_error_position.is_some() && self.max_error <= self.thresholds.max_abs_diff
    }

    pub fn diff_count_passed(&self) -> bool {
        self.diff_count <= self.thresholds.max_diff_count
    }

    /// Whether all three metrics are within their thresholds.
    pub fn passed(&self) -> bool {
        self.snr_passed() && self.max_error_passed() && self.diff_count_passed()
    }

    /// The three metric checks in reporting order.
    pub fn checks(&self) -> [MetricCheck; 3] {
        [
            MetricCheck {
                metric: Metric::Snr,
                actual: self.snr_db,
                relation: Relation::GreaterOrEqual,
                threshold: self.thresholds.min_snr_db,
                passed: self.snr_passed(),
            },
            MetricCheck {
                metric: Metric::MaxDifference,
                actual: self.max_error,
                relation: Relation::LessOrEqual,
                threshold: self.thresholds.max_abs_diff,
                passed: self.max_error_passed(),
            },
            MetricCheck {
                metric: Metric::DiffCount,
                actual: self.diff_count as f64,
                relation: Relation::LessOrEqual,
                threshold: self.thresholds.max_diff_count as f64,
                passed: self.diff_count_passed(),
            },
        ]
    }
}
