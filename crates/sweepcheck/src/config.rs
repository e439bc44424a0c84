//! Pass/fail thresholds and artifact policy.

/// Thresholds a comparison must meet to pass.
///
/// The defaults fail every render that is not a perfect match, which is
/// useful for determining new thresholds: run once, read the reported
/// metrics, then calibrate.
///
/// # Example
///
/// ```
/// use sweepcheck::Thresholds;
///
/// let thresholds = Thresholds {
///     min_snr_db: 112.1,
///     max_abs_diff: 4.2e-5,
///     ..Default::default()
/// };
/// assert_eq!(thresholds.max_diff_count, 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// The SNR in dB must be greater than or equal to this (default: 10000).
    ///
    /// The reference is stored as 16-bit PCM so it never matches the
    /// floating-point render exactly; an infinite threshold would only pass
    /// perfect renders.
    pub min_snr_db: f64,
    /// The maximum absolute sample difference must be less than or equal to
    /// this (default: 0).
    pub max_abs_diff: f64,
    /// The number of samples where the render exceeds the reference must be
    /// less than or equal to this (default: 0).
    pub max_diff_count: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_snr_db: 10_000.0,
            max_abs_diff: 0.0,
            max_diff_count: 0,
        }
    }
}

impl Thresholds {
    pub const fn new(min_snr_db: f64, max_abs_diff: f64, max_diff_count: usize) -> Self {
        Self {
            min_snr_db,
            max_abs_diff,
            max_diff_count,
        }
    }
}

/// When the rendered output is saved as a candidate reference file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArtifactPolicy {
    /// Never save the render.
    Never,
    /// Save the render when any metric fails (default).
    #[default]
    OnFailure,
    /// Save every render, pass or fail.
    Always,
}

impl ArtifactPolicy {
    /// Whether a render with the given verdict should be exported.
    pub fn should_export(self, passed: bool) -> bool {
        match self {
            Self::Never => false,
            Self::OnFailure => !passed,
            Self::Always => true,
        }
    }
}
