//! Reporting of per-metric checks, saved artifacts and structural errors.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::{error, info, warn};

use crate::error::Error;

/// The three independently reported comparison metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    /// Signal-to-noise ratio in dB.
    Snr,
    /// Maximum absolute sample difference.
    MaxDifference,
    /// Number of samples where the render exceeds the reference.
    DiffCount,
}

impl Metric {
    pub fn name(self) -> &'static str {
        match self {
            Self::Snr => "SNR",
            Self::MaxDifference => "Maximum difference",
            Self::DiffCount => "Number of differences",
        }
    }
}

/// How the actual value must relate to the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    GreaterOrEqual,
    LessOrEqual,
}

impl Relation {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::GreaterOrEqual => ">=",
            Self::LessOrEqual => "<=",
        }
    }
}

/// One `(metric, actual, relation, threshold)` check with its outcome.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricCheck {
    pub metric: Metric,
    pub actual: f64,
    pub relation: Relation,
    pub threshold: f64,
    pub passed: bool,
}

impl fmt::Display for MetricCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} ({})",
            self.metric.name(),
            self.actual,
            self.relation.symbol(),
            self.threshold,
            if self.passed { "pass" } else { "FAIL" },
        )
    }
}

/// Receives the results of each test case.
///
/// Methods take `&self` so one reporter can be shared by concurrently
/// running cases.
pub trait Reporter {
    /// Called once per metric, in SNR, max difference, diff count order.
    fn metric(&self, test_id: &str, check: &MetricCheck);
    /// Called when the rendered output was saved.
    fn artifact_saved(&self, test_id: &str, path: &Path);
    /// Called when a structural error aborted the case.
    fn error(&self, test_id: &str, error: &Error);
}

/// Reports through `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn metric(&self, test_id: &str, check: &MetricCheck) {
        if check.passed {
            info!(test_id, "{check}");
        } else {
            warn!(test_id, "{check}");
        }
    }

    fn artifact_saved(&self, test_id: &str, path: &Path) {
        info!(test_id, path = %path.display(), "saved reference file");
    }

    fn error(&self, test_id: &str, err: &Error) {
        error!(test_id, error = %err, "test case errored");
    }
}

/// An event captured by [`Recorder`].
#[derive(Debug, Clone, PartialEq)]
pub enum ReportEvent {
    Metric {
        test_id: String,
        check: MetricCheck,
    },
    ArtifactSaved {
        test_id: String,
        path: PathBuf,
    },
    Error {
        test_id: String,
        message: String,
    },
}

impl ReportEvent {
    pub fn test_id(&self) -> &str {
        match self {
            Self::Metric { test_id, .. }
            | Self::ArtifactSaved { test_id, .. }
            | Self::Error { test_id, .. } => test_id,
        }
    }
}

/// Collects every report event in arrival order.
#[derive(Debug, Default)]
pub struct Recorder {
    events: Mutex<Vec<ReportEvent>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, event: ReportEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    /// A snapshot of the events recorded so far.
    pub fn events(&self) -> Vec<ReportEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Metric checks recorded for `test_id`.
    pub fn checks_for(&self, test_id: &str) -> Vec<MetricCheck> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ReportEvent::Metric { test_id: id, check } if id == test_id => Some(check),
                _ => None,
            })
            .collect()
    }

    pub fn into_events(self) -> Vec<ReportEvent> {
        self.events
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Reporter for Recorder {
    fn metric(&self, test_id: &str, check: &MetricCheck) {
        self.push(ReportEvent::Metric {
            test_id: test_id.to_owned(),
            check: *check,
        });
    }

    fn artifact_saved(&self, test_id: &str, path: &Path) {
        self.push(ReportEvent::ArtifactSaved {
            test_id: test_id.to_owned(),
            path: path.to_path_buf(),
        });
    }

    fn error(&self, test_id: &str, err: &Error) {
        self.push(ReportEvent::Error {
            test_id: test_id.to_owned(),
            message: err.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snr_check(passed: bool) -> MetricCheck {
        MetricCheck {
            metric: Metric::Snr,
            actual: 85.5,
            relation: Relation::GreaterOrEqual,
            threshold: 80.0,
            passed,
        }
    }

    #[test]
    fn check_display() {
        assert_eq!(snr_check(true).to_string(), "SNR 85.5 >= 80 (pass)");
        let check = MetricCheck {
            metric: Metric::DiffCount,
            actual: 12.0,
            relation: Relation::LessOrEqual,
            threshold: 3.0,
            passed: false,
        };
        assert_eq!(check.to_string(), "Number of differences 12 <= 3 (FAIL)");
    }

    #[test]
    fn recorder_keeps_arrival_order() {
        let recorder = Recorder::new();
        recorder.metric("oscillator-sine", &snr_check(true));
        recorder.artifact_saved("oscillator-sine", Path::new("oscillator-sine-actual.wav"));
        recorder.error(
            "oscillator-square",
            &Error::LengthMismatch {
                reference: 4,
                rendered: 2,
            },
        );

        let events = recorder.events();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].test_id(), "oscillator-sine");
        assert!(matches!(events[1], ReportEvent::ArtifactSaved { .. }));
        assert_eq!(
            events[2],
            ReportEvent::Error {
                test_id: "oscillator-square".to_owned(),
                message: "reference has 4 frames but rendered output has 2".to_owned(),
            }
        );
        assert_eq!(recorder.checks_for("oscillator-sine"), vec![snr_check(true)]);
        assert!(recorder.checks_for("oscillator-square").is_empty());
    }
}
