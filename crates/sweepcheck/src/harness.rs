//! Test-case orchestration.
//!
//! Each case runs load, render, compare and report in sequence. Loading or
//! rendering failures skip the comparison and surface as
//! [`Outcome::Errored`]; a metric failure is [`Outcome::Failed`] with the
//! full [`ComparisonResult`].

use std::fmt;
use std::panic;
use std::path::PathBuf;
use std::thread;

use tracing::{info, info_span};

use crate::artifact::{ArtifactWriter, WavArtifactWriter, export_if_needed};
use crate::compare::{ComparisonResult, compare};
use crate::config::{ArtifactPolicy, Thresholds};
use crate::error::Error;
use crate::reference::{ReferenceLoader, WavReferenceLoader};
use crate::render::{RenderEngine, RenderJob};
use crate::report::Reporter;
use crate::sample_buffer::SampleBuffer;
use crate::sweep::{DEFAULT_DURATION_SECONDS, DEFAULT_SAMPLE_RATE_HZ, build_sweep};

/// One identified render to verify against its reference.
#[derive(Debug, Clone, PartialEq)]
pub struct TestCase {
    /// Names the reference (`<test_id>-expected.wav`) and the saved render
    /// (`<test_id>-actual.wav`).
    pub test_id: String,
    pub thresholds: Thresholds,
}

impl TestCase {
    pub fn new(test_id: impl Into<String>, thresholds: Thresholds) -> Self {
        Self {
            test_id: test_id.into(),
            thresholds,
        }
    }
}

/// Verdict of a single test case.
#[derive(Debug)]
pub enum Outcome {
    /// Every metric met its threshold.
    Passed(ComparisonResult),
    /// At least one metric missed its threshold.
    Failed(ComparisonResult),
    /// A structural error aborted the case before a verdict was reached.
    Errored(Error),
}

impl Outcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, Self::Passed(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn is_errored(&self) -> bool {
        matches!(self, Self::Errored(_))
    }

    /// The comparison, if one was carried out.
    pub fn comparison(&self) -> Option<&ComparisonResult> {
        match self {
            Self::Passed(result) | Self::Failed(result) => Some(result),
            Self::Errored(_) => None,
        }
    }

    pub fn error(&self) -> Option<&Error> {
        match self {
            Self::Errored(err) => Some(err),
            _ => None,
        }
    }
}

/// Result of running one [`TestCase`].
#[derive(Debug)]
pub struct CaseReport {
    pub test_id: String,
    pub outcome: Outcome,
    /// Where the render was saved, if it was.
    pub artifact: Option<PathBuf>,
}

/// Runs test cases against references with a fixed sweep and artifact
/// policy.
///
/// Created via [`Harness::builder()`]. The harness holds no per-case state,
/// so one instance can run cases concurrently.
pub struct Harness {
    sample_rate: f64,
    duration_seconds: f64,
    artifact_policy: ArtifactPolicy,
    references: Box<dyn ReferenceLoader + Send + Sync>,
    artifacts: Box<dyn ArtifactWriter + Send + Sync>,
}

impl fmt::Debug for Harness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Harness")
            .field("sample_rate", &self.sample_rate)
            .field("duration_seconds", &self.duration_seconds)
            .field("artifact_policy", &self.artifact_policy)
            .finish_non_exhaustive()
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Harness {
    pub fn builder() -> HarnessBuilder {
        HarnessBuilder::default()
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }

    pub fn artifact_policy(&self) -> ArtifactPolicy {
        self.artifact_policy
    }

    /// Runs one case with `engine` and forwards every result to `reporter`.
    ///
    /// The three metric checks are reported before the saved-artifact
    /// notice. A structural error is reported once and yields
    /// [`Outcome::Errored`] with no artifact.
    pub fn run<E: RenderEngine>(
        &self,
        case: &TestCase,
        engine: &mut E,
        reporter: &dyn Reporter,
    ) -> CaseReport {
        let span = info_span!("test_case", test_id = %case.test_id);
        let _enter = span.enter();

        let (comparison, rendered) = match self.verify(case, engine) {
            Ok(verified) => verified,
            Err(err) => {
                reporter.error(&case.test_id, &err);
                return CaseReport {
                    test_id: case.test_id.clone(),
                    outcome: Outcome::Errored(err),
                    artifact: None,
                };
            }
        };

        for check in comparison.checks() {
            reporter.metric(&case.test_id, &check);
        }

        let passed = comparison.passed();
        let artifact = export_if_needed(
            self.artifacts.as_ref(),
            self.artifact_policy,
            &case.test_id,
            &rendered,
            passed,
        );
        if let Some(path) = &artifact {
            reporter.artifact_saved(&case.test_id, path);
        }
        info!(passed, snr_db = comparison.snr_db(), "test case finished");

        CaseReport {
            test_id: case.test_id.clone(),
            outcome: if passed {
                Outcome::Passed(comparison)
            } else {
                Outcome::Failed(comparison)
            },
            artifact,
        }
    }

    /// Runs every case on its own scoped thread with a fresh engine from
    /// `make_engine`. Reports come back in the order of `cases`.
    pub fn run_all<E, F>(
        &self,
        cases: &[TestCase],
        make_engine: F,
        reporter: &(dyn Reporter + Sync),
    ) -> Vec<CaseReport>
    where
        E: RenderEngine,
        F: Fn(&TestCase) -> E + Sync,
    {
        let make_engine = &make_engine;
        thread::scope(|scope| {
            let handles: Vec<_> = cases
                .iter()
                .map(|case| {
                    scope.spawn(move || {
                        let mut engine = make_engine(case);
                        self.run(case, &mut engine, reporter)
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap_or_else(|p| panic::resume_unwind(p)))
                .collect()
        })
    }

    fn verify<E: RenderEngine>(
        &self,
        case: &TestCase,
        engine: &mut E,
    ) -> Result<(ComparisonResult, SampleBuffer), Error> {
        let reference = self.references.load(&case.test_id)?;
        let sweep = build_sweep(self.sample_rate, self.duration_seconds)?;
        let rendered = engine.configure(&sweep, reference.len())?.render()?;
        let comparison = compare(&reference, &rendered, &case.thresholds)?;
        Ok((comparison, rendered))
    }
}

/// Builder for [`Harness`].
///
/// Defaults: 44100 Hz, 4 s sweep, [`ArtifactPolicy::OnFailure`], references
/// and artifacts in the current directory.
pub struct HarnessBuilder {
    sample_rate: f64,
    duration_seconds: f64,
    artifact_policy: ArtifactPolicy,
    references: Box<dyn ReferenceLoader + Send + Sync>,
    artifacts: Box<dyn ArtifactWriter + Send + Sync>,
}

impl fmt::Debug for HarnessBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HarnessBuilder")
            .field("sample_rate", &self.sample_rate)
            .field("duration_seconds", &self.duration_seconds)
            .field("artifact_policy", &self.artifact_policy)
            .finish_non_exhaustive()
    }
}

impl Default for HarnessBuilder {
    fn default() -> Self {
        Self {
            sample_rate: f64::from(DEFAULT_SAMPLE_RATE_HZ),
            duration_seconds: DEFAULT_DURATION_SECONDS,
            artifact_policy: ArtifactPolicy::default(),
            references: Box::new(WavReferenceLoader::new(".")),
            artifacts: Box::new(WavArtifactWriter::new(".")),
        }
    }
}

impl HarnessBuilder {
    /// Render sample rate. Invalid rates are reported per case as
    /// [`Error::InvalidParameter`].
    pub fn sample_rate(mut self, sample_rate: f64) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn duration_seconds(mut self, duration_seconds: f64) -> Self {
        self.duration_seconds = duration_seconds;
        self
    }

    pub fn artifact_policy(mut self, policy: ArtifactPolicy) -> Self {
        self.artifact_policy = policy;
        self
    }

    /// Load `<test_id>-expected.wav` files from `dir`.
    pub fn reference_dir(self, dir: impl Into<PathBuf>) -> Self {
        self.reference_loader(WavReferenceLoader::new(dir))
    }

    /// Save `<test_id>-actual.wav` files into `dir`.
    pub fn artifact_dir(self, dir: impl Into<PathBuf>) -> Self {
        self.artifact_writer(WavArtifactWriter::new(dir))
    }

    pub fn reference_loader(mut self, loader: impl ReferenceLoader + Send + Sync + 'static) -> Self {
        self.references = Box::new(loader);
        self
    }

    pub fn artifact_writer(mut self, writer: impl ArtifactWriter + Send + Sync + 'static) -> Self {
        self.artifacts = Box::new(writer);
        self
    }

    pub fn build(self) -> Harness {
        Harness {
            sample_rate: self.sample_rate,
            duration_seconds: self.duration_seconds,
            artifact_policy: self.artifact_policy,
            references: self.references,
            artifacts: self.artifacts,
        }
    }
}
