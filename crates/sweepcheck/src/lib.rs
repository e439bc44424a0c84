//! Audio fidelity verification for oscillator sweeps.
//!
//! Renders an exponentially swept oscillator through a rendering engine,
//! compares the rendered output sample-by-sample against a stored 16-bit
//! reference, and reports signal-to-noise ratio, maximum absolute difference
//! and the count of positive-going differences against caller supplied
//! thresholds.
//!
//! # Quick Start
//!
//! ```no_run
//! use sweepcheck::{Harness, OscillatorRenderer, TestCase, Thresholds, TracingReporter, Waveform};
//!
//! let harness = Harness::builder()
//!     .reference_dir("resources/oscillator")
//!     .artifact_dir("target/sweepcheck")
//!     .build();
//!
//! let waveform = Waveform::Sine;
//! let case = TestCase::new(
//!     waveform.test_id(),
//!     Thresholds {
//!         min_snr_db: 90.0,
//!         max_abs_diff: 4.2e-5,
//!         max_diff_count: 2500,
//!     },
//! );
//! let mut engine = OscillatorRenderer::new(waveform);
//! let report = harness.run(&case, &mut engine, &TracingReporter);
//! assert!(report.outcome.is_passed());
//! ```

pub mod artifact;
pub mod compare;
pub mod config;
mod error;
pub mod harness;
pub mod reference;
pub mod render;
pub mod report;
pub mod sample_buffer;
pub mod sweep;

// Public re-exports.
pub use artifact::{ArtifactWriter, WavArtifactWriter, export_if_needed};
pub use compare::{ComparisonResult, compare};
pub use config::{ArtifactPolicy, Thresholds};
pub use error::{BoxError, Error};
pub use harness::{CaseReport, Harness, HarnessBuilder, Outcome, TestCase};
pub use reference::{ReferenceLoader, WavReferenceLoader};
pub use render::{
    OscillatorJob, OscillatorRenderer, PeriodicWave, RenderEngine, RenderJob, UnknownWaveform,
    Waveform,
};
pub use report::{Metric, MetricCheck, Recorder, Relation, ReportEvent, Reporter, TracingReporter};
pub use sample_buffer::SampleBuffer;
pub use sweep::{SweepConfig, build_sweep};
