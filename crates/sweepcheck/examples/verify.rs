//! Verify oscillator sweeps against stored reference recordings.
//!
//! Renders each requested oscillator type, compares it with
//! `<references>/oscillator-<type>-expected.wav`, and saves failing renders as
//! `<artifacts>/oscillator-<type>-actual.wav`. With `--bless` the renders are
//! written as new references instead.
//!
//! ```sh
//! cargo run -p sweepcheck --features examples --example verify -- \
//!     --references resources/oscillator --min-snr-db 90 --max-abs-diff 4.2e-5
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use sweepcheck::reference::reference_file_name;
use sweepcheck::sweep::{DEFAULT_DURATION_SECONDS, DEFAULT_SAMPLE_RATE_HZ};
use sweepcheck::{
    ArtifactPolicy, ArtifactWriter, Harness, OscillatorRenderer, RenderEngine, RenderJob,
    TestCase, Thresholds, TracingReporter, WavArtifactWriter, Waveform, build_sweep,
};

#[derive(Parser, Debug)]
#[command(about = "Verify oscillator sweeps against reference recordings")]
struct Args {
    /// Directory holding `<test_id>-expected.wav` references.
    #[arg(long, default_value = "resources/oscillator")]
    references: PathBuf,

    /// Directory receiving `<test_id>-actual.wav` renders.
    #[arg(long, default_value = "target/sweepcheck")]
    artifacts: PathBuf,

    /// Oscillator types to verify. Defaults to all of them.
    #[arg(short, long = "waveform")]
    waveforms: Vec<Waveform>,

    /// Render sample rate in Hz.
    #[arg(long, default_value_t = f64::from(DEFAULT_SAMPLE_RATE_HZ))]
    sample_rate: f64,

    /// Sweep length in seconds.
    #[arg(short, long, default_value_t = DEFAULT_DURATION_SECONDS)]
    duration: f64,

    /// Minimum SNR in dB.
    #[arg(long, default_value_t = Thresholds::default().min_snr_db)]
    min_snr_db: f64,

    /// Maximum absolute sample difference.
    #[arg(long, default_value_t = Thresholds::default().max_abs_diff)]
    max_abs_diff: f64,

    /// Maximum number of samples where the render exceeds the reference.
    #[arg(long, default_value_t = Thresholds::default().max_diff_count)]
    max_diff_count: usize,

    /// Save every render, not only failing ones.
    #[arg(long)]
    save_always: bool,

    /// Write the renders as new references and skip verification.
    #[arg(long)]
    bless: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "sweepcheck=info".into()),
        )
        .init();

    let args = Args::parse();
    let waveforms = if args.waveforms.is_empty() {
        Waveform::all().to_vec()
    } else {
        args.waveforms.clone()
    };

    if args.bless {
        return bless(&args, &waveforms);
    }

    let harness = Harness::builder()
        .sample_rate(args.sample_rate)
        .duration_seconds(args.duration)
        .artifact_policy(if args.save_always {
            ArtifactPolicy::Always
        } else {
            ArtifactPolicy::OnFailure
        })
        .reference_dir(&args.references)
        .artifact_dir(&args.artifacts)
        .build();
    let thresholds = Thresholds::new(args.min_snr_db, args.max_abs_diff, args.max_diff_count);

    let cases: Vec<TestCase> = waveforms
        .iter()
        .map(|waveform| TestCase::new(waveform.test_id(), thresholds))
        .collect();
    let reports = harness.run_all(
        &cases,
        |case| {
            let index = cases
                .iter()
                .position(|c| c.test_id == case.test_id)
                .unwrap_or_default();
            OscillatorRenderer::new(waveforms[index].clone())
        },
        &TracingReporter,
    );

    let mut failed = 0;
    for report in &reports {
        let verdict = if report.outcome.is_passed() {
            "passed"
        } else if report.outcome.is_failed() {
            "FAILED"
        } else {
            "ERRORED"
        };
        println!("{:<24} {verdict}", report.test_id);
        if !report.outcome.is_passed() {
            failed += 1;
        }
    }

    if failed > 0 {
        bail!("{failed} of {} test cases did not pass", reports.len());
    }
    Ok(())
}

/// Renders every waveform and stores it as the reference.
fn bless(args: &Args, waveforms: &[Waveform]) -> Result<()> {
    let sweep = build_sweep(args.sample_rate, args.duration)?;
    let writer = WavArtifactWriter::new(&args.references);
    for waveform in waveforms {
        let rendered = OscillatorRenderer::new(waveform.clone())
            .configure(&sweep, sweep.num_frames())?
            .render()?;
        let path = writer
            .write(&rendered, &reference_file_name(&waveform.test_id()))
            .with_context(|| format!("failed to bless {waveform}"))?;
        info!(path = %path.display(), "wrote reference");
    }
    Ok(())
}
