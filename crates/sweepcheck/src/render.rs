//! Rendering engines.
//!
//! The harness treats the engine as an opaque capability: it configures a
//! sweep, then renders it once. [`OscillatorRenderer`] is the built-in
//! offline engine: a band-limited additive oscillator that follows the
//! exponential ramp and drops every partial at or above Nyquist.

use std::error::Error as StdError;
use std::f64::consts::{PI, TAU};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::debug;

use crate::error::Error;
use crate::sample_buffer::SampleBuffer;
use crate::sweep::SweepConfig;

/// Highest partial the built-in oscillator evaluates.
pub const MAX_PARTIALS: usize = 2048;

/// Points per cycle used to find the peak when normalizing a wave.
const NORMALIZATION_POINTS: usize = 2048;

/// An engine that renders a configured sweep into a single channel.
pub trait RenderEngine {
    type Job: RenderJob;

    /// Prepares a render of `sweep` lasting `frames` frames.
    fn configure(&mut self, sweep: &SweepConfig, frames: usize) -> Result<Self::Job, Error>;
}

/// A configured render, consumed by rendering it.
pub trait RenderJob {
    fn render(self) -> Result<SampleBuffer, Error>;
}

/// Fourier coefficients of one cycle of a custom oscillator wave.
///
/// Index `k` holds the amplitude of harmonic `k`; index 0 (DC) is ignored.
/// `real` are cosine terms, `imag` sine terms.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodicWave {
    real: Vec<f32>,
    imag: Vec<f32>,
}

impl PeriodicWave {
    pub fn new(real: Vec<f32>, imag: Vec<f32>) -> Result<Self, Error> {
        if real.len() != imag.len() || real.len() < 2 {
            return Err(Error::InvalidParameter {
                name: "periodic wave length",
                value: real.len().min(imag.len()) as f64,
            });
        }
        Ok(Self { real, imag })
    }

    /// Cosine coefficients.
    pub fn real(&self) -> &[f32] {
        &self.real
    }

    /// Sine coefficients.
    pub fn imag(&self) -> &[f32] {
        &self.imag
    }
}

impl Default for PeriodicWave {
    /// Three coefficients: the fundamental plus half its second harmonic,
    /// both as cosine terms.
    fn default() -> Self {
        Self {
            real: vec![0.0, 1.0, 0.5],
            imag: vec![0.0, 0.0, 0.0],
        }
    }
}

/// Oscillator wave shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
    Custom(PeriodicWave),
}

impl Waveform {
    /// Every shape, with the default [`PeriodicWave`] for `Custom`.
    pub fn all() -> [Self; 5] {
        [
            Self::Sine,
            Self::Square,
            Self::Sawtooth,
            Self::Triangle,
            Self::Custom(PeriodicWave::default()),
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Sine => "sine",
            Self::Square => "square",
            Self::Sawtooth => "sawtooth",
            Self::Triangle => "triangle",
            Self::Custom(_) => "custom",
        }
    }

    /// Identifier keying the reference and artifact files, e.g.
    /// `oscillator-sine`.
    pub fn test_id(&self) -> String {
        format!("oscillator-{}", self.name())
    }

    /// `(cosine, sine)` amplitudes for harmonics `1..=n`, where `n` is the
    /// number of partials this shape defines (capped at [`MAX_PARTIALS`]).
    fn coefficients(&self) -> Vec<(f64, f64)> {
        let n = match self {
            Self::Sine => 1,
            Self::Square | Self::Sawtooth | Self::Triangle => MAX_PARTIALS,
            Self::Custom(wave) => (wave.real.len() - 1).min(MAX_PARTIALS),
        };
        (1..=n)
            .map(|k| {
                let kf = k as f64;
                let odd = k % 2 == 1;
                match self {
                    Self::Sine => (0.0, 1.0),
                    Self::Square if odd => (0.0, 4.0 / (PI * kf)),
                    Self::Sawtooth => {
                        let sign = if odd { 1.0 } else { -1.0 };
                        (0.0, sign * 2.0 / (PI * kf))
                    }
                    Self::Triangle if odd => {
                        let sign = if (k - 1) / 2 % 2 == 0 { 1.0 } else { -1.0 };
                        (0.0, sign * 8.0 / (PI * kf).powi(2))
                    }
                    Self::Square | Self::Triangle => (0.0, 0.0),
                    Self::Custom(wave) => (f64::from(wave.real[k]), f64::from(wave.imag[k])),
                }
            })
            .collect()
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown oscillator type name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownWaveform(pub String);

impl fmt::Display for UnknownWaveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown oscillator type {:?}; expected sine, square, sawtooth, triangle or custom",
            self.0
        )
    }
}

impl StdError for UnknownWaveform {}

impl FromStr for Waveform {
    type Err = UnknownWaveform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sine" => Ok(Self::Sine),
            "square" => Ok(Self::Square),
            "sawtooth" => Ok(Self::Sawtooth),
            "triangle" => Ok(Self::Triangle),
            "custom" => Ok(Self::Custom(PeriodicWave::default())),
            other => Err(UnknownWaveform(other.to_owned())),
        }
    }
}

/// Sums `coefficients` at phase `x` (radians).
///
/// Harmonic `k` is rotated from harmonic `k - 1` instead of calling
/// `sin`/`cos` per partial.
fn evaluate(coefficients: &[(f64, f64)], x: f64) -> f64 {
    let (s1, c1) = x.sin_cos();
    let (mut sk, mut ck) = (s1, c1);
    let mut sum = 0.0;
    for &(a, b) in coefficients {
        sum += a * ck + b * sk;
        (sk, ck) = (sk * c1 + ck * s1, ck * c1 - sk * s1);
    }
    sum
}

/// Reciprocal of the peak magnitude of the full-band wave over one cycle.
fn normalization(coefficients: &[(f64, f64)]) -> f64 {
    let peak = (0..NORMALIZATION_POINTS)
        .map(|i| evaluate(coefficients, TAU * i as f64 / NORMALIZATION_POINTS as f64).abs())
        .fold(0.0f64, f64::max);
    if peak > 0.0 { 1.0 / peak } else { 1.0 }
}

/// Number of harmonics of `frequency` strictly below `nyquist`.
fn partials_below(frequency: f64, nyquist: f64, limit: usize) -> usize {
    if frequency <= 0.0 || frequency >= nyquist {
        return 0;
    }
    (((nyquist / frequency).ceil() as usize).saturating_sub(1)).min(limit)
}

/// Built-in offline oscillator engine.
///
/// The wave is normalized to unit peak and then scaled by the sweep's gain.
/// The phase advances by `f(t) / sample_rate` cycles per frame, so the
/// instantaneous frequency follows [`SweepConfig::frequency_at`].
#[derive(Debug, Clone)]
pub struct OscillatorRenderer {
    waveform: Waveform,
    coefficients: Arc<[(f64, f64)]>,
    normalization: f64,
}

impl OscillatorRenderer {
    pub fn new(waveform: Waveform) -> Self {
        let coefficients: Arc<[(f64, f64)]> = waveform.coefficients().into();
        let normalization = normalization(&coefficients);
        Self {
            waveform,
            coefficients,
            normalization,
        }
    }

    pub fn waveform(&self) -> &Waveform {
        &self.waveform
    }
}

impl RenderEngine for OscillatorRenderer {
    type Job = OscillatorJob;

    fn configure(&mut self, sweep: &SweepConfig, frames: usize) -> Result<OscillatorJob, Error> {
        if frames == 0 {
            return Err(Error::InvalidParameter {
                name: "frame count",
                value: 0.0,
            });
        }
        debug!(
            waveform = self.waveform.name(),
            frames,
            start_hz = sweep.start_frequency(),
            end_hz = sweep.end_frequency(),
            "configured oscillator sweep"
        );
        Ok(OscillatorJob {
            sweep: *sweep,
            frames,
            coefficients: Arc::clone(&self.coefficients),
            normalization: self.normalization,
        })
    }
}

/// A sweep render prepared by [`OscillatorRenderer`].
#[derive(Debug)]
pub struct OscillatorJob {
    sweep: SweepConfig,
    frames: usize,
    coefficients: Arc<[(f64, f64)]>,
    normalization: f64,
}

impl RenderJob for OscillatorJob {
    fn render(self) -> Result<SampleBuffer, Error> {
        let sample_rate = self.sweep.sample_rate();
        let nyquist = self.sweep.nyquist();
        let gain = f64::from(self.sweep.gain_scale()) * self.normalization;

        let mut samples = Vec::with_capacity(self.frames);
        let mut phase = 0.0f64;
        for n in 0..self.frames {
            let frequency = self.sweep.frequency_at(n as f64 / sample_rate);
            let partials = partials_below(frequency, nyquist, self.coefficients.len());
            let value = evaluate(&self.coefficients[..partials], TAU * phase);
            samples.push((gain * value) as f32);

            phase += frequency / sample_rate;
            phase -= phase.floor();
        }
        Ok(SampleBuffer::new(samples, self.sweep.sample_rate_hz()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sweep::build_sweep;

    fn render(waveform: Waveform, sample_rate: f64, duration: f64) -> SampleBuffer {
        let sweep = build_sweep(sample_rate, duration).unwrap();
        let mut engine = OscillatorRenderer::new(waveform);
        engine
            .configure(&sweep, sweep.num_frames())
            .unwrap()
            .render()
            .unwrap()
    }

    #[test]
    fn partial_count_stays_below_nyquist() {
        assert_eq!(partials_below(1000.0, 4000.0, MAX_PARTIALS), 3);
        assert_eq!(partials_below(1100.0, 4000.0, MAX_PARTIALS), 3);
        assert_eq!(partials_below(3999.0, 4000.0, MAX_PARTIALS), 1);
        assert_eq!(partials_below(4000.0, 4000.0, MAX_PARTIALS), 0);
        assert_eq!(partials_below(5000.0, 4000.0, MAX_PARTIALS), 0);
        assert_eq!(partials_below(10.0, 22_050.0, 1), 1);
        assert_eq!(partials_below(10.0, 22_050.0, MAX_PARTIALS), MAX_PARTIALS);
        assert_eq!(partials_below(10.0, 22_050.0, 4096), 2204);
    }

    #[test]
    fn sine_sweep_shape() {
        let buffer = render(Waveform::Sine, 8000.0, 0.25);
        assert_eq!(buffer.len(), 2000);
        assert_eq!(buffer.sample_rate_hz(), 8000);
        assert_eq!(buffer.samples()[0], 0.0);

        let peak = buffer.samples().iter().fold(0.0f32, |m, s| m.max(s.abs()));
        assert!(peak > 0.45 && peak <= 0.5 + 1e-6, "peak {peak}");
    }

    #[test]
    fn sweep_tail_above_nyquist_is_silent() {
        let sweep = build_sweep(8000.0, 0.5).unwrap();
        for waveform in Waveform::all() {
            let buffer = render(waveform.clone(), 8000.0, 0.5);
            let first_silent = (0..buffer.len())
                .find(|&n| sweep.frequency_at(n as f64 / 8000.0) >= sweep.nyquist())
                .unwrap();
            assert!(first_silent < buffer.len());
            assert!(
                buffer.samples()[first_silent..].iter().all(|&s| s == 0.0),
                "{waveform} leaks energy above nyquist"
            );
            assert!(buffer.samples()[..first_silent].iter().any(|&s| s != 0.0));
        }
    }

    #[test]
    fn every_waveform_stays_below_full_scale() {
        for waveform in Waveform::all() {
            let buffer = render(waveform.clone(), 8000.0, 0.25);
            let peak = buffer.samples().iter().fold(0.0f32, |m, s| m.max(s.abs()));
            assert!(peak < 1.0, "{waveform} peak {peak}");
            assert!(peak > 0.1, "{waveform} peak {peak}");
        }
    }

    #[test]
    fn custom_wave_is_normalized() {
        let buffer = render(Waveform::Custom(PeriodicWave::default()), 8000.0, 0.1);
        // cos(0) + 0.5 cos(0) is the wave's peak, scaled to the sweep gain.
        assert!((buffer.samples()[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn rendering_is_deterministic() {
        let a = render(Waveform::Square, 8000.0, 0.1);
        let b = render(Waveform::Square, 8000.0, 0.1);
        assert_eq!(a, b);
    }

    #[test]
    fn zero_frames_is_rejected() {
        let sweep = build_sweep(8000.0, 1.0).unwrap();
        let err = OscillatorRenderer::new(Waveform::Sine)
            .configure(&sweep, 0)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { .. }));
    }

    #[test]
    fn periodic_wave_needs_matching_coefficients() {
        assert!(PeriodicWave::new(vec![0.0, 1.0], vec![0.0]).is_err());
        assert!(PeriodicWave::new(vec![0.0], vec![0.0]).is_err());
        let wave = PeriodicWave::new(vec![0.0, 0.0], vec![0.0, 1.0]).unwrap();
        assert_eq!(wave.imag(), &[0.0f32, 1.0]);
    }

    #[test]
    fn waveform_names_round_trip() {
        for waveform in Waveform::all() {
            assert_eq!(waveform.name().parse::<Waveform>().unwrap(), waveform);
        }
        assert_eq!(Waveform::Triangle.test_id(), "oscillator-triangle");
        let err = "noise".parse::<Waveform>().unwrap_err();
        assert_eq!(err, UnknownWaveform("noise".to_owned()));
    }
}
