//! Exponential oscillator sweep description.
//!
//! The sweep starts at [`START_FREQUENCY_HZ`] and rises exponentially to
//! [`NYQUIST_MARGIN_HZ`] above Nyquist, so the last part of every render
//! checks that the engine produces silence instead of folding energy back
//! into the representable band. Reference files are keyed to these
//! constants.

use crate::error::Error;

/// Sample rate used by the stock oscillator references.
pub const DEFAULT_SAMPLE_RATE_HZ: u32 = 44_100;
/// Sweep length used by the stock oscillator references.
pub const DEFAULT_DURATION_SECONDS: f64 = 4.0;
/// Frequency at `t = 0`.
pub const START_FREQUENCY_HZ: f64 = 10.0;
/// How far past Nyquist the sweep ends.
pub const NYQUIST_MARGIN_HZ: f64 = 2000.0;
/// Attenuation applied to the oscillator output to stay clear of full scale.
pub const GAIN_SCALE: f32 = 0.5;

/// Parameters of one exponential frequency sweep.
///
/// Invariants:
/// - `sample_rate > 0` and `duration_seconds > 0`, both finite.
/// - `start_frequency < end_frequency`.
/// - `gain_scale` is in `(0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepConfig {
    sample_rate: f64,
    duration_seconds: f64,
    start_frequency: f64,
    end_frequency: f64,
    gain_scale: f32,
}

/// Builds the sweep for a render at `sample_rate` lasting `duration_seconds`.
pub fn build_sweep(sample_rate: f64, duration_seconds: f64) -> Result<SweepConfig, Error> {
    check_positive("sample rate", sample_rate)?;
    check_positive("duration", duration_seconds)?;

    let nyquist = 0.5 * sample_rate;
    Ok(SweepConfig {
        sample_rate,
        duration_seconds,
        start_frequency: START_FREQUENCY_HZ,
        end_frequency: nyquist + NYQUIST_MARGIN_HZ,
        gain_scale: GAIN_SCALE,
    })
}

fn check_positive(name: &'static str, value: f64) -> Result<(), Error> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidParameter { name, value })
    }
}

impl SweepConfig {
    #[inline]
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// The sample rate rounded to whole Hz, as stored in audio files.
    #[inline]
    pub fn sample_rate_hz(&self) -> u32 {
        self.sample_rate.round() as u32
    }

    #[inline]
    pub fn nyquist(&self) -> f64 {
        0.5 * self.sample_rate
    }

    #[inline]
    pub fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }

    #[inline]
    pub fn start_frequency(&self) -> f64 {
        self.start_frequency
    }

    #[inline]
    pub fn end_frequency(&self) -> f64 {
        self.end_frequency
    }

    #[inline]
    pub fn gain_scale(&self) -> f32 {
        self.gain_scale
    }

    /// Number of frames covering the whole sweep.
    pub fn num_frames(&self) -> usize {
        (self.sample_rate * self.duration_seconds).round() as usize
    }

    /// Instantaneous frequency at time `t` in seconds.
    ///
    /// Linear in log-frequency: `f0 * (f1 / f0)^(t / T)`. Held at the start
    /// frequency before `t = 0` and at the end frequency after `t = T`.
    pub fn frequency_at(&self, t: f64) -> f64 {
        if t <= 0.0 {
            return self.start_frequency;
        }
        if t >= self.duration_seconds {
            return self.end_frequency;
        }
        let ratio = self.end_frequency / self.start_frequency;
        self.start_frequency * ratio.powf(t / self.duration_seconds)
    }
}
