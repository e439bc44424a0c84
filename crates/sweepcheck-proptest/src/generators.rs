//! Strategies for generating audio buffers and sweep parameters.

use std::f32::consts::TAU;
use std::ops::Range;

use proptest::prelude::*;

/// Sample rates commonly used for rendering.
pub const SAMPLE_RATES: &[u32] = &[8_000, 16_000, 22_050, 32_000, 44_100, 48_000, 96_000];

/// A single full-scale float sample.
pub fn audio_sample() -> impl Strategy<Value = f32> {
    -1.0f32..=1.0
}

/// A signal of exactly `len` full-scale samples.
pub fn audio_samples(len: usize) -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec(audio_sample(), len)
}

/// A signal whose length is drawn from `len`.
pub fn audio_signal(len: Range<usize>) -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec(audio_sample(), len)
}

/// A sine tone of `len` samples with random frequency, amplitude and phase.
pub fn sine_signal(sample_rate: u32, len: usize) -> impl Strategy<Value = Vec<f32>> {
    let nyquist = sample_rate as f32 / 2.0;
    (20.0f32..nyquist, 0.01f32..=1.0, 0.0f32..TAU).prop_map(move |(freq, amplitude, phase)| {
        (0..len)
            .map(|n| amplitude * (TAU * freq * n as f32 / sample_rate as f32 + phase).sin())
            .collect()
    })
}

/// A signal with a valid index into it, for single-sample perturbations.
pub fn signal_with_index(len: Range<usize>) -> impl Strategy<Value = (Vec<f32>, usize)> {
    audio_signal(len).prop_flat_map(|signal| {
        let len = signal.len();
        (Just(signal), 0..len)
    })
}

/// Two equal-length signals.
pub fn signal_pair(len: Range<usize>) -> impl Strategy<Value = (Vec<f32>, Vec<f32>)> {
    len.prop_flat_map(|len| (audio_samples(len), audio_samples(len)))
}

/// Two signals of different, non-zero lengths.
pub fn mismatched_pair(len: Range<usize>) -> impl Strategy<Value = (Vec<f32>, Vec<f32>)> {
    let start = len.start.max(1);
    (start..len.end, start..len.end)
        .prop_filter("lengths must differ", |(a, b)| a != b)
        .prop_flat_map(|(a, b)| (audio_samples(a), audio_samples(b)))
}

/// One of [`SAMPLE_RATES`].
pub fn sample_rate() -> impl Strategy<Value = u32> {
    prop::sample::select(SAMPLE_RATES)
}

/// Any positive, finite sweep sample rate in Hz.
pub fn sweep_sample_rate() -> impl Strategy<Value = f64> {
    3_000.0f64..384_000.0
}

/// Any positive, finite sweep duration in seconds.
pub fn sweep_duration() -> impl Strategy<Value = f64> {
    0.001f64..60.0
}

/// Values a sweep must reject: zero, negative, or not finite.
pub fn invalid_sweep_parameter() -> impl Strategy<Value = f64> {
    prop_oneof![
        Just(0.0),
        Just(-0.0),
        Just(f64::NAN),
        Just(f64::INFINITY),
        Just(f64::NEG_INFINITY),
        -1.0e6f64..0.0,
    ]
}
