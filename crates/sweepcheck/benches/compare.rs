//! Benchmarks for the comparator and the built-in oscillator.

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use sweepcheck::{
    OscillatorRenderer, RenderEngine, RenderJob, SampleBuffer, Thresholds, Waveform, build_sweep,
    compare,
};

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

fn bench_compare(c: &mut Criterion) {
    let mut group = c.benchmark_group("compare");

    // A stock 4 s sweep at 44.1kHz.
    let frames = 176_400;
    let rendered = SampleBuffer::new(
        (0..frames).map(|i| (i as f32 * 0.01).sin() * 0.5).collect(),
        44_100,
    );
    let reference = rendered.quantized();
    let thresholds = Thresholds::new(80.0, 1.0 / 32768.0, frames);

    group.bench_function("44k_4s", |b| {
        b.iter(|| compare(black_box(&reference), black_box(&rendered), &thresholds).unwrap());
    });

    group.finish();
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    group.sample_size(10);

    let sweep = build_sweep(16_000.0, 0.5).unwrap();
    for waveform in [Waveform::Sine, Waveform::Square] {
        let mut engine = OscillatorRenderer::new(waveform.clone());
        group.bench_function(format!("{waveform}_16k_500ms"), |b| {
            b.iter(|| {
                engine
                    .configure(black_box(&sweep), sweep.num_frames())
                    .unwrap()
                    .render()
                    .unwrap()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_compare, bench_render);
criterion_main!(benches);
