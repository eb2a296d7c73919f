//! Benchmarks for the resonant low-pass biquad.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use polysynth::dsp::filter::{FilterCoefficients, FilterParams, FilterStage};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/filter");

    // Coefficient recomputation happens once per parameter change
    group.bench_function("coefficients", |b| {
        b.iter(|| {
            FilterCoefficients::low_pass(
                black_box(SAMPLE_RATE),
                black_box(FilterParams::new(1_234.0, 2.0)),
            )
        })
    });

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|i| ((i * 7) % 13) as f32 / 13.0 - 0.5).collect();
        let mut buffer = input.clone();

        let mut stage = FilterStage::new(SAMPLE_RATE, 1, FilterParams::new(1_000.0, 0.7));
        group.bench_with_input(BenchmarkId::new("lowpass_mono", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                stage.process_channel(0, black_box(&mut buffer));
            })
        });

        let mut stage = FilterStage::new(SAMPLE_RATE, 1, FilterParams::new(800.0, 12.0));
        group.bench_with_input(BenchmarkId::new("lowpass_resonant", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                stage.process_channel(0, black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
