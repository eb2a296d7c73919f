//! Benchmarks for the ADSR envelope generator.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use polysynth::dsp::envelope::{AdsrParams, EnvelopeGenerator};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/envelope");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Attack phase (ramping up)
        let mut env = EnvelopeGenerator::new(SAMPLE_RATE, AdsrParams::new(10.0, 0.1, 0.7, 0.3));
        env.note_on();
        group.bench_with_input(BenchmarkId::new("attack", size), &size, |b, _| {
            b.iter(|| {
                env.render(black_box(&mut buffer));
            })
        });

        // Sustain phase (holding steady)
        let mut env = EnvelopeGenerator::new(SAMPLE_RATE, AdsrParams::new(0.001, 0.001, 0.7, 0.3));
        env.note_on();
        // Advance past attack/decay
        for _ in 0..200 {
            env.next_sample();
        }
        group.bench_with_input(BenchmarkId::new("sustain", size), &size, |b, _| {
            b.iter(|| {
                env.render(black_box(&mut buffer));
            })
        });

        // Release phase (ramping down), re-triggered so it never goes idle
        let mut env = EnvelopeGenerator::new(SAMPLE_RATE, AdsrParams::new(0.0, 0.0, 1.0, 10.0));
        group.bench_with_input(BenchmarkId::new("release", size), &size, |b, _| {
            b.iter(|| {
                env.note_on();
                env.next_sample();
                env.note_off();
                env.render(black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
