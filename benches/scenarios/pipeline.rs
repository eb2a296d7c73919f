//! Benchmarks for the full render pipeline.
//!
//! Control traffic goes through the handle each iteration, as it would from
//! a UI thread, so the queue drain and parameter pickup are included.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use polysynth::{AudioBlock, SynthConfig, Waveform};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/pipeline");

    for &size in BLOCK_SIZES {
        let (mut synth, mut handle) = SynthConfig::new()
            .sample_rate(SAMPLE_RATE)
            .voices(8)
            .waveform(Waveform::Sawtooth)
            .build()
            .expect("valid config");
        for note in [48, 55, 60, 64, 67, 71, 74, 79] {
            handle.note_on(note, 0.8).expect("queue has room");
        }

        let mut block = AudioBlock::new(2, size);
        group.bench_with_input(BenchmarkId::new("stereo_8_voices", size), &size, |b, _| {
            b.iter(|| {
                synth.process_block(black_box(&mut block));
            })
        });

        // Filter sweep: new coefficients every block
        let mut cutoff = 200.0f32;
        group.bench_with_input(BenchmarkId::new("cutoff_sweep", size), &size, |b, _| {
            b.iter(|| {
                cutoff = if cutoff > 8_000.0 { 200.0 } else { cutoff * 1.05 };
                handle.set_filter_parameters(cutoff, 2.0);
                synth.process_block(black_box(&mut block));
            })
        });

        let mut interleaved = vec![0.0f32; size * 2];
        group.bench_with_input(BenchmarkId::new("interleaved", size), &size, |b, _| {
            b.iter(|| {
                synth.render_interleaved(black_box(&mut interleaved), 2);
            })
        });
    }

    group.finish();
}
