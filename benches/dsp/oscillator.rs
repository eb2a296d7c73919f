//! Benchmarks for oscillator voices, one per waveform.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use polysynth::{
    synth::voice::{OscillatorVoice, SynthVoice},
    AdsrParams, Waveform,
};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_oscillator(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/oscillator");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        for waveform in Waveform::ALL {
            // sustain-only envelope so the voice keeps sounding
            let mut voice =
                OscillatorVoice::new(0, SAMPLE_RATE, waveform, AdsrParams::new(0.0, 0.0, 1.0, 1.0))
                    .expect("valid sample rate");
            voice.start(69, 1.0, 0);

            let name = format!("{waveform:?}").to_lowercase();
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    buffer.fill(0.0);
                    voice.render_add(black_box(&mut buffer));
                })
            });
        }
    }

    group.finish();
}
