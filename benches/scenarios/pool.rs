//! Benchmarks for the voice pool at realistic polyphony.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use polysynth::{synth::pool::VoicePool, AdsrParams, NoteEvent, Waveform};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

const CHORD: [u8; 8] = [48, 55, 60, 64, 67, 71, 74, 79];

pub fn bench_pool(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/pool");
    let envelope = AdsrParams::new(0.01, 0.1, 0.7, 0.3);

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // 8 sustained saw voices mixed to mono
        let mut pool = VoicePool::new(SAMPLE_RATE, 8, Waveform::Sawtooth, envelope)
            .expect("non-empty pool");
        for note in CHORD {
            pool.handle_event(NoteEvent::note_on(note, 0.8));
        }
        group.bench_with_input(BenchmarkId::new("render_8_voices", size), &size, |b, _| {
            b.iter(|| {
                pool.render_block(black_box(&mut buffer));
            })
        });
    }

    // Allocation cost when every note-on has to steal
    let mut pool =
        VoicePool::new(SAMPLE_RATE, 16, Waveform::Sine, envelope).expect("non-empty pool");
    for note in 0..16 {
        pool.handle_event(NoteEvent::note_on(40 + note, 0.8));
    }
    let mut note = 0u8;
    group.bench_function("steal", |b| {
        b.iter(|| {
            note = (note + 1) % 128;
            pool.handle_event(black_box(NoteEvent::note_on(note, 0.8)));
        })
    });

    group.finish();
}
