use std::thread;

use polysynth::{
    AdsrParams, AudioBlock, FilterParams, NoteEvent, SynthConfig, SynthError, SynthMessage,
    Waveform,
};

const SAMPLE_RATE: f32 = 48_000.0;
const BLOCK: usize = 256;

fn config() -> SynthConfig {
    SynthConfig::new()
        .sample_rate(SAMPLE_RATE)
        .envelope(AdsrParams::new(0.002, 0.01, 1.0, 0.05))
}

fn rms(samples: &[f32]) -> f32 {
    (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
}

fn sounding_notes(synth: &polysynth::Synth) -> Vec<u8> {
    use polysynth::synth::voice::SynthVoice;
    let mut notes: Vec<u8> = synth
        .pool()
        .voices()
        .iter()
        .filter(|v| v.is_active())
        .map(|v| v.note())
        .collect();
    notes.sort_unstable();
    notes
}

#[test]
fn renders_silence_with_no_notes() {
    let (mut synth, _handle) = config().build().expect("valid config");
    let mut block = AudioBlock::new(2, BLOCK);
    synth.process_block(&mut block);
    assert!(block.channels().flat_map(|c| c.iter()).all(|&s| s == 0.0));
}

#[test]
fn full_chord_stays_in_range() {
    for waveform in Waveform::ALL {
        let (mut synth, mut handle) = config().waveform(waveform).build().expect("valid config");
        for note in [48, 52, 55, 60] {
            handle.note_on(note, 1.0).expect("queue has room");
        }

        let mut block = AudioBlock::new(2, BLOCK);
        let mut peak = 0.0f32;
        for _ in 0..100 {
            synth.process_block(&mut block);
            peak = peak.max(block.peak());
        }
        assert!(peak > 0.0, "{waveform:?} is silent");
        assert!(peak <= 1.0, "{waveform:?} peaked at {peak}");
    }
}

#[test]
fn fifth_note_steals_from_a_pool_of_four() {
    let (mut synth, mut handle) = config().voices(4).build().expect("valid config");
    for note in [60, 62, 64, 65, 67] {
        handle.note_on(note, 0.8).expect("queue has room");
    }
    synth.render_block(BLOCK);

    assert_eq!(synth.active_voices(), 4);
    assert_eq!(sounding_notes(&synth), vec![62, 64, 65, 67]);
}

#[test]
fn low_pass_attenuates_notes_far_above_cutoff() {
    let measure = |note: u8| {
        let (mut synth, mut handle) = config()
            .voices(1)
            .filter(FilterParams::new(1_000.0, 0.7))
            .build()
            .expect("valid config");
        handle.note_on(note, 1.0).expect("queue has room");

        // settle attack and filter transient
        for _ in 0..20 {
            synth.render_block(BLOCK);
        }
        rms(synth.render_block(BLOCK).channel(0))
    };

    // ~196 Hz and ~9.96 kHz
    let passed = measure(55);
    let stopped = measure(123);
    assert!(passed > 0.05);
    assert!(passed / stopped > 10.0, "pass {passed} stop {stopped}");
}

#[test]
fn released_notes_fall_silent() {
    let (mut synth, mut handle) = config().build().expect("valid config");
    handle.note_on(60, 1.0).expect("queue has room");
    handle.note_on(67, 1.0).expect("queue has room");
    for _ in 0..10 {
        synth.render_block(BLOCK);
    }

    handle.note_off(60, true).expect("queue has room");
    handle.note_off(67, true).expect("queue has room");
    // 50 ms release is 2400 samples; render 0.2 s
    for _ in 0..40 {
        synth.render_block(BLOCK);
    }

    assert_eq!(synth.active_voices(), 0);
    assert!(synth.render_block(BLOCK).peak() < 1e-3);
}

#[test]
fn all_notes_off_without_tail_stops_at_the_next_block() {
    let (mut synth, mut handle) = config().build().expect("valid config");
    for note in [60, 64, 67] {
        handle.note_on(note, 1.0).expect("queue has room");
    }
    synth.render_block(BLOCK);
    assert_eq!(synth.active_voices(), 3);

    handle
        .send(SynthMessage::AllNotesOff {
            allow_tail_off: false,
        })
        .expect("queue has room");
    synth.render_block(BLOCK);
    assert_eq!(synth.active_voices(), 0);
}

#[test]
fn zero_volume_mutes_after_the_ramp() {
    let (mut synth, mut handle) = config().build().expect("valid config");
    handle.note_on(69, 1.0).expect("queue has room");
    synth.render_block(BLOCK);

    handle.set_volume(0.0);
    synth.render_block(BLOCK);
    assert_eq!(synth.render_block(BLOCK).peak(), 0.0);
    assert_eq!(synth.volume(), 0.0);
}

#[test]
fn setup_errors_are_reported_before_rendering() {
    assert!(matches!(
        SynthConfig::new().build(),
        Err(SynthError::SampleRateNotSet)
    ));
    assert!(matches!(
        config().sample_rate(0.0).build(),
        Err(SynthError::InvalidSampleRate(_))
    ));
    assert!(matches!(
        config().voices(0).build(),
        Err(SynthError::EmptyVoicePool)
    ));
}

#[test]
fn full_queue_hands_the_event_back() {
    let (mut synth, mut handle) = config().queue_capacity(2).build().expect("valid config");
    handle.note_on(60, 1.0).expect("queue has room");
    handle.note_on(62, 1.0).expect("queue has room");

    let err = handle.note_on(64, 1.0).unwrap_err();
    assert_eq!(
        err,
        SynthError::QueueFull(SynthMessage::Note(NoteEvent::note_on(64, 1.0)))
    );

    // draining makes room again
    synth.render_block(BLOCK);
    assert!(handle.note_on(64, 1.0).is_ok());
}

#[test]
fn control_and_render_run_on_separate_threads() {
    let (mut synth, mut handle) = config().voices(8).build().expect("valid config");

    let control = thread::spawn(move || {
        for note in 60..68 {
            handle.note_on(note, 0.5).expect("queue has room");
            handle.set_filter_parameters(500.0 + note as f32 * 10.0, 1.0);
        }
        handle
    });
    let handle = control.join().expect("control thread");

    let audio = thread::spawn(move || {
        let mut block = AudioBlock::new(2, BLOCK);
        synth.process_block(&mut block);
        (synth.active_voices(), synth.filter_coefficients().cutoff())
    });
    let (active, cutoff) = audio.join().expect("audio thread");

    assert_eq!(active, 8);
    assert_eq!(cutoff, 1_170.0);
    assert_eq!(handle.voice_count(), 8);
}
