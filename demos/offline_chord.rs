/// Offline rendering: play a chord, steal a voice, sweep the filter, release
use polysynth::{synth::voice::SynthVoice, AdsrParams, AudioBlock, SynthConfig, Waveform};

fn main() -> Result<(), polysynth::SynthError> {
    println!("=== Offline Chord ===\n");

    let sample_rate = 48_000.0;
    let block_size = 256;

    let (mut synth, mut handle) = SynthConfig::new()
        .sample_rate(sample_rate)
        .voices(3)
        .waveform(Waveform::Sawtooth)
        .envelope(AdsrParams::new(0.01, 0.2, 0.6, 0.3))
        .build()?;

    println!("Created synth with {} voices\n", synth.voice_count());

    let mut block = AudioBlock::new(synth.num_channels(), block_size);
    let mut render = |blocks: usize, synth: &mut polysynth::Synth| {
        let mut peak = 0.0f32;
        for _ in 0..blocks {
            synth.process_block(&mut block);
            peak = peak.max(block.peak());
        }
        peak
    };

    println!("Playing C major chord (60, 64, 67)");
    for note in [60, 64, 67] {
        handle.note_on(note, 0.8)?;
    }
    let peak = render(40, &mut synth);
    println!("  active voices: {}, peak {:.3}", synth.active_voices(), peak);

    println!("\nAdding B4 (71) to a full pool steals the oldest voice");
    handle.note_on(71, 0.8)?;
    render(1, &mut synth);
    let mut notes: Vec<u8> = synth
        .pool()
        .voices()
        .iter()
        .filter(|v| v.is_active())
        .map(|v| v.note())
        .collect();
    notes.sort_unstable();
    println!("  sounding notes: {:?}", notes);

    println!("\nSweeping cutoff down");
    for cutoff in [4000.0, 2000.0, 1000.0, 500.0, 250.0] {
        handle.set_filter_parameters(cutoff, 4.0);
        let peak = render(20, &mut synth);
        println!("  cutoff {:>6.0} Hz  peak {:.3}", cutoff, peak);
    }

    println!("\nReleasing everything");
    handle.all_notes_off(true)?;
    let mut blocks = 0;
    while synth.active_voices() > 0 {
        render(1, &mut synth);
        blocks += 1;
    }
    println!(
        "  silent after {} blocks ({:.0} ms)",
        blocks,
        blocks as f32 * block_size as f32 / sample_rate * 1000.0
    );

    Ok(())
}
