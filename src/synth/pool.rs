use crate::{
    dsp::{envelope::AdsrParams, oscillator::Waveform},
    error::SynthError,
    synth::{
        message::{NoteEvent, NoteKind, SynthMessage},
        voice::{OscillatorVoice, SynthVoice, VoiceState},
    },
    validate_sample_rate,
};

/*
Voice Allocation
================

The pool is a fixed arena of voices created once. Notes are assigned to
voices, never the other way round: nothing is allocated or dropped after
construction.

Note-on picks, in order:

  1. the first voice that is not sounding at all
  2. the releasing voice with the lowest envelope level
     (ties: the one started longest ago)
  3. the voice started longest ago

Step 3 always has an answer because the constructor refuses an empty pool,
so allocation is a total function over a non-empty slice and never fails.

Ages come from a counter bumped on every note-on, so two notes started in
the same block still have a strict order.

Note-off releases every sounding voice playing that note number, or does
nothing if none is.
*/

pub struct VoicePool<V: SynthVoice = OscillatorVoice> {
    voices: Vec<V>,
    note_counter: u64,
}

impl VoicePool<OscillatorVoice> {
    /// `size` oscillator voices sharing one waveform and envelope shape.
    pub fn new(
        sample_rate: f32,
        size: usize,
        waveform: Waveform,
        envelope: AdsrParams,
    ) -> Result<Self, SynthError> {
        let voices = (0..size)
            .map(|id| OscillatorVoice::new(id, sample_rate, waveform, envelope))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_voices(voices)
    }
}

impl<V: SynthVoice> VoicePool<V> {
    pub fn from_voices(voices: Vec<V>) -> Result<Self, SynthError> {
        if voices.is_empty() {
            return Err(SynthError::EmptyVoicePool);
        }

        log::debug!("voice pool ready with {} voices", voices.len());
        Ok(Self {
            voices,
            note_counter: 0,
        })
    }

    pub fn handle_message(&mut self, message: SynthMessage) {
        match message {
            SynthMessage::Note(event) => self.handle_event(event),
            SynthMessage::AllNotesOff { allow_tail_off } => self.all_notes_off(allow_tail_off),
        }
    }

    pub fn handle_event(&mut self, event: NoteEvent) {
        let event = event.clamped();
        match event.kind {
            NoteKind::NoteOn => {
                let age = self.note_counter;
                self.note_counter += 1;

                let idx = self.allocate_index();
                self.voices[idx].start(event.note, event.velocity, age);
            }
            NoteKind::NoteOff => {
                for voice in &mut self.voices {
                    if voice.is_active() && voice.note() == event.note {
                        voice.stop(event.allow_tail_off);
                    }
                }
            }
        }
    }

    pub fn all_notes_off(&mut self, allow_tail_off: bool) {
        for voice in &mut self.voices {
            if voice.is_active() {
                voice.stop(allow_tail_off);
            }
        }
    }

    fn allocate_index(&self) -> usize {
        if let Some(idx) = self.voices.iter().position(|v| !v.is_active()) {
            return idx;
        }

        let quietest_releasing = self
            .voices
            .iter()
            .enumerate()
            .filter(|(_, v)| v.state() == VoiceState::Releasing)
            .min_by(|(_, a), (_, b)| {
                a.level()
                    .total_cmp(&b.level())
                    .then_with(|| a.age().cmp(&b.age()))
            })
            .map(|(idx, _)| idx);
        if let Some(idx) = quietest_releasing {
            return idx;
        }

        // non-empty by construction, so index 0 is a valid starting candidate
        (1..self.voices.len()).fold(0, |oldest, idx| {
            if self.voices[idx].age() < self.voices[oldest].age() {
                idx
            } else {
                oldest
            }
        })
    }

    /// Overwrite `out` with the mono sum of every voice.
    pub fn render_block(&mut self, out: &mut [f32]) {
        out.fill(0.0);
        for voice in &mut self.voices {
            if voice.is_active() {
                voice.render_add(out);
            }
        }
    }

    pub fn set_waveform(&mut self, waveform: Waveform) {
        for voice in &mut self.voices {
            voice.set_waveform(waveform);
        }
    }

    pub fn set_envelope(&mut self, params: AdsrParams) {
        for voice in &mut self.voices {
            voice.set_envelope(params);
        }
    }

    /// Retune every voice. Rejected rates leave the pool untouched.
    pub fn set_sample_rate(&mut self, sample_rate: f32) -> Result<(), SynthError> {
        let sample_rate = validate_sample_rate(sample_rate)?;
        for voice in &mut self.voices {
            voice.set_sample_rate(sample_rate);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.voices.iter().filter(|v| v.is_active()).count()
    }

    pub fn voices(&self) -> &[V] {
        &self.voices
    }

    pub fn voice_mut(&mut self, index: usize) -> Option<&mut V> {
        self.voices.get_mut(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 48_000.0;

    fn pool(size: usize) -> VoicePool {
        VoicePool::new(
            SAMPLE_RATE,
            size,
            Waveform::Sine,
            AdsrParams::new(0.01, 0.1, 0.7, 0.2),
        )
        .expect("non-empty pool")
    }

    fn sounding_notes(pool: &VoicePool) -> Vec<u8> {
        let mut notes: Vec<u8> = pool
            .voices()
            .iter()
            .filter(|v| v.is_active())
            .map(|v| v.note())
            .collect();
        notes.sort_unstable();
        notes
    }

    #[test]
    fn empty_pool_is_rejected() {
        let result = VoicePool::new(SAMPLE_RATE, 0, Waveform::Sine, AdsrParams::default());
        assert!(matches!(result, Err(SynthError::EmptyVoicePool)));
    }

    #[test]
    fn unusable_sample_rate_is_rejected() {
        let result = VoicePool::new(0.0, 4, Waveform::Sine, AdsrParams::default());
        assert_eq!(result.err(), Some(SynthError::InvalidSampleRate(0.0)));

        let mut pool = pool(2);
        pool.handle_event(NoteEvent::note_on(69, 1.0));
        let increment = pool.voices()[0].phase_increment();
        assert!(pool.set_sample_rate(f32::NAN).is_err());
        assert_eq!(pool.voices()[0].phase_increment(), increment);
        assert!(pool.set_sample_rate(96_000.0).is_ok());
    }

    #[test]
    fn fifth_note_steals_the_oldest_of_four() {
        let mut pool = pool(4);
        for note in [60, 62, 64, 65, 67] {
            pool.handle_event(NoteEvent::note_on(note, 0.8));
            assert!(pool.active_count() <= 4);
        }

        assert_eq!(pool.active_count(), 4);
        assert_eq!(sounding_notes(&pool), vec![62, 64, 65, 67]);
    }

    #[test]
    fn quietest_releasing_voice_is_stolen_first() {
        let mut pool = pool(3);
        let mut scratch = vec![0.0; 256];

        for note in [60, 64, 67] {
            pool.handle_event(NoteEvent::note_on(note, 1.0));
        }
        // let the attacks finish
        for _ in 0..4 {
            pool.render_block(&mut scratch);
        }

        pool.handle_event(NoteEvent::note_off(64, true));
        pool.render_block(&mut scratch);
        pool.handle_event(NoteEvent::note_off(67, true));
        pool.render_block(&mut scratch);

        // 64 has been releasing longer, so it is quieter than 67
        pool.handle_event(NoteEvent::note_on(72, 1.0));
        assert_eq!(sounding_notes(&pool), vec![60, 67, 72]);
    }

    #[test]
    fn freed_voice_is_reused_before_stealing() {
        let mut pool = pool(2);
        pool.handle_event(NoteEvent::note_on(60, 1.0));
        pool.handle_event(NoteEvent::note_on(62, 1.0));
        pool.handle_event(NoteEvent::note_off(60, false));
        pool.handle_event(NoteEvent::note_on(65, 1.0));

        assert_eq!(sounding_notes(&pool), vec![62, 65]);
    }

    #[test]
    fn note_off_without_match_is_a_no_op() {
        let mut pool = pool(4);
        pool.handle_event(NoteEvent::note_on(60, 1.0));
        pool.handle_event(NoteEvent::note_off(61, true));
        assert_eq!(pool.voices()[0].state(), VoiceState::Active);
    }

    #[test]
    fn note_off_releases_every_matching_voice() {
        let mut pool = pool(4);
        pool.handle_event(NoteEvent::note_on(60, 1.0));
        pool.handle_event(NoteEvent::note_on(60, 0.5));
        pool.handle_event(NoteEvent::note_on(63, 0.5));
        pool.handle_event(NoteEvent::note_off(60, true));

        let releasing = pool
            .voices()
            .iter()
            .filter(|v| v.state() == VoiceState::Releasing)
            .count();
        assert_eq!(releasing, 2);
        assert_eq!(pool.voices()[2].state(), VoiceState::Active);
    }

    #[test]
    fn all_notes_off_stops_everything() {
        let mut pool = pool(4);
        for note in [48, 52, 55] {
            pool.handle_event(NoteEvent::note_on(note, 1.0));
        }
        pool.handle_message(SynthMessage::AllNotesOff {
            allow_tail_off: false,
        });
        assert_eq!(pool.active_count(), 0);
    }

    #[test]
    fn render_sums_voices_and_is_silent_when_idle() {
        let mut pool = pool(4);
        let mut out = vec![1.0; 128];
        pool.render_block(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));

        pool.handle_event(NoteEvent::note_on(69, 1.0));
        pool.render_block(&mut out);
        let single = out.clone();

        let mut chord = self::pool(4);
        chord.handle_event(NoteEvent::note_on(69, 1.0));
        chord.handle_event(NoteEvent::note_on(69, 1.0));
        chord.render_block(&mut out);

        for (two, one) in out.iter().zip(&single) {
            assert!((two - 2.0 * one).abs() < 1e-6);
        }
    }

    #[test]
    fn broadcast_reaches_every_voice() {
        let mut pool = pool(4);
        pool.set_waveform(Waveform::Triangle);
        pool.set_envelope(AdsrParams::new(1.0, 1.0, 0.2, 1.0));
        for voice in pool.voices() {
            assert_eq!(voice.waveform(), Waveform::Triangle);
            assert_eq!(voice.envelope().params().sustain, 0.2);
        }
    }
}
