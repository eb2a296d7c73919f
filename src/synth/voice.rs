use crate::{
    dsp::{
        envelope::{AdsrParams, EnvelopeGenerator, EnvelopeStage},
        oscillator::{advance_phase, phase_increment, Waveform},
    },
    error::SynthError,
    io::converter::midi_note_to_freq,
    validate_sample_rate,
};

/// Fixed per-voice gain so a full pool at full velocity stays clear of 0 dBFS.
pub const VOICE_GAIN: f32 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Free,      // Available for allocation
    Active,    // Playing, envelope in attack/decay/sustain
    Releasing, // Key released, envelope in release phase
}

/// What the voice pool needs from a voice.
///
/// The pool never asks what concrete kind of voice it holds; anything that
/// can start, stop, render and report its lifecycle can be pooled. Parameter
/// broadcasts are optional capabilities with no-op defaults.
pub trait SynthVoice: Send {
    /// Begin `note` at `velocity` (0..=1). `age` orders voices for stealing.
    fn start(&mut self, note: u8, velocity: f32, age: u64);

    /// Release the note, or cut it dead when `allow_tail_off` is false.
    fn stop(&mut self, allow_tail_off: bool);

    /// Produce the next mono sample. Silent voices return 0.0.
    fn render_sample(&mut self) -> f32;

    fn state(&self) -> VoiceState;

    fn note(&self) -> u8;

    fn age(&self) -> u64;

    /// Current envelope level, used to pick the quietest releasing voice.
    fn level(&self) -> f32;

    fn set_sample_rate(&mut self, sample_rate: f32);

    fn set_waveform(&mut self, _waveform: Waveform) {}

    fn set_envelope(&mut self, _params: AdsrParams) {}

    fn is_active(&self) -> bool {
        self.state() != VoiceState::Free
    }

    /// Add `out.len()` samples of this voice onto `out`.
    fn render_add(&mut self, out: &mut [f32]) {
        for sample in out.iter_mut() {
            *sample += self.render_sample();
        }
    }
}

/// A single oscillator voice: one waveform, one ADSR, one note at a time.
pub struct OscillatorVoice {
    id: usize,
    note: u8,
    velocity: f32,
    age: u64,

    waveform: Waveform,
    sample_rate: f32,
    frequency: f32,
    phase: f32,
    phase_increment: f32,
    amplitude: f32,

    envelope: EnvelopeGenerator,
}

impl OscillatorVoice {
    /// Fails on a sample rate outside the supported range.
    pub fn new(
        id: usize,
        sample_rate: f32,
        waveform: Waveform,
        envelope: AdsrParams,
    ) -> Result<Self, SynthError> {
        let sample_rate = validate_sample_rate(sample_rate)?;
        Ok(Self {
            id,
            note: 0,
            velocity: 0.0,
            age: 0,
            waveform,
            sample_rate,
            frequency: 0.0,
            phase: 0.0,
            phase_increment: 0.0,
            amplitude: 0.0,
            envelope: EnvelopeGenerator::new(sample_rate, envelope),
        })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    pub fn phase_increment(&self) -> f32 {
        self.phase_increment
    }

    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }

    pub fn envelope(&self) -> &EnvelopeGenerator {
        &self.envelope
    }
}

impl SynthVoice for OscillatorVoice {
    fn start(&mut self, note: u8, velocity: f32, age: u64) {
        let note = note.min(127);
        let velocity = if velocity.is_nan() {
            0.0
        } else {
            velocity.clamp(0.0, 1.0)
        };

        self.note = note;
        self.velocity = velocity;
        self.age = age;

        self.frequency = midi_note_to_freq(note);
        self.phase_increment = phase_increment(self.frequency, self.sample_rate);
        self.phase = 0.0;
        self.amplitude = velocity * VOICE_GAIN;

        self.envelope.note_on();
    }

    fn stop(&mut self, allow_tail_off: bool) {
        if allow_tail_off {
            self.envelope.note_off();
        } else {
            self.envelope.reset();
        }
    }

    #[inline]
    fn render_sample(&mut self) -> f32 {
        if !self.envelope.is_active() {
            return 0.0;
        }

        let raw = self.waveform.sample(self.phase);
        let out = raw * self.amplitude * self.envelope.next_sample();
        self.phase = advance_phase(self.phase, self.phase_increment);
        out
    }

    fn state(&self) -> VoiceState {
        match self.envelope.stage() {
            EnvelopeStage::Idle => VoiceState::Free,
            EnvelopeStage::Release => VoiceState::Releasing,
            EnvelopeStage::Attack | EnvelopeStage::Decay | EnvelopeStage::Sustain => {
                VoiceState::Active
            }
        }
    }

    fn note(&self) -> u8 {
        self.note
    }

    fn age(&self) -> u64 {
        self.age
    }

    fn level(&self) -> f32 {
        self.envelope.level()
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.phase_increment = phase_increment(self.frequency, sample_rate);
        self.envelope.set_sample_rate(sample_rate);
    }

    /// Takes effect on the next sample; phase is left where it is.
    fn set_waveform(&mut self, waveform: Waveform) {
        self.waveform = waveform;
    }

    fn set_envelope(&mut self, params: AdsrParams) {
        self.envelope.set_params(params);
    }
}
