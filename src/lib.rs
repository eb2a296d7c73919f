//! A small polyphonic synthesizer core.
//!
//! Oscillator voices with linear ADSR envelopes are mixed by a stealing
//! voice pool, run through a resonant low-pass per output channel, and
//! scaled by a master gain. Control happens from any thread through a
//! [`SynthHandle`]; rendering happens on the audio thread through a
//! [`Synth`], without locks or allocation.

pub mod dsp; // Oscillators, envelopes, filters
pub mod engine; // Render pipeline and control handle
pub mod error;
pub mod io; // Buffers, MIDI decoding
pub mod synth; // Voices and polyphony

pub use dsp::{envelope::AdsrParams, filter::FilterParams, oscillator::Waveform};
pub use engine::{config::SynthConfig, Synth, SynthHandle, VoiceSelector};
pub use error::SynthError;
pub use io::AudioBlock;
pub use synth::message::{NoteEvent, SynthMessage};

/// Largest block rendered in one pass; bigger requests are chunked.
pub const MAX_BLOCK_SIZE: usize = 2048;
pub const MIN_SAMPLE_RATE: f32 = 8_000.0;
pub const MAX_SAMPLE_RATE: f32 = 768_000.0;
pub const MAX_CHANNELS: usize = 8;

pub(crate) fn validate_sample_rate(sample_rate: f32) -> Result<f32, SynthError> {
    if sample_rate.is_finite() && (MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&sample_rate) {
        Ok(sample_rate)
    } else {
        Err(SynthError::InvalidSampleRate(sample_rate))
    }
}
