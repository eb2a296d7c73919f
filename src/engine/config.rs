#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    dsp::{envelope::AdsrParams, filter::FilterParams, oscillator::Waveform},
    engine::{Synth, SynthHandle},
    error::SynthError,
    validate_sample_rate, MAX_CHANNELS,
};

/// Everything needed to build a `Synth`/`SynthHandle` pair.
///
/// The sample rate has no default: building without one is an error, which
/// keeps "rendering before the device is known" a setup-time failure.
///
/// ```
/// use polysynth::{SynthConfig, Waveform};
///
/// let (synth, handle) = SynthConfig::new()
///     .sample_rate(48_000.0)
///     .voices(8)
///     .waveform(Waveform::Triangle)
///     .build()
///     .unwrap();
/// assert_eq!(synth.voice_count(), 8);
/// assert_eq!(handle.voice_count(), 8);
/// ```
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct SynthConfig {
    pub sample_rate: Option<f32>,
    pub voices: usize,
    pub channels: usize,
    pub queue_capacity: usize,
    pub envelope: AdsrParams,
    pub waveform: Waveform,
    pub filter: FilterParams,
    pub volume: f32,
}

impl SynthConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sample_rate(mut self, sample_rate: f32) -> Self {
        self.sample_rate = Some(sample_rate);
        self
    }

    pub fn voices(mut self, voices: usize) -> Self {
        self.voices = voices;
        self
    }

    pub fn channels(mut self, channels: usize) -> Self {
        self.channels = channels;
        self
    }

    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn envelope(mut self, params: AdsrParams) -> Self {
        self.envelope = params;
        self
    }

    pub fn waveform(mut self, waveform: Waveform) -> Self {
        self.waveform = waveform;
        self
    }

    pub fn filter(mut self, params: FilterParams) -> Self {
        self.filter = params;
        self
    }

    pub fn volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }

    /// Check structural settings and return the validated sample rate.
    ///
    /// Parameter values (envelope, filter, volume) are clamped rather than
    /// rejected.
    pub fn validate(&self) -> Result<f32, SynthError> {
        let sample_rate = validate_sample_rate(self.sample_rate.ok_or(SynthError::SampleRateNotSet)?)?;

        if self.voices == 0 {
            return Err(SynthError::EmptyVoicePool);
        }
        if self.channels == 0 || self.channels > MAX_CHANNELS {
            return Err(SynthError::InvalidChannelCount(self.channels));
        }
        if self.queue_capacity == 0 {
            return Err(SynthError::InvalidQueueCapacity);
        }

        Ok(sample_rate)
    }

    pub fn build(self) -> Result<(Synth, SynthHandle), SynthError> {
        Synth::from_config(self)
    }
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            sample_rate: None,
            voices: 4,
            channels: 2,
            queue_capacity: 256,
            envelope: AdsrParams::default(),
            waveform: Waveform::Sine,
            filter: FilterParams::default(),
            volume: 1.0,
        }
    }
}
