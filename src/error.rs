use thiserror::Error;

use crate::synth::message::SynthMessage;

/// Errors reported on the setup and control side.
///
/// The render path never produces one of these: everything it consumes has
/// already been validated or clamped by the time it reaches the audio thread.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SynthError {
    #[error("sample rate must be set before the synth can be built")]
    SampleRateNotSet,

    #[error("invalid sample rate {0} Hz")]
    InvalidSampleRate(f32),

    #[error("voice pool must hold at least one voice")]
    EmptyVoicePool,

    #[error("note queue capacity must be at least 1")]
    InvalidQueueCapacity,

    #[error("invalid output channel count {0}")]
    InvalidChannelCount(usize),

    #[error("voice index {index} out of range for a pool of {voices} voices")]
    VoiceIndexOutOfRange { index: usize, voices: usize },

    #[error("note queue full, dropped {0:?}")]
    QueueFull(SynthMessage),
}
