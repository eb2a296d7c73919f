//! Low-level DSP primitives used by the voices and the render pipeline.
//!
//! These components are allocation-free and realtime-safe, making them safe to
//! embed directly inside voice structs. They stay focused on the
//! signal-processing math; lifecycle and routing live in `synth` and `engine`.

/// Linear attack/decay/sustain/release envelope generator.
pub mod envelope;
/// Resonant low-pass biquad, per-channel.
pub mod filter;
/// Naive sine/square/saw/triangle waveforms and phase helpers.
pub mod oscillator;

pub use envelope::EnvelopeStage;
