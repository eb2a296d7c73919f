use std::f32::consts::TAU;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::io::AudioBlock;

/*
Resonant Low-Pass Biquad
========================

A second-order IIR low-pass: everything below the cutoff passes, everything
above falls away at 12 dB per octave. Near the cutoff the response can peak
depending on Q.

Coefficients (RBJ Audio EQ Cookbook, low-pass):

    ω0    = 2π · cutoff / sample_rate
    α     = sin(ω0) / (2·Q)

    b0 = (1 − cos ω0) / 2      a0 = 1 + α
    b1 =  1 − cos ω0           a1 = −2 · cos ω0
    b2 = (1 − cos ω0) / 2      a2 = 1 − α

All five are divided by a0 once, so the per-sample update is

    y[n] = b0·x[n] + b1·x[n−1] + b2·x[n−2] − a1·y[n−1] − a2·y[n−2]

(Direct Form I: two input and two output samples of history.)

Resonance
---------

The control called "resonance" maps to Q as

    Q = 1 / (2 · resonance)

so SMALL resonance values give a tall peak (0.1 → Q 5) and large values a
heavily damped response (40 → Q 0.0125). 0.7 is close to Butterworth-flat.

Stability
---------

A cutoff at or above Nyquist puts the poles on the unit circle, so the cutoff
is clamped into [20 Hz, 0.49 · sample_rate] before the coefficients are
computed. Resonance is clamped into [0.1, 40].

Threading
---------

Coefficients are a small `Copy` struct. A parameter change computes a whole
new set and replaces the old one in a single assignment between samples, so
the per-sample loop can never see half an update.
*/

pub const MIN_CUTOFF: f32 = 20.0;
pub const MAX_CUTOFF_RATIO: f32 = 0.49;
pub const MIN_RESONANCE: f32 = 0.1;
pub const MAX_RESONANCE: f32 = 40.0;

// state values below this are flushed to zero to keep the feedback path out of
// subnormal range during silence
const DENORMAL_THRESHOLD: f32 = 1.0e-20;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterParams {
    /// Cutoff frequency in Hz
    pub cutoff: f32,
    /// Damping control, Q = 1 / (2 · resonance)
    pub resonance: f32,
}

impl FilterParams {
    pub const fn new(cutoff: f32, resonance: f32) -> Self {
        Self { cutoff, resonance }
    }

    /// Clamp both values into the stable range for `sample_rate`.
    pub fn clamped(self, sample_rate: f32) -> Self {
        let max_cutoff = (sample_rate * MAX_CUTOFF_RATIO).max(MIN_CUTOFF);
        let cutoff = if self.cutoff.is_finite() {
            self.cutoff.clamp(MIN_CUTOFF, max_cutoff)
        } else if self.cutoff == f32::INFINITY {
            max_cutoff
        } else {
            MIN_CUTOFF
        };
        let resonance = if self.resonance.is_finite() {
            self.resonance.clamp(MIN_RESONANCE, MAX_RESONANCE)
        } else if self.resonance == f32::INFINITY {
            MAX_RESONANCE
        } else {
            MIN_RESONANCE
        };

        Self { cutoff, resonance }
    }

    pub fn q(&self) -> f32 {
        1.0 / (2.0 * self.resonance)
    }
}

impl Default for FilterParams {
    fn default() -> Self {
        Self::new(1000.0, 0.7)
    }
}

/// Normalised biquad coefficients plus the (clamped) inputs they came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterCoefficients {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,

    params: FilterParams,
    sample_rate: f32,
}

impl FilterCoefficients {
    pub fn low_pass(sample_rate: f32, params: FilterParams) -> Self {
        let params = params.clamped(sample_rate);

        let omega = TAU * params.cutoff / sample_rate;
        let cos_omega = omega.cos();
        let alpha = omega.sin() / (2.0 * params.q());

        let a0_inv = 1.0 / (1.0 + alpha);
        let b1 = (1.0 - cos_omega) * a0_inv;

        Self {
            b0: b1 * 0.5,
            b1,
            b2: b1 * 0.5,
            a1: -2.0 * cos_omega * a0_inv,
            a2: (1.0 - alpha) * a0_inv,
            params,
            sample_rate,
        }
    }

    /// The coefficients as (b0, b1, b2, a1, a2).
    pub fn as_tuple(&self) -> (f32, f32, f32, f32, f32) {
        (self.b0, self.b1, self.b2, self.a1, self.a2)
    }

    pub fn cutoff(&self) -> f32 {
        self.params.cutoff
    }

    pub fn resonance(&self) -> f32 {
        self.params.resonance
    }

    pub fn params(&self) -> FilterParams {
        self.params
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }
}

/// One channel of filter state.
#[derive(Debug, Clone)]
pub struct Biquad {
    coeffs: FilterCoefficients,

    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl Biquad {
    pub fn new(coeffs: FilterCoefficients) -> Self {
        Self {
            coeffs,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    /// Swap in a new coefficient set. History is kept.
    pub fn set_coefficients(&mut self, coeffs: FilterCoefficients) {
        self.coeffs = coeffs;
    }

    pub fn coefficients(&self) -> &FilterCoefficients {
        &self.coeffs
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let c = &self.coeffs;
        let mut output =
            c.b0 * input + c.b1 * self.x1 + c.b2 * self.x2 - c.a1 * self.y1 - c.a2 * self.y2;

        if output.abs() < DENORMAL_THRESHOLD {
            output = 0.0;
        }

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }

    pub fn render(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}

/// The post-mix low-pass: one `Biquad` per output channel sharing one
/// coefficient set.
pub struct FilterStage {
    coeffs: FilterCoefficients,
    channels: Vec<Biquad>,
}

impl FilterStage {
    pub fn new(sample_rate: f32, num_channels: usize, params: FilterParams) -> Self {
        let coeffs = FilterCoefficients::low_pass(sample_rate, params);
        Self {
            coeffs,
            channels: vec![Biquad::new(coeffs); num_channels],
        }
    }

    /// Recompute coefficients and hand them to every channel.
    ///
    /// Filter history is preserved so a sweep stays continuous.
    pub fn set_parameters(&mut self, cutoff: f32, resonance: f32) {
        let coeffs =
            FilterCoefficients::low_pass(self.coeffs.sample_rate, FilterParams::new(cutoff, resonance));
        self.apply(coeffs);
    }

    /// Recompute for a new sample rate. History is cleared since it no
    /// longer describes the same signal.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        let coeffs = FilterCoefficients::low_pass(sample_rate, self.coeffs.params);
        self.apply(coeffs);
        self.reset();
    }

    fn apply(&mut self, coeffs: FilterCoefficients) {
        self.coeffs = coeffs;
        for channel in &mut self.channels {
            channel.set_coefficients(coeffs);
        }
    }

    pub fn coefficients(&self) -> &FilterCoefficients {
        &self.coeffs
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Filter one channel's samples in place. Out-of-range channels are
    /// left untouched.
    pub fn process_channel(&mut self, channel: usize, samples: &mut [f32]) {
        if let Some(biquad) = self.channels.get_mut(channel) {
            biquad.render(samples);
        }
    }

    /// Filter every channel of `block` in place, continuing each channel's
    /// state from the previous call.
    pub fn process_block(&mut self, block: &mut AudioBlock) {
        for (biquad, samples) in self.channels.iter_mut().zip(block.channels_mut()) {
            biquad.render(samples);
        }
    }

    pub fn reset(&mut self) {
        for channel in &mut self.channels {
            channel.reset();
        }
    }
}
