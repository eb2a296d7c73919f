use std::f32::consts::TAU;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
Naive Waveforms
===============

All four shapes are computed directly from the phase angle in [0, 2π):

  Sine:      sin(φ)
  Square:    +1 while sin(φ) ≥ 0, otherwise -1
  Sawtooth:  2·(φ/2π) − 1                 rises from -1 to +1 once per cycle
  Triangle:  2·|2·(φ/2π) − 1| − 1          +1 at φ=0, -1 at φ=π, back to +1

No band-limiting is applied, so square and sawtooth alias audibly at high
pitches. The resonant low-pass after the mix is what tames them.
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Waveform {
    #[default]
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl Waveform {
    pub const ALL: [Waveform; 4] = [
        Waveform::Sine,
        Waveform::Square,
        Waveform::Sawtooth,
        Waveform::Triangle,
    ];

    /// Map a selector index (0 = Sine .. 3 = Triangle). Anything else is Sine.
    pub fn from_index(index: u32) -> Self {
        match index {
            1 => Waveform::Square,
            2 => Waveform::Sawtooth,
            3 => Waveform::Triangle,
            _ => Waveform::Sine,
        }
    }

    pub fn index(self) -> u32 {
        match self {
            Waveform::Sine => 0,
            Waveform::Square => 1,
            Waveform::Sawtooth => 2,
            Waveform::Triangle => 3,
        }
    }

    /// Raw waveform value in [-1, 1] at `phase` radians.
    #[inline]
    pub fn sample(self, phase: f32) -> f32 {
        match self {
            Waveform::Sine => phase.sin(),
            Waveform::Square => {
                if phase.sin() >= 0.0 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Sawtooth => 2.0 * (phase / TAU) - 1.0,
            Waveform::Triangle => 2.0 * (2.0 * (phase / TAU) - 1.0).abs() - 1.0,
        }
    }
}

impl std::str::FromStr for Waveform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sine" | "sin" => Ok(Waveform::Sine),
            "square" | "sq" => Ok(Waveform::Square),
            "sawtooth" | "saw" => Ok(Waveform::Sawtooth),
            "triangle" | "tri" => Ok(Waveform::Triangle),
            other => Err(format!("unknown waveform '{other}'")),
        }
    }
}

/// Radians per sample for a tone at `frequency` Hz.
#[inline]
pub fn phase_increment(frequency: f32, sample_rate: f32) -> f32 {
    TAU * frequency / sample_rate
}

/// Advance `phase` by `increment`, wrapping into [0, 2π).
#[inline]
pub fn advance_phase(phase: f32, increment: f32) -> f32 {
    let next = phase + increment;
    if next >= TAU {
        // one subtraction covers every increment below Nyquist
        let wrapped = next - TAU;
        if wrapped >= TAU {
            wrapped.rem_euclid(TAU)
        } else {
            wrapped
        }
    } else {
        next
    }
}
