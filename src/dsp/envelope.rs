#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
ADSR Envelope Generator
=======================

Every voice owns one of these. It produces a control signal in [0, 1] that
multiplies the oscillator output, giving each note its loudness contour.

Vocabulary
----------

  level       The envelope's current output value (0.0 to 1.0).

  stage       Which phase of the envelope we're in: Idle, Attack, Decay,
              Sustain, or Release.

  gate        note_on raises the gate (Attack), note_off lowers it (Release).

  step        How much `level` moves per sample. Derived from the stage
              duration and the sample rate, recomputed every sample.


The Shape: Linear Ramps
-----------------------

  Level
    1.0 ┐     ╱╲
        │    ╱  ╲___________
    S   │   ╱               ╲
        │  ╱                 ╲
    0.0 └─╱───────────────────╲──→ Time
        Attack Decay  Sustain  Release

All ramps are straight lines:

    attack step  = 1.0 / (attack_time * sample_rate)
    decay step   = (1.0 - sustain) / (decay_time * sample_rate)
    release step = level_at_note_off / (release_time * sample_rate)

A stage duration shorter than one sample period is treated as exactly one
sample, so a zero attack jumps to full level on the first sample instead of
dividing by zero.


The State Machine
-----------------

    Idle ──note_on──→ Attack ──level=1──→ Decay ──level=S──→ Sustain
     ↑                  │                   │                  │
     │                  └───── note_off ────┴──────────────────┘
     │                                      ↓
     └──────────── level=0 ─────────── Release

note_on from ANY stage re-enters Attack without touching the level, so a
retriggered note ramps up from wherever it currently is (no click).
note_off from Attack, Decay or Sustain snapshots the current level and
ramps it to zero. note_off while Idle or already releasing does nothing.


Parameter Changes
-----------------

Because the step is recomputed from the live parameters on every sample, a
new attack/decay/release time changes the slope of the ramp in progress
without moving the level. A new sustain level never moves the level in one
jump either: Sustain glides to it at full scale per decay time, and Decay
hands over to that glide if the new sustain lies above the current level.


Snapping
--------

Floating-point accumulation rarely lands exactly on a target. Each ramp
snaps to its target once it is within half a step of it, which makes the
transition happen on the sample the arithmetic says it should.
*/

/// Attack/decay/release times in seconds, sustain as a level in [0, 1].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdsrParams {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl AdsrParams {
    pub const fn new(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            attack,
            decay,
            sustain,
            release,
        }
    }

    /// Negative or non-finite times become zero (one sample at render time),
    /// sustain is clamped into [0, 1].
    pub fn clamped(self) -> Self {
        Self {
            attack: clamp_time(self.attack),
            decay: clamp_time(self.decay),
            sustain: if self.sustain.is_finite() {
                self.sustain.clamp(0.0, 1.0)
            } else {
                0.0
            },
            release: clamp_time(self.release),
        }
    }
}

impl Default for AdsrParams {
    fn default() -> Self {
        Self::new(0.1, 0.8, 0.8, 0.8)
    }
}

fn clamp_time(seconds: f32) -> f32 {
    if seconds.is_finite() {
        seconds.max(0.0)
    } else {
        0.0
    }
}

/// The current stage of the envelope state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStage {
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

pub struct EnvelopeGenerator {
    params: AdsrParams,
    sample_rate: f32,

    stage: EnvelopeStage,
    // accumulated in double precision so long ramps land on their targets
    level: f64,

    // level when the gate went low; the release slope is derived from it
    release_start_level: f64,
}

impl EnvelopeGenerator {
    /// An idle envelope. `sample_rate` must be positive; the engine validates
    /// it before any generator is constructed.
    pub fn new(sample_rate: f32, params: AdsrParams) -> Self {
        debug_assert!(sample_rate > 0.0);
        Self {
            params: params.clamped(),
            sample_rate,
            stage: EnvelopeStage::Idle,
            level: 0.0,
            release_start_level: 0.0,
        }
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        debug_assert!(sample_rate > 0.0);
        self.sample_rate = sample_rate;
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn set_params(&mut self, params: AdsrParams) {
        self.params = params.clamped();
    }

    pub fn params(&self) -> AdsrParams {
        self.params
    }

    pub fn set_attack(&mut self, seconds: f32) {
        self.params.attack = clamp_time(seconds);
    }

    pub fn set_decay(&mut self, seconds: f32) {
        self.params.decay = clamp_time(seconds);
    }

    pub fn set_sustain(&mut self, level: f32) {
        self.params = AdsrParams {
            sustain: level,
            ..self.params
        }
        .clamped();
    }

    pub fn set_release(&mut self, seconds: f32) {
        self.params.release = clamp_time(seconds);
    }

    /// Gate high. Enters Attack from any stage, keeping the current level.
    pub fn note_on(&mut self) {
        self.stage = EnvelopeStage::Attack;
    }

    /// Gate low. Enters Release from Attack, Decay or Sustain.
    pub fn note_off(&mut self) {
        if matches!(
            self.stage,
            EnvelopeStage::Attack | EnvelopeStage::Decay | EnvelopeStage::Sustain
        ) {
            self.release_start_level = self.level;
            self.stage = EnvelopeStage::Release;
        }
    }

    #[inline]
    fn stage_samples(&self, seconds: f32) -> f64 {
        (f64::from(seconds) * f64::from(self.sample_rate)).max(1.0)
    }

    /// Advance by one sample period and return the new level.
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        match self.stage {
            EnvelopeStage::Idle => {
                self.level = 0.0;
            }

            EnvelopeStage::Attack => {
                let step = 1.0 / self.stage_samples(self.params.attack);
                self.level += step;

                if self.level >= 1.0 - step * 0.5 {
                    self.level = 1.0;
                    self.stage = EnvelopeStage::Decay;
                }
            }

            EnvelopeStage::Decay => {
                let target = f64::from(self.params.sustain);
                if self.level < target {
                    // sustain was raised past the level; Sustain glides up to it
                    self.stage = EnvelopeStage::Sustain;
                } else {
                    let step = (1.0 - target) / self.stage_samples(self.params.decay);
                    self.level -= step;

                    if self.level <= target + step * 0.5 {
                        self.level = target;
                        self.stage = EnvelopeStage::Sustain;
                    }
                }
            }

            EnvelopeStage::Sustain => {
                let target = f64::from(self.params.sustain);
                let glide = 1.0 / self.stage_samples(self.params.decay);
                let distance = target - self.level;

                if distance.abs() <= glide * 0.5 {
                    self.level = target;
                } else {
                    self.level += glide.copysign(distance);
                }
            }

            EnvelopeStage::Release => {
                let step = self.release_start_level / self.stage_samples(self.params.release);
                self.level -= step;

                if self.level <= step * 0.5 {
                    self.level = 0.0;
                    self.stage = EnvelopeStage::Idle;
                }
            }
        }

        self.level = self.level.clamp(0.0, 1.0);
        self.level as f32
    }

    /// Render a block of envelope values into the buffer.
    pub fn render(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample();
        }
    }

    pub fn is_active(&self) -> bool {
        self.stage != EnvelopeStage::Idle
    }

    /// Drop straight to Idle at zero level.
    pub fn reset(&mut self) {
        self.stage = EnvelopeStage::Idle;
        self.level = 0.0;
        self.release_start_level = 0.0;
    }

    pub fn level(&self) -> f32 {
        self.level as f32
    }

    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }
}
