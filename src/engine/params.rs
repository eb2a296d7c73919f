use std::sync::atomic::{fence, AtomicU32, Ordering};

use crate::dsp::{envelope::AdsrParams, filter::FilterParams, oscillator::Waveform};

/*
Single-Slot Parameter Handoff
=============================

One `ParamSlot` carries one parameter group (filter, envelope, waveform,
volume) from the control thread to the audio thread. It holds only the
latest value: a burst of slider moves between two audio blocks collapses
into the last one.

The group is stored as N f32 bit patterns in `AtomicU32`s, guarded by a
sequence counter (a seqlock):

  writer                             reader (audio thread)
  ------                             ---------------------
  seq += 1        (odd: writing)     s1 = seq          bail if odd
  store words                        load words
  seq += 1        (even: done)       s2 = seq          bail if s1 != s2

The reader never waits. If it catches the writer mid-update it simply keeps
the parameters it already has and tries again on the next block, so a group
is applied whole or not at all. The writer never waits either: there is
exactly one writer per slot (the control handle, behind `&mut self`).

`last_seen` lets the reader skip groups that haven't changed since it last
applied them.
*/

pub struct ParamSlot<const N: usize> {
    seq: AtomicU32,
    words: [AtomicU32; N],
}

impl<const N: usize> ParamSlot<N> {
    pub fn new(initial: [f32; N]) -> Self {
        Self {
            seq: AtomicU32::new(0),
            words: initial.map(|v| AtomicU32::new(v.to_bits())),
        }
    }

    /// Publish a new value. Must only be called from the single writer.
    pub fn store(&self, values: [f32; N]) {
        let seq = self.seq.load(Ordering::Relaxed);
        self.seq.store(seq.wrapping_add(1), Ordering::Relaxed);
        fence(Ordering::Release);

        for (word, value) in self.words.iter().zip(values) {
            word.store(value.to_bits(), Ordering::Relaxed);
        }

        self.seq.store(seq.wrapping_add(2), Ordering::Release);
    }

    /// Read the group if it changed since `last_seen` and was not being
    /// written at the time. Updates `last_seen` on success. Wait-free.
    pub fn load_changed(&self, last_seen: &mut u32) -> Option<[f32; N]> {
        let s1 = self.seq.load(Ordering::Acquire);
        if s1 == *last_seen || s1 & 1 == 1 {
            return None;
        }

        let values = self
            .words
            .each_ref()
            .map(|w| f32::from_bits(w.load(Ordering::Relaxed)));

        fence(Ordering::Acquire);
        let s2 = self.seq.load(Ordering::Relaxed);
        if s1 != s2 {
            return None;
        }

        *last_seen = s1;
        Some(values)
    }

    /// Read the current value regardless of change state. Returns `None`
    /// only if a write is in flight.
    pub fn load(&self) -> Option<[f32; N]> {
        let mut never = u32::MAX;
        self.load_changed(&mut never)
    }
}

/// Conversion of a parameter group to and from its slot representation.
pub trait SlotValue<const N: usize>: Sized {
    fn to_words(&self) -> [f32; N];
    fn from_words(words: [f32; N]) -> Self;
}

impl SlotValue<2> for FilterParams {
    fn to_words(&self) -> [f32; 2] {
        [self.cutoff, self.resonance]
    }

    fn from_words([cutoff, resonance]: [f32; 2]) -> Self {
        FilterParams::new(cutoff, resonance)
    }
}

impl SlotValue<4> for AdsrParams {
    fn to_words(&self) -> [f32; 4] {
        [self.attack, self.decay, self.sustain, self.release]
    }

    fn from_words([attack, decay, sustain, release]: [f32; 4]) -> Self {
        AdsrParams::new(attack, decay, sustain, release)
    }
}

impl SlotValue<1> for Waveform {
    fn to_words(&self) -> [f32; 1] {
        [self.index() as f32]
    }

    fn from_words([index]: [f32; 1]) -> Self {
        // `as` saturates and maps NaN to 0, so any bit pattern lands on a waveform
        Waveform::from_index(index as u32)
    }
}

impl SlotValue<1> for f32 {
    fn to_words(&self) -> [f32; 1] {
        [*self]
    }

    fn from_words([value]: [f32; 1]) -> Self {
        value
    }
}

/// A `ParamSlot` with a typed face.
pub struct TypedSlot<T: SlotValue<N>, const N: usize> {
    slot: ParamSlot<N>,
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T: SlotValue<N>, const N: usize> TypedSlot<T, N> {
    pub fn new(initial: &T) -> Self {
        Self {
            slot: ParamSlot::new(initial.to_words()),
            _marker: std::marker::PhantomData,
        }
    }

    pub fn store(&self, value: &T) {
        self.slot.store(value.to_words());
    }

    pub fn load_changed(&self, last_seen: &mut u32) -> Option<T> {
        self.slot.load_changed(last_seen).map(T::from_words)
    }

    pub fn load(&self) -> Option<T> {
        self.slot.load().map(T::from_words)
    }
}

pub type FilterSlot = TypedSlot<FilterParams, 2>;
pub type EnvelopeSlot = TypedSlot<AdsrParams, 4>;
pub type WaveformSlot = TypedSlot<Waveform, 1>;
pub type GainSlot = TypedSlot<f32, 1>;
