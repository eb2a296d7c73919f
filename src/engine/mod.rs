//! The real-time render pipeline and its control-side handle.
//!
//! [`SynthConfig::build`] returns a pair: the [`Synth`] is moved into the
//! audio callback and owns all DSP state, the [`SynthHandle`] stays on the
//! control thread. They share nothing but a lock-free note queue and one
//! [`params::ParamSlot`] per parameter group.
//!
//! Per rendered block the synth:
//!
//! 1. picks up changed parameter groups,
//! 2. drains queued note events into the voice pool,
//! 3. mixes every voice into a mono buffer,
//! 4. copies the mix to each channel and runs that channel's low-pass,
//! 5. applies master gain (ramped across the block when it changed),
//! 6. writes the result to the caller's buffer.
//!
//! Nothing in that path allocates, locks, or logs.

pub mod config;
pub mod params;

use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc,
};

use rtrb::{Consumer, Producer, PushError, RingBuffer};

use crate::{
    dsp::{
        envelope::AdsrParams,
        filter::{FilterCoefficients, FilterParams, FilterStage},
        oscillator::Waveform,
    },
    engine::{
        config::SynthConfig,
        params::{EnvelopeSlot, FilterSlot, GainSlot, WaveformSlot},
    },
    error::SynthError,
    io::AudioBlock,
    synth::{
        message::{NoteEvent, SynthMessage},
        pool::VoicePool,
        voice::SynthVoice,
    },
    validate_sample_rate, MAX_BLOCK_SIZE,
};

/// State the control thread publishes and the audio thread reads.
struct SharedParams {
    filter: FilterSlot,
    volume: GainSlot,
    waveforms: Box<[WaveformSlot]>,
    envelopes: Box<[EnvelopeSlot]>,
    sample_rate: AtomicU32,
}

/// Slot versions the audio thread has already applied.
struct SeenVersions {
    filter: u32,
    volume: u32,
    waveforms: Box<[u32]>,
    envelopes: Box<[u32]>,
}

/// Which voices a waveform or envelope change applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceSelector {
    All,
    Voice(usize),
}

fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}

/// Render side. Owned by the audio callback.
pub struct Synth {
    sample_rate: f32,
    pool: VoicePool,
    filter: FilterStage,
    rx: Consumer<SynthMessage>,

    shared: Arc<SharedParams>,
    seen: SeenVersions,

    gain: f32,
    target_gain: f32,

    mix: Vec<f32>,
    output: AudioBlock,
}

impl Synth {
    pub(crate) fn from_config(config: SynthConfig) -> Result<(Synth, SynthHandle), SynthError> {
        let sample_rate = config.validate()?;
        let envelope = config.envelope.clamped();
        let filter = config.filter.clamped(sample_rate);
        let volume = clamp_volume(config.volume);

        let pool = VoicePool::new(sample_rate, config.voices, config.waveform, envelope)?;
        let (tx, rx) = RingBuffer::<SynthMessage>::new(config.queue_capacity);

        let shared = Arc::new(SharedParams {
            filter: FilterSlot::new(&filter),
            volume: GainSlot::new(&volume),
            waveforms: (0..config.voices)
                .map(|_| WaveformSlot::new(&config.waveform))
                .collect(),
            envelopes: (0..config.voices)
                .map(|_| EnvelopeSlot::new(&envelope))
                .collect(),
            sample_rate: AtomicU32::new(sample_rate.to_bits()),
        });

        let synth = Synth {
            sample_rate,
            pool,
            filter: FilterStage::new(sample_rate, config.channels, filter),
            rx,
            shared: Arc::clone(&shared),
            seen: SeenVersions {
                filter: 0,
                volume: 0,
                waveforms: vec![0; config.voices].into_boxed_slice(),
                envelopes: vec![0; config.voices].into_boxed_slice(),
            },
            gain: volume,
            target_gain: volume,
            mix: vec![0.0; MAX_BLOCK_SIZE],
            output: AudioBlock::new(config.channels, MAX_BLOCK_SIZE),
        };

        let handle = SynthHandle {
            tx,
            shared,
            envelopes: vec![envelope; config.voices],
        };

        log::info!(
            "synth ready: {} Hz, {} voices, {} channels, queue of {}",
            sample_rate,
            config.voices,
            config.channels,
            config.queue_capacity
        );

        Ok((synth, handle))
    }

    /// Change the sample rate between streams (device switch).
    ///
    /// Sounding voices keep their pitch, the filter is recomputed and its
    /// history cleared.
    pub fn set_sample_rate(&mut self, sample_rate: f32) -> Result<(), SynthError> {
        let sample_rate = validate_sample_rate(sample_rate)?;

        self.sample_rate = sample_rate;
        self.pool.set_sample_rate(sample_rate)?;
        self.filter.set_sample_rate(sample_rate);
        self.shared
            .sample_rate
            .store(sample_rate.to_bits(), Ordering::Release);

        log::info!("sample rate changed to {} Hz", sample_rate);
        Ok(())
    }

    fn apply_pending_params(&mut self) {
        let shared = &*self.shared;

        if let Some(p) = shared.filter.load_changed(&mut self.seen.filter) {
            self.filter.set_parameters(p.cutoff, p.resonance);
        }
        if let Some(volume) = shared.volume.load_changed(&mut self.seen.volume) {
            self.target_gain = volume;
        }

        for (idx, (slot, seen)) in shared
            .waveforms
            .iter()
            .zip(self.seen.waveforms.iter_mut())
            .enumerate()
        {
            if let Some(waveform) = slot.load_changed(seen) {
                if let Some(voice) = self.pool.voice_mut(idx) {
                    voice.set_waveform(waveform);
                }
            }
        }

        for (idx, (slot, seen)) in shared
            .envelopes
            .iter()
            .zip(self.seen.envelopes.iter_mut())
            .enumerate()
        {
            if let Some(params) = slot.load_changed(seen) {
                if let Some(voice) = self.pool.voice_mut(idx) {
                    voice.set_envelope(params);
                }
            }
        }
    }

    fn drain_messages(&mut self) {
        while let Ok(message) = self.rx.pop() {
            self.pool.handle_message(message);
        }
    }

    fn begin_block(&mut self) {
        self.apply_pending_params();
        self.drain_messages();
    }

    /// Per-sample gain increment that lands on the target gain after
    /// `frames` frames.
    fn gain_step(&self, frames: usize) -> f32 {
        if frames == 0 {
            0.0
        } else {
            (self.target_gain - self.gain) / frames as f32
        }
    }

    /// Render `len` (<= MAX_BLOCK_SIZE) frames into `self.output`, moving
    /// the gain by `step` per frame.
    fn render_chunk(&mut self, len: usize, step: f32) {
        let mix = &mut self.mix[..len];
        self.pool.render_block(mix);

        let start_gain = self.gain;

        self.output.set_frames(len);
        for (ch, out) in self.output.channels_mut().enumerate() {
            out.copy_from_slice(mix);
            self.filter.process_channel(ch, out);

            if step == 0.0 {
                for sample in out.iter_mut() {
                    *sample *= start_gain;
                }
            } else {
                for (i, sample) in out.iter_mut().enumerate() {
                    *sample *= start_gain + step * (i + 1) as f32;
                }
            }
        }

        self.gain = start_gain + step * len as f32;
    }

    fn end_block(&mut self) {
        self.gain = self.target_gain;
    }

    /// Render `num_samples` frames and return the per-channel result.
    ///
    /// At most `MAX_BLOCK_SIZE` frames are produced per call; larger
    /// requests are truncated (and trip a debug assertion). Use
    /// [`Synth::process_block`] or [`Synth::render_interleaved`] for
    /// arbitrary callback sizes.
    pub fn render_block(&mut self, num_samples: usize) -> &AudioBlock {
        debug_assert!(
            num_samples <= MAX_BLOCK_SIZE,
            "render_block asked for {num_samples} frames, limit is {MAX_BLOCK_SIZE}"
        );
        self.begin_block();

        let frames = num_samples.min(MAX_BLOCK_SIZE);
        let step = self.gain_step(frames);
        self.render_chunk(frames, step);
        self.end_block();
        &self.output
    }

    /// Fill every channel of `block` (up to `block.frames()` frames).
    ///
    /// Channels beyond the configured count repeat the last configured one.
    /// A volume change ramps across the whole block, however many
    /// sub-blocks it takes to render.
    pub fn process_block(&mut self, block: &mut AudioBlock) {
        self.begin_block();

        let frames = block.frames();
        let step = self.gain_step(frames);
        let last_channel = self.output.num_channels() - 1;
        let mut start = 0;
        while start < frames {
            let len = (frames - start).min(MAX_BLOCK_SIZE);
            self.render_chunk(len, step);

            for (ch, dest) in block.channels_mut().enumerate() {
                let src = self.output.channel(ch.min(last_channel));
                dest[start..start + len].copy_from_slice(src);
            }
            start += len;
        }
        self.end_block();
    }

    /// Fill an interleaved buffer of `channels` channels, as handed over by
    /// most audio device callbacks. A trailing partial frame is zeroed.
    /// Volume ramps across the whole buffer as in [`Synth::process_block`].
    pub fn render_interleaved(&mut self, data: &mut [f32], channels: usize) {
        if channels == 0 {
            data.fill(0.0);
            return;
        }

        self.begin_block();

        let frames = data.len() / channels;
        let step = self.gain_step(frames);
        let last_channel = self.output.num_channels() - 1;
        let mut start = 0;
        while start < frames {
            let len = (frames - start).min(MAX_BLOCK_SIZE);
            self.render_chunk(len, step);

            let dest = &mut data[start * channels..(start + len) * channels];
            for (i, frame) in dest.chunks_exact_mut(channels).enumerate() {
                for (ch, sample) in frame.iter_mut().enumerate() {
                    *sample = self.output.channel(ch.min(last_channel))[i];
                }
            }
            start += len;
        }
        self.end_block();

        data[frames * channels..].fill(0.0);
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn voice_count(&self) -> usize {
        self.pool.len()
    }

    pub fn active_voices(&self) -> usize {
        self.pool.active_count()
    }

    pub fn pool(&self) -> &VoicePool {
        &self.pool
    }

    pub fn filter_coefficients(&self) -> &FilterCoefficients {
        self.filter.coefficients()
    }

    /// Master gain as of the end of the last rendered block.
    pub fn volume(&self) -> f32 {
        self.gain
    }

    pub fn num_channels(&self) -> usize {
        self.output.num_channels()
    }
}

/// Control side. Lives on the UI / MIDI thread.
pub struct SynthHandle {
    tx: Producer<SynthMessage>,
    shared: Arc<SharedParams>,
    // last envelope published per voice, so single-stage setters can merge
    envelopes: Vec<AdsrParams>,
}

impl SynthHandle {
    pub fn send(&mut self, message: SynthMessage) -> Result<(), SynthError> {
        let message = match message {
            SynthMessage::Note(event) => SynthMessage::Note(event.clamped()),
            other => other,
        };

        self.tx.push(message).map_err(|PushError::Full(message)| {
            log::warn!("note queue full, dropping {:?}", message);
            SynthError::QueueFull(message)
        })
    }

    pub fn push_note_event(&mut self, event: NoteEvent) -> Result<(), SynthError> {
        self.send(SynthMessage::Note(event))
    }

    pub fn note_on(&mut self, note: u8, velocity: f32) -> Result<(), SynthError> {
        self.push_note_event(NoteEvent::note_on(note, velocity))
    }

    pub fn note_off(&mut self, note: u8, allow_tail_off: bool) -> Result<(), SynthError> {
        self.push_note_event(NoteEvent::note_off(note, allow_tail_off))
    }

    pub fn all_notes_off(&mut self, allow_tail_off: bool) -> Result<(), SynthError> {
        self.send(SynthMessage::AllNotesOff { allow_tail_off })
    }

    fn selected(&self, selector: VoiceSelector) -> Result<std::ops::Range<usize>, SynthError> {
        let voices = self.voice_count();
        match selector {
            VoiceSelector::All => Ok(0..voices),
            VoiceSelector::Voice(index) if index < voices => Ok(index..index + 1),
            VoiceSelector::Voice(index) => Err(SynthError::VoiceIndexOutOfRange { index, voices }),
        }
    }

    pub fn set_waveform(&mut self, selector: VoiceSelector, waveform: Waveform) -> Result<(), SynthError> {
        for idx in self.selected(selector)? {
            self.shared.waveforms[idx].store(&waveform);
        }
        Ok(())
    }

    pub fn set_adsr(&mut self, selector: VoiceSelector, params: AdsrParams) -> Result<(), SynthError> {
        let clamped = params.clamped();
        if clamped != params {
            log::debug!("envelope {:?} clamped to {:?}", params, clamped);
        }

        for idx in self.selected(selector)? {
            self.envelopes[idx] = clamped;
            self.shared.envelopes[idx].store(&clamped);
        }
        Ok(())
    }

    fn update_envelopes(&mut self, update: impl Fn(&mut AdsrParams)) {
        for (params, slot) in self.envelopes.iter_mut().zip(self.shared.envelopes.iter()) {
            update(params);
            let clamped = params.clamped();
            if clamped != *params {
                log::debug!("envelope {:?} clamped to {:?}", params, clamped);
            }
            *params = clamped;
            slot.store(params);
        }
    }

    /// Attack time in seconds for every voice.
    pub fn set_attack(&mut self, seconds: f32) {
        self.update_envelopes(|p| p.attack = seconds);
    }

    pub fn set_decay(&mut self, seconds: f32) {
        self.update_envelopes(|p| p.decay = seconds);
    }

    pub fn set_sustain(&mut self, level: f32) {
        self.update_envelopes(|p| p.sustain = level);
    }

    pub fn set_release(&mut self, seconds: f32) {
        self.update_envelopes(|p| p.release = seconds);
    }

    pub fn set_filter_parameters(&mut self, cutoff: f32, resonance: f32) {
        let requested = FilterParams::new(cutoff, resonance);
        let clamped = requested.clamped(self.sample_rate());
        if clamped != requested {
            log::debug!("filter {:?} clamped to {:?}", requested, clamped);
        }
        self.shared.filter.store(&clamped);
    }

    /// Master gain in [0, 1].
    pub fn set_volume(&mut self, volume: f32) {
        let clamped = clamp_volume(volume);
        if clamped != volume {
            log::debug!("volume {} clamped to {}", volume, clamped);
        }
        self.shared.volume.store(&clamped);
    }

    pub fn sample_rate(&self) -> f32 {
        f32::from_bits(self.shared.sample_rate.load(Ordering::Acquire))
    }

    pub fn voice_count(&self) -> usize {
        self.envelopes.len()
    }

    /// Free space in the note queue.
    pub fn queue_slots(&self) -> usize {
        self.tx.slots()
    }
}
