//! Audio device setup and the control surface the keyboard drives

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use polysynth::{SynthConfig, SynthHandle, VoiceSelector, Waveform};

const CUTOFF_STEP: f32 = 1.12;
const RESONANCE_STEP: f32 = 0.1;
const VOLUME_STEP: f32 = 0.05;

/// An open output stream plus the handle that controls it.
pub struct Player {
    // dropping the stream stops audio
    _stream: cpal::Stream,
    pub handle: SynthHandle,
    pub waveform: Waveform,
    pub cutoff: f32,
    pub resonance: f32,
    pub volume: f32,
    pub octave: i8,
}

impl Player {
    pub fn open(voices: usize, waveform: Waveform) -> EyreResult<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let config = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        let sample_rate = config.sample_rate().0 as f32;
        let channels = config.channels() as usize;

        let synth_config = SynthConfig::new()
            .sample_rate(sample_rate)
            .voices(voices)
            .channels(channels.min(polysynth::MAX_CHANNELS))
            .waveform(waveform);
        let cutoff = synth_config.filter.cutoff;
        let resonance = synth_config.filter.resonance;
        let volume = synth_config.volume;

        let (mut synth, handle) = synth_config
            .build()
            .wrap_err("failed to build synth")?;

        println!("=== polysynth ===");
        println!("Sample rate: {} Hz", sample_rate);
        println!("Channels: {}", channels);
        println!("Voices: {}", voices);
        println!();

        // the synth moves into the callback; nothing else touches it
        let stream = device.build_output_stream(
            &config.into(),
            move |data: &mut [f32], _| synth.render_interleaved(data, channels),
            |err| log::error!("audio stream error: {}", err),
            None,
        )?;
        stream.play()?;

        Ok(Self {
            _stream: stream,
            handle,
            waveform,
            cutoff,
            resonance,
            volume,
            octave: 0,
        })
    }

    pub fn next_waveform(&mut self) -> EyreResult<()> {
        let next = (self.waveform.index() + 1) % Waveform::ALL.len() as u32;
        self.waveform = Waveform::from_index(next);
        self.handle.set_waveform(VoiceSelector::All, self.waveform)?;
        Ok(())
    }

    pub fn scale_cutoff(&mut self, up: bool) {
        let factor = if up { CUTOFF_STEP } else { 1.0 / CUTOFF_STEP };
        let nyquist_guard = self.handle.sample_rate() * 0.49;
        self.cutoff = (self.cutoff * factor).clamp(20.0, nyquist_guard);
        self.handle.set_filter_parameters(self.cutoff, self.resonance);
    }

    pub fn nudge_resonance(&mut self, up: bool) {
        let delta = if up { RESONANCE_STEP } else { -RESONANCE_STEP };
        self.resonance = (self.resonance + delta).clamp(0.1, 40.0);
        self.handle.set_filter_parameters(self.cutoff, self.resonance);
    }

    pub fn nudge_volume(&mut self, up: bool) {
        let delta = if up { VOLUME_STEP } else { -VOLUME_STEP };
        self.volume = (self.volume + delta).clamp(0.0, 1.0);
        self.handle.set_volume(self.volume);
    }

    pub fn status(&self) -> String {
        format!(
            "{:?}  cutoff {:>7.1} Hz  res {:>4.1}  vol {:>3.0}%  octave {:+}",
            self.waveform,
            self.cutoff,
            self.resonance,
            self.volume * 100.0,
            self.octave
        )
    }
}
