/// A decoded MIDI 1.0 channel voice message. Channels are 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiEvent {
    NoteOn { channel: u8, key: u8, velocity: u8 },
    NoteOff { channel: u8, key: u8, velocity: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
    /// Centred at 0, range -8192..=8191
    PitchBend { channel: u8, value: i16 },
    ProgramChange { channel: u8, program: u8 },
}

/// Controller number of the "All Notes Off" channel mode message.
pub const CC_ALL_NOTES_OFF: u8 = 123;

impl MidiEvent {
    /// Decode one message from raw bytes as delivered by a MIDI input port.
    ///
    /// Returns `None` for system messages, running status, truncated input
    /// and anything else this synth does not react to.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        let (&status, data) = bytes.split_first()?;
        if status < 0x80 {
            return None;
        }

        let channel = status & 0x0f;
        let data1 = || data.first().copied().filter(|b| *b < 0x80);
        let data2 = || data.get(1).copied().filter(|b| *b < 0x80);

        match status & 0xf0 {
            0x80 => Some(MidiEvent::NoteOff {
                channel,
                key: data1()?,
                velocity: data2()?,
            }),
            0x90 => Some(MidiEvent::NoteOn {
                channel,
                key: data1()?,
                velocity: data2()?,
            }),
            0xb0 => Some(MidiEvent::ControlChange {
                channel,
                controller: data1()?,
                value: data2()?,
            }),
            0xc0 => Some(MidiEvent::ProgramChange {
                channel,
                program: data1()?,
            }),
            0xe0 => {
                let lsb = i16::from(data1()?);
                let msb = i16::from(data2()?);
                Some(MidiEvent::PitchBend {
                    channel,
                    value: ((msb << 7) | lsb) - 8192,
                })
            }
            _ => None,
        }
    }

    pub fn channel(&self) -> u8 {
        match *self {
            MidiEvent::NoteOn { channel, .. }
            | MidiEvent::NoteOff { channel, .. }
            | MidiEvent::ControlChange { channel, .. }
            | MidiEvent::PitchBend { channel, .. }
            | MidiEvent::ProgramChange { channel, .. } => channel,
        }
    }
}
