use crate::{
    io::midi::{MidiEvent, CC_ALL_NOTES_OFF},
    synth::message::{NoteEvent, SynthMessage},
};

/// Translate a MIDI message into a synth message.
///
/// With `channel_filter` set, messages on other channels are ignored. A
/// note-on with velocity 0 is a note-off, per the usual MIDI
/// convention. Releases always tail off.
pub fn midi_to_synth(midi: MidiEvent, channel_filter: Option<u8>) -> Option<SynthMessage> {
    if channel_filter.is_some_and(|c| c != midi.channel()) {
        return None;
    }

    match midi {
        MidiEvent::NoteOn { key, velocity, .. } if velocity > 0 => Some(
            NoteEvent::note_on(key, f32::from(velocity) / 127.0).into(),
        ),
        MidiEvent::NoteOn { key, .. } | MidiEvent::NoteOff { key, .. } => {
            Some(NoteEvent::note_off(key, true).into())
        }
        MidiEvent::ControlChange { controller, .. } if controller == CC_ALL_NOTES_OFF => {
            Some(SynthMessage::AllNotesOff {
                allow_tail_off: true,
            })
        }
        _ => None,
    }
}

/// Equal-tempered pitch of a MIDI note, A4 (69) = 440 Hz.
pub fn midi_note_to_freq(note: u8) -> f32 {
    440.0 * 2.0_f32.powf((f32::from(note) - 69.0) / 12.0)
}
