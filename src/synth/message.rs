/// Whether a `NoteEvent` starts or ends a note.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NoteKind {
    NoteOn,
    NoteOff,
}

/// A single keyboard/MIDI note event as consumed by the voice pool.
///
/// `allow_tail_off` only matters for `NoteOff`: when false the voice is cut
/// immediately instead of running its release stage.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct NoteEvent {
    pub note: u8,
    pub velocity: f32,
    pub kind: NoteKind,
    pub allow_tail_off: bool,
}

impl NoteEvent {
    /// Out-of-range notes clamp to 127, velocity clamps into [0, 1].
    pub fn note_on(note: u8, velocity: f32) -> Self {
        Self {
            note: note.min(127),
            velocity: clamp_velocity(velocity),
            kind: NoteKind::NoteOn,
            allow_tail_off: true,
        }
    }

    pub fn note_off(note: u8, allow_tail_off: bool) -> Self {
        Self {
            note: note.min(127),
            velocity: 0.0,
            kind: NoteKind::NoteOff,
            allow_tail_off,
        }
    }

    /// Same event with note and velocity forced into range.
    pub fn clamped(self) -> Self {
        Self {
            note: self.note.min(127),
            velocity: clamp_velocity(self.velocity),
            ..self
        }
    }
}

fn clamp_velocity(velocity: f32) -> f32 {
    if velocity.is_nan() {
        0.0
    } else {
        velocity.clamp(0.0, 1.0)
    }
}

/// Everything that travels the control → audio note queue.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SynthMessage {
    Note(NoteEvent),
    AllNotesOff { allow_tail_off: bool },
}

impl From<NoteEvent> for SynthMessage {
    fn from(event: NoteEvent) -> Self {
        SynthMessage::Note(event)
    }
}
