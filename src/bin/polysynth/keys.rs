//! Computer keyboard as a note source
//!
//! Two rows of the keyboard form one octave starting at C:
//!
//! ```text
//!  w e   t y u   o p
//! a s d f g h j k l ;
//! ```
//!
//! Terminals that report key releases get proper note-offs. Elsewhere a note
//! is released once its key stops auto-repeating.

use std::{
    collections::HashMap,
    io::{stdout, Write},
    time::{Duration, Instant},
};

use color_eyre::eyre::Result as EyreResult;
use crossterm::{
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute, terminal,
};

use super::app::Player;

const BASE_NOTE: i16 = 60;
const VELOCITY: f32 = 0.8;
// longer than a typical key-repeat delay
const HOLD_WITHOUT_RELEASE: Duration = Duration::from_millis(600);

fn note_offset(c: char) -> Option<i16> {
    let offset = match c {
        'a' => 0,
        'w' => 1,
        's' => 2,
        'e' => 3,
        'd' => 4,
        'f' => 5,
        't' => 6,
        'g' => 7,
        'y' => 8,
        'h' => 9,
        'u' => 10,
        'j' => 11,
        'k' => 12,
        'o' => 13,
        'l' => 14,
        'p' => 15,
        ';' => 16,
        _ => return None,
    };
    Some(offset)
}

/// Restores the terminal however the loop exits.
struct RawMode {
    enhanced: bool,
}

impl RawMode {
    fn enter() -> EyreResult<Self> {
        terminal::enable_raw_mode()?;
        let enhanced = terminal::supports_keyboard_enhancement().unwrap_or(false);
        if enhanced {
            execute!(
                stdout(),
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }
        Ok(Self { enhanced })
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        if self.enhanced {
            let _ = execute!(stdout(), PopKeyboardEnhancementFlags);
        }
        let _ = terminal::disable_raw_mode();
    }
}

struct Keyboard {
    // sounding note -> last time its key was seen
    held: HashMap<u8, Instant>,
    reports_release: bool,
}

impl Keyboard {
    fn note_for(&self, player: &Player, c: char) -> Option<u8> {
        let offset = note_offset(c)?;
        let note = BASE_NOTE + offset + 12 * player.octave as i16;
        u8::try_from(note).ok().filter(|n| *n <= 127)
    }

    fn press(&mut self, player: &mut Player, note: u8) -> EyreResult<()> {
        if self.held.insert(note, Instant::now()).is_none() {
            player.handle.note_on(note, VELOCITY)?;
        }
        Ok(())
    }

    fn release(&mut self, player: &mut Player, note: u8) -> EyreResult<()> {
        if self.held.remove(&note).is_some() {
            player.handle.note_off(note, true)?;
        }
        Ok(())
    }

    fn expire(&mut self, player: &mut Player) -> EyreResult<()> {
        if self.reports_release {
            return Ok(());
        }
        let now = Instant::now();
        let stale: Vec<u8> = self
            .held
            .iter()
            .filter(|(_, seen)| now.duration_since(**seen) > HOLD_WITHOUT_RELEASE)
            .map(|(note, _)| *note)
            .collect();
        for note in stale {
            self.release(player, note)?;
        }
        Ok(())
    }

    fn release_all(&mut self, player: &mut Player) -> EyreResult<()> {
        self.held.clear();
        player.handle.all_notes_off(true)?;
        Ok(())
    }
}

fn print_status(player: &Player) -> EyreResult<()> {
    let mut out = stdout();
    write!(out, "\r\x1b[2K{}", player.status())?;
    out.flush()?;
    Ok(())
}

/// Returns false when the user asked to quit.
fn handle_key(keyboard: &mut Keyboard, player: &mut Player, key: KeyEvent) -> EyreResult<bool> {
    if let KeyCode::Char(c) = key.code {
        if let Some(note) = keyboard.note_for(player, c) {
            match key.kind {
                KeyEventKind::Press | KeyEventKind::Repeat => keyboard.press(player, note)?,
                KeyEventKind::Release => keyboard.release(player, note)?,
            }
            return Ok(true);
        }
    }

    if key.kind == KeyEventKind::Release {
        return Ok(true);
    }

    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => return Ok(false),
        KeyCode::Char(' ') => keyboard.release_all(player)?,
        KeyCode::Tab => player.next_waveform()?,
        KeyCode::Char('z') => {
            keyboard.release_all(player)?;
            player.octave = (player.octave - 1).max(-4);
        }
        KeyCode::Char('x') => {
            keyboard.release_all(player)?;
            player.octave = (player.octave + 1).min(4);
        }
        KeyCode::Up => player.scale_cutoff(true),
        KeyCode::Down => player.scale_cutoff(false),
        KeyCode::Right => player.nudge_resonance(true),
        KeyCode::Left => player.nudge_resonance(false),
        KeyCode::Char('+') | KeyCode::Char('=') => player.nudge_volume(true),
        KeyCode::Char('-') => player.nudge_volume(false),
        _ => {}
    }
    Ok(true)
}

pub fn run(player: &mut Player) -> EyreResult<()> {
    println!("Keys: a-; play, z/x octave, tab waveform, arrows filter, +/- volume");
    println!("      space all notes off, q quit");
    println!();

    let raw = RawMode::enter()?;
    let mut keyboard = Keyboard {
        held: HashMap::new(),
        reports_release: raw.enhanced,
    };
    log::debug!("key release events supported: {}", raw.enhanced);

    print_status(player)?;
    loop {
        if event::poll(Duration::from_millis(16))? {
            if let Event::Key(key) = event::read()? {
                if !handle_key(&mut keyboard, player, key)? {
                    break;
                }
                print_status(player)?;
            }
        }
        keyboard.expire(player)?;
    }

    keyboard.release_all(player)?;
    drop(raw);
    println!();
    Ok(())
}
