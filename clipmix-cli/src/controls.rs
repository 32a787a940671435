//! Keyboard input handling for the soundboard.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use clipmix_lib::AudioMixer;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use log::{info, warn};

const MIC_VOLUME_STEP: f32 = 0.1;
const MIC_VOLUME_MAX: f32 = 1.5;

/// What a key press asks the mixer to do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Trigger the sound bound to this zero-based slot.
    Play(usize),
    StopAll,
    ToggleMute,
    MicVolume(f32),
    ToggleMonitor,
    Status,
    Quit,
}

/// Map a key to an action. Keys 1-9 select slots 0-8.
pub fn action_for_key(code: KeyCode, modifiers: KeyModifiers) -> Option<Action> {
    if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
        return Some(Action::Quit);
    }
    match code {
        KeyCode::Char(c @ '1'..='9') => Some(Action::Play(c as usize - '1' as usize)),
        KeyCode::Char(' ') | KeyCode::Char('s') => Some(Action::StopAll),
        KeyCode::Char('m') => Some(Action::ToggleMute),
        KeyCode::Char('-') | KeyCode::Down => Some(Action::MicVolume(-MIC_VOLUME_STEP)),
        KeyCode::Char('=') | KeyCode::Char('+') | KeyCode::Up => {
            Some(Action::MicVolume(MIC_VOLUME_STEP))
        }
        KeyCode::Char('o') => Some(Action::ToggleMonitor),
        KeyCode::Char('i') => Some(Action::Status),
        KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
        _ => None,
    }
}

/// Wait up to `timeout` for a key press.
pub fn poll_action(timeout: Duration) -> io::Result<Option<Action>> {
    if !event::poll(timeout)? {
        return Ok(None);
    }
    match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
            Ok(action_for_key(key.code, key.modifiers))
        }
        _ => Ok(None),
    }
}

/// Apply `action` to the mixer. Returns false when the loop should exit.
pub fn apply(mixer: &AudioMixer, sounds: &[PathBuf], volume: f32, action: Action) -> bool {
    match action {
        Action::Play(slot) => match sounds.get(slot) {
            Some(path) => match mixer.play_sound(path, volume) {
                Ok(duration) => info!("[{}] {} ({:.2}s)", slot + 1, path.display(), duration),
                Err(err) => warn!("{}", err),
            },
            None => info!("no sound bound to key {}", slot + 1),
        },
        Action::StopAll => mixer.stop_all_sounds(),
        Action::ToggleMute => {
            let muted = !mixer.mic_muted();
            mixer.set_mic_muted(muted);
            info!("mic {}", if muted { "muted" } else { "live" });
        }
        Action::MicVolume(delta) => {
            let volume = step_volume(mixer.mic_volume(), delta);
            mixer.set_mic_volume(volume);
            info!("mic volume {:.1}", volume);
        }
        Action::ToggleMonitor => {
            let enabled = !mixer.monitor_enabled();
            mixer.set_monitor_enabled(enabled);
            info!("monitor {}", if enabled { "on" } else { "off" });
        }
        Action::Status => info!("{}", status_text(mixer)),
        Action::Quit => return false,
    }
    true
}

/// One-line summary of mic state and engine counters.
pub fn status_text(mixer: &AudioMixer) -> String {
    let stats = mixer.stats();
    format!(
        "mic {:.1}{} | playing {} | blocks {} dropped {} late {} underruns {} | peak {:.2}",
        mixer.mic_volume(),
        if mixer.mic_muted() { " (muted)" } else { "" },
        stats.active_clips + stats.pending_clips,
        stats.blocks_mixed,
        stats.dropped_blocks,
        stats.late_blocks,
        stats.mic_underruns,
        stats.last_peak,
    )
}

// Snap to tenths so repeated presses don't accumulate float error.
fn step_volume(current: f32, delta: f32) -> f32 {
    (((current + delta) * 10.0).round() / 10.0).clamp(0.0, MIC_VOLUME_MAX)
}
