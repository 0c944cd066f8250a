use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::debug;

use crate::app::App;
use crate::audio::AudioSession;
use crate::config;
use crate::player::{PlayerCmd, PlayerService};
use crate::ui;

/// Volume change per `+` / `-` press.
const VOLUME_STEP: f64 = 0.1;

/// Input state carried across loop iterations.
#[derive(Debug, Default)]
struct KeyState {
    /// Two-key prefix state used for `gg` handling.
    pending_gg: bool,
}

/// Main terminal event loop: handles input, drives the hover preview and
/// draws from the latest published playback state. Returns `Ok(())` when
/// the user quits.
pub fn run<S: AudioSession>(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    app: &mut App<S>,
    player: &PlayerService,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut keys = KeyState::default();

    loop {
        app.tick(Instant::now());

        let playback = player.snapshot();
        terminal.draw(|f| ui::draw(f, app, &playback))?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key_event(key, settings, app, player, &mut keys) {
                    break;
                }
            }
        }
    }

    Ok(())
}

/// Returns `true` when the user asked to quit.
fn handle_key_event<S: AudioSession>(
    key: KeyEvent,
    settings: &config::Settings,
    app: &mut App<S>,
    player: &PlayerService,
    keys: &mut KeyState,
) -> bool {
    let send = |cmd: PlayerCmd| {
        if let Err(e) = player.send(cmd) {
            debug!(cmd = ?e.0, "player service gone");
        }
    };
    let skip = settings.player.skip_seconds;

    if key.code != KeyCode::Char('g') {
        keys.pending_gg = false;
    }

    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Esc => app.close_detail_window(),
        KeyCode::Char('g') => {
            if keys.pending_gg {
                keys.pending_gg = false;
                app.first();
            } else {
                keys.pending_gg = true;
            }
        }
        KeyCode::Char('G') => app.last(),
        KeyCode::Char('j') | KeyCode::Down => app.next(),
        KeyCode::Char('k') | KeyCode::Up => app.prev(),
        KeyCode::Enter => {
            if let Some(track) = app.selected_track().cloned() {
                app.end_hover();
                send(PlayerCmd::PlayTrack(track));
            }
        }
        KeyCode::Char(' ') => send(PlayerCmd::TogglePlayPause),
        KeyCode::Char('n') => send(PlayerCmd::Next),
        KeyCode::Char('p') => send(PlayerCmd::Previous),
        KeyCode::Char('l') | KeyCode::Right => send(PlayerCmd::SkipForward(skip)),
        KeyCode::Char('h') | KeyCode::Left => send(PlayerCmd::SkipBackward(skip)),
        KeyCode::Char('0') => send(PlayerCmd::SkipToStart),
        KeyCode::Char('$') => send(PlayerCmd::SkipToEnd),
        KeyCode::Char(c @ '1'..='9') => {
            let tenths = f64::from(c as u8 - b'0');
            send(PlayerCmd::SeekToFraction(tenths / 10.0));
        }
        KeyCode::Char('+') | KeyCode::Char('=') => {
            let volume = player.snapshot().volume;
            send(PlayerCmd::SetVolume(volume + VOLUME_STEP));
        }
        KeyCode::Char('-') => {
            let volume = player.snapshot().volume;
            send(PlayerCmd::SetVolume(volume - VOLUME_STEP));
        }
        KeyCode::Char('m') => send(PlayerCmd::ToggleMute),
        KeyCode::Char('i') => app.toggle_detail_window(),
        _ => {}
    }

    false
}
