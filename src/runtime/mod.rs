use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{info, warn};

use crate::app::{App, SessionFactory};
use crate::audio::{RodioSession, SessionOptions};
use crate::catalog::load_catalog;
use crate::config::{Settings, resolve_config_path};
use crate::logging;
use crate::player::{PlayerCmd, PlayerService};

mod event_loop;

fn session_options(settings: &Settings, label: &str) -> SessionOptions {
    SessionOptions {
        tick: Duration::from_millis(settings.player.tick_ms),
        fetch_timeout: Duration::from_secs(settings.catalog.fetch_timeout_secs),
        label: label.to_string(),
    }
}

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (settings, problem) = Settings::load_or_default();
    let log_path = logging::init(&settings.logging)?;
    if let Some(problem) = problem {
        warn!("{problem}");
    }
    info!(
        log = %log_path.display(),
        config = ?resolve_config_path(),
        "encore starting"
    );

    let catalog_path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| settings.catalog.path.clone());
    let tracks = load_catalog(&catalog_path, &settings.catalog)?;

    let player_options = session_options(&settings, "player");
    let player = PlayerService::spawn(&settings.player, move |events| {
        RodioSession::open(events, player_options)
    });
    if let Err(e) = player.send(PlayerCmd::SetPlaylist(tracks.clone())) {
        warn!(error = %e, "player service stopped before the playlist was set");
    }

    let preview_options = session_options(&settings, "preview");
    let open_preview: SessionFactory<RodioSession> =
        Box::new(move |events| RodioSession::open(events, preview_options.clone()));
    let mut app = App::new(tracks, settings.preview.clone(), open_preview);

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result = event_loop::run(&mut terminal, &settings, &mut app, &player);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    app.end_hover();
    player.shutdown();
    info!("encore stopped");

    run_result
}
