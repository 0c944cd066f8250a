//! UI rendering for the terminal front end.
//!
//! Two surfaces read the same `PlaybackState`: the footer player and the
//! track-detail popup. Neither keeps playback state of its own.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, ListState, Padding, Paragraph, Wrap},
};

use crate::app::App;
use crate::audio::AudioSession;
use crate::catalog::{Track, format_time, track_label};
use crate::player::{PlaybackState, PlayerStatus};

const CONTROLS: &[(&str, &str)] = &[
    ("j/k", "move"),
    ("gg/G", "top/bottom"),
    ("enter", "play"),
    ("space", "play/pause"),
    ("n/p", "next/prev"),
    ("h/l", "skip"),
    ("0/$", "start/end"),
    ("1-9", "seek"),
    ("+/-", "volume"),
    ("m", "mute"),
    ("i", "details"),
    ("q", "quit"),
];

fn controls_text() -> String {
    CONTROLS
        .iter()
        .map(|(k, v)| format!("[{k}] {v}"))
        .collect::<Vec<_>>()
        .join(" | ")
}

fn status_label(state: &PlaybackState) -> &'static str {
    match state.status {
        PlayerStatus::Idle => "Stopped",
        PlayerStatus::Loading => "Loading",
        PlayerStatus::Playing if state.is_playing => "Playing",
        PlayerStatus::Playing | PlayerStatus::Paused => "Paused",
        PlayerStatus::Ended => "Ended",
        PlayerStatus::Failed => "Unavailable",
    }
}

/// Compute a centered rectangle with given size constrained to `r`.
fn centered_rect_sized(mut width: u16, mut height: u16, r: Rect) -> Rect {
    width = width.min(r.width.saturating_sub(2)).max(10);
    height = height.min(r.height.saturating_sub(2)).max(5);

    Rect {
        x: r.x + (r.width.saturating_sub(width) / 2),
        y: r.y + (r.height.saturating_sub(height) / 2),
        width,
        height,
    }
}

fn left_pad() -> Padding {
    Padding {
        left: 1,
        right: 0,
        top: 0,
        bottom: 0,
    }
}

/// Render the entire UI for one frame.
pub fn draw<S: AudioSession>(frame: &mut Frame, app: &App<S>, playback: &PlaybackState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),
            Constraint::Length(5),
            Constraint::Length(4),
        ])
        .split(frame.area());

    draw_track_list(frame, chunks[0], app, playback);
    draw_player(frame, chunks[1], playback);

    if app.detail_window {
        if let Some(track) = app.selected_track() {
            draw_detail(frame, chunks[0], track, playback);
        }
    }

    let footer = Paragraph::new(controls_text())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(left_pad()),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[2]);
}

fn draw_track_list<S: AudioSession>(
    frame: &mut Frame,
    area: Rect,
    app: &App<S>,
    playback: &PlaybackState,
) {
    let preview = app.preview();

    // Only build items for the visible window, keeping the cursor centered.
    let total = app.tracks.len();
    let height = area.height.saturating_sub(2) as usize;
    let (start, end) = if total <= height || height == 0 {
        (0, total)
    } else {
        let half = height / 2;
        let start = app.selected.saturating_sub(half).min(total - height);
        (start, start + height)
    };

    let items: Vec<ListItem> = app.tracks[start..end]
        .iter()
        .map(|track| {
            let marker = if playback.is_current_and_playing(track.id) {
                "▶ "
            } else if playback.is_current(track.id) {
                "❚❚"
            } else if preview.is_some_and(|p| p.track_id() == track.id && p.is_playing()) {
                "♪ "
            } else {
                "  "
            };
            let line = format!(
                "{marker} {}  {}",
                track_label(track),
                format_time(track.duration)
            );
            let item = ListItem::new(line);
            if playback.is_current(track.id) {
                item.style(Style::default().fg(Color::Green))
            } else {
                item
            }
        })
        .collect();

    let title = format!(" catalog ({total}) ");
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");

    let mut state = ListState::default();
    if total > 0 {
        state.select(Some(app.selected - start));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

/// The global footer player.
fn draw_player(frame: &mut Frame, area: Rect, playback: &PlaybackState) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" now playing ")
        .padding(left_pad());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    let Some(track) = playback.current_track.as_ref() else {
        frame.render_widget(Paragraph::new("Nothing playing"), rows[0]);
        return;
    };

    let headline = format!("{}  [{}]", track_label(track), status_label(playback));
    frame.render_widget(Paragraph::new(headline), rows[0]);

    let volume = if playback.volume > 0.0 {
        format!("vol {:>3}%", (playback.volume * 100.0).round() as u32)
    } else {
        "muted".to_string()
    };
    let times = format!(
        "{} / {}    {}",
        format_time(playback.current_time),
        format_time(playback.duration),
        volume
    );
    frame.render_widget(Paragraph::new(times), rows[1]);

    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(Color::Green))
        .ratio(playback.progress())
        .label("");
    frame.render_widget(gauge, rows[2]);
}

/// Track-detail popup; labels its Play/Pause action from the shared state.
fn draw_detail(frame: &mut Frame, area: Rect, track: &Track, playback: &PlaybackState) {
    let popup = centered_rect_sized(64, 10, area);
    frame.render_widget(Clear, popup);

    let action = if playback.is_current_and_playing(track.id) {
        "Pause"
    } else {
        "Play"
    };
    let position = if playback.is_current(track.id) {
        format!(
            "{} / {}",
            format_time(playback.current_time),
            format_time(playback.duration)
        )
    } else {
        "-".to_string()
    };

    let text = format!(
        "Title: {}\nArtist: {}\nAlbum: {}\nGenre: {}\nDuration: {}\nPosition: {}\n\n[enter] {}",
        track.title,
        track.artist_name,
        track.album_title,
        track.genre.as_deref().unwrap_or("-"),
        format_time(track.duration),
        position,
        action,
    );

    let paragraph = Paragraph::new(text)
        .alignment(Alignment::Left)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" track (i closes) ")
                .padding(left_pad()),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, popup);
}
