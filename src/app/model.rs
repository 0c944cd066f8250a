//! Application model: `App`.

use std::sync::mpsc;
use std::time::Instant;

use tracing::trace;

use crate::audio::{AudioSession, EventSender};
use crate::catalog::Track;
use crate::config::PreviewSettings;
use crate::preview::PreviewPlayer;

/// Builds a fresh session for each preview, wired to the given event sender.
pub type SessionFactory<S> = Box<dyn FnMut(EventSender) -> S>;

/// The main application model.
pub struct App<S: AudioSession> {
    pub tracks: Vec<Track>,
    pub selected: usize,
    pub detail_window: bool,

    /// The cursor only counts as hovering once the user has moved it.
    hover_armed: bool,
    preview: Option<PreviewPlayer<S>>,
    preview_settings: PreviewSettings,
    open_session: SessionFactory<S>,
}

impl<S: AudioSession> App<S> {
    pub fn new(
        tracks: Vec<Track>,
        preview_settings: PreviewSettings,
        open_session: SessionFactory<S>,
    ) -> Self {
        Self {
            tracks,
            selected: 0,
            detail_window: false,
            hover_armed: false,
            preview: None,
            preview_settings,
            open_session,
        }
    }

    pub fn has_tracks(&self) -> bool {
        !self.tracks.is_empty()
    }

    pub fn selected_track(&self) -> Option<&Track> {
        self.tracks.get(self.selected)
    }

    /// The preview currently open for the hovered row, if any.
    pub fn preview(&self) -> Option<&PreviewPlayer<S>> {
        self.preview.as_ref()
    }

    pub fn toggle_detail_window(&mut self) {
        self.detail_window = !self.detail_window;
    }

    pub fn close_detail_window(&mut self) {
        self.detail_window = false;
    }

    /// Move the cursor down, wrapping to the top.
    pub fn next(&mut self) {
        if self.has_tracks() {
            self.set_selected((self.selected + 1) % self.tracks.len());
        }
    }

    /// Move the cursor up, wrapping to the bottom.
    pub fn prev(&mut self) {
        if self.has_tracks() {
            let idx = match self.selected {
                0 => self.tracks.len() - 1,
                i => i - 1,
            };
            self.set_selected(idx);
        }
    }

    pub fn first(&mut self) {
        if self.has_tracks() {
            self.set_selected(0);
        }
    }

    pub fn last(&mut self) {
        if self.has_tracks() {
            self.set_selected(self.tracks.len() - 1);
        }
    }

    /// Put the cursor on `idx`; this counts as hovering that row.
    pub fn set_selected(&mut self, idx: usize) {
        self.selected = idx.min(self.tracks.len().saturating_sub(1));
        self.hover_armed = true;
    }

    /// Stop hovering until the cursor moves again (the row was opened).
    pub fn end_hover(&mut self) {
        self.hover_armed = false;
        self.close_preview();
    }

    /// Open, keep or drop the preview so it follows the hovered row.
    pub fn sync_hover(&mut self, now: Instant) {
        let wanted = if self.hover_armed && self.preview_settings.enabled {
            self.selected_track().map(|t| t.id)
        } else {
            None
        };

        if self.preview.as_ref().map(|p| p.track_id()) == wanted {
            return;
        }
        self.close_preview();

        let Some(track) = wanted.and(self.selected_track().cloned()) else {
            return;
        };

        let (tx, rx) = mpsc::channel();
        let session = (self.open_session)(tx);
        let mut preview = PreviewPlayer::new(&track, session, rx, &self.preview_settings);
        preview.hover_start(now);
        trace!(track = %track.id, "hover");
        self.preview = Some(preview);
    }

    /// Follow the cursor and advance the preview's timers.
    pub fn tick(&mut self, now: Instant) {
        self.sync_hover(now);
        if let Some(preview) = self.preview.as_mut() {
            preview.tick(now);
        }
    }

    fn close_preview(&mut self) {
        if let Some(mut preview) = self.preview.take() {
            preview.hover_end();
        }
    }
}
