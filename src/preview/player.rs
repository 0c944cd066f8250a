use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use crate::audio::{AudioSession, SessionEvent, SessionEventKind};
use crate::catalog::{Track, TrackId};
use crate::config::PreviewSettings;

/// A preview session only ever has one binding.
const PREVIEW_GENERATION: u64 = 1;

/// Where a preview is in its hover lifecycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PreviewPhase {
    Idle,
    /// Hovered; playback starts once `start_at` passes.
    Pending { start_at: Instant },
    /// `play` issued, waiting for the session to confirm.
    Starting,
    /// Audible until `stop_at`.
    Playing { stop_at: Instant },
}

/// Hover preview for a single track.
///
/// Timers are driven by [`tick`](Self::tick) with the caller's clock, so the
/// debounce and the playback window fire on the front end's own loop.
pub struct PreviewPlayer<S: AudioSession> {
    track_id: TrackId,
    session: S,
    events: Receiver<SessionEvent>,
    phase: PreviewPhase,
    hovered: bool,
    has_source: bool,
    debounce: Duration,
    window: Duration,
    error: Option<String>,
}

impl<S: AudioSession> PreviewPlayer<S> {
    /// Bind `track`'s source right away so a later hover starts quickly.
    pub fn new(
        track: &Track,
        mut session: S,
        events: Receiver<SessionEvent>,
        settings: &PreviewSettings,
    ) -> Self {
        session.set_gain(settings.gain.clamp(0.0, 1.0) as f32);

        let has_source = match track.playable_source() {
            Some(url) => {
                session.bind(url, PREVIEW_GENERATION);
                true
            }
            None => false,
        };

        Self {
            track_id: track.id,
            session,
            events,
            phase: PreviewPhase::Idle,
            hovered: false,
            has_source,
            debounce: Duration::from_millis(settings.debounce_ms),
            window: Duration::from_secs(settings.window_secs),
            error: None,
        }
    }

    pub fn track_id(&self) -> TrackId {
        self.track_id
    }

    pub fn phase(&self) -> PreviewPhase {
        self.phase
    }

    /// Whether the preview is audible right now.
    pub fn is_playing(&self) -> bool {
        matches!(self.phase, PreviewPhase::Playing { .. })
    }

    /// Decode or format failure, if one happened. Rejected starts never land here.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Arm the debounce. A broken or sourceless preview stays idle.
    pub fn hover_start(&mut self, now: Instant) {
        self.hovered = true;
        if !self.has_source || self.error.is_some() {
            return;
        }
        if self.phase == PreviewPhase::Idle {
            self.phase = PreviewPhase::Pending {
                start_at: now + self.debounce,
            };
            trace!(track = %self.track_id, "preview armed");
        }
    }

    /// Cancel a pending start, or stop and rewind a running preview.
    pub fn hover_end(&mut self) {
        self.hovered = false;
        match self.phase {
            PreviewPhase::Idle => {}
            PreviewPhase::Pending { .. } => {
                trace!(track = %self.track_id, "preview cancelled before start");
            }
            PreviewPhase::Starting | PreviewPhase::Playing { .. } => self.stop_and_rewind(),
        }
        self.phase = PreviewPhase::Idle;
    }

    /// Apply session events, then fire whichever timer is due at `now`.
    pub fn tick(&mut self, now: Instant) {
        while let Ok(event) = self.events.try_recv() {
            if event.generation == PREVIEW_GENERATION {
                self.apply_event(event.kind, now);
            }
        }

        match self.phase {
            PreviewPhase::Pending { start_at } if now >= start_at => {
                self.session.set_position(0.0);
                self.session.play();
                self.phase = PreviewPhase::Starting;
                debug!(track = %self.track_id, "preview starting");
            }
            PreviewPhase::Playing { stop_at } if now >= stop_at => {
                self.stop_and_rewind();
                self.phase = PreviewPhase::Idle;
                debug!(track = %self.track_id, "preview window elapsed");
            }
            _ => {}
        }
    }

    fn apply_event(&mut self, kind: SessionEventKind, now: Instant) {
        match kind {
            SessionEventKind::Started => {
                if self.hovered && self.phase == PreviewPhase::Starting {
                    self.phase = PreviewPhase::Playing {
                        stop_at: now + self.window,
                    };
                } else {
                    // Hover ended while the start was in flight.
                    self.stop_and_rewind();
                }
            }
            SessionEventKind::Rejected(reason) => {
                debug!(track = %self.track_id, %reason, "preview start rejected");
                if self.phase == PreviewPhase::Starting {
                    self.phase = PreviewPhase::Idle;
                }
            }
            SessionEventKind::Failed(reason) => {
                warn!(track = %self.track_id, %reason, "preview unavailable");
                self.error = Some(reason);
                self.phase = PreviewPhase::Idle;
            }
            SessionEventKind::Ended => {
                self.session.set_position(0.0);
                self.phase = PreviewPhase::Idle;
            }
            SessionEventKind::MetadataReady { .. } | SessionEventKind::TimeAdvanced { .. } => {}
        }
    }

    fn stop_and_rewind(&mut self) {
        self.session.pause();
        self.session.set_position(0.0);
    }
}

impl<S: AudioSession> Drop for PreviewPlayer<S> {
    fn drop(&mut self) {
        self.session.release();
    }
}
