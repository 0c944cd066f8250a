use std::sync::mpsc::Receiver;

use tracing::{debug, info, trace, warn};

use crate::audio::{AudioSession, SessionEvent, SessionEventKind};
use crate::catalog::Track;
use crate::config::PlayerSettings;

use super::state::{PlaybackState, PlayerStatus, Playlist};

/// Single source of truth for "what is playing now".
///
/// Owns the one session backing the current track. Commands update state
/// optimistically and drive the session; session events reconcile the state
/// once they are pumped in with [`pump_events`](Self::pump_events). No
/// command fails: rejections end up as `is_playing == false` plus a log line.
pub struct PlaybackController<S: AudioSession> {
    session: S,
    events: Receiver<SessionEvent>,
    state: PlaybackState,
    /// Generation of the current binding; events from older bindings are dropped.
    generation: u64,
    default_volume: f64,
}

impl<S: AudioSession> PlaybackController<S> {
    pub fn new(mut session: S, events: Receiver<SessionEvent>, settings: &PlayerSettings) -> Self {
        let volume = clamp_unit(settings.default_volume).unwrap_or(0.7);
        session.set_gain(volume as f32);
        Self {
            session,
            events,
            state: PlaybackState::new(volume),
            generation: 0,
            default_volume: volume,
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    #[cfg(test)]
    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    /// Play `track`, or toggle pause/resume if it is already the current track.
    pub fn play_track(&mut self, track: &Track) {
        if self
            .state
            .current_track
            .as_ref()
            .is_some_and(|current| current.is_same(track))
        {
            self.toggle_play_pause();
            return;
        }

        let Some(url) = track.playable_source() else {
            debug!(track = %track.id, "track has no playable source, ignoring");
            return;
        };
        let url = url.to_string();

        // Tear the old binding down completely before the new one exists.
        self.session.stop();
        self.session.set_position(0.0);
        self.generation += 1;
        self.session.bind(&url, self.generation);

        self.state.current_track = Some(track.clone());
        self.state.status = PlayerStatus::Loading;
        self.state.current_time = 0.0;
        self.state.duration = 0.0;
        self.state.is_playing = true;
        self.session.play();

        info!(track = %track.id, title = %track.title, %url, generation = self.generation, "loading track");
    }

    pub fn pause_track(&mut self) {
        if self.state.current_track.is_none() {
            return;
        }
        self.session.pause();
        self.state.is_playing = false;
        if self.state.status == PlayerStatus::Playing {
            self.state.status = PlayerStatus::Paused;
        }
        debug!("paused");
    }

    /// Resume the current track where it is, without reloading it.
    pub fn resume_track(&mut self) {
        if self.state.current_track.is_none() {
            return;
        }
        if self.state.status == PlayerStatus::Ended {
            self.session.set_position(0.0);
            self.state.current_time = 0.0;
        }
        self.session.play();
        self.state.is_playing = true;
        debug!("resume requested");
    }

    pub fn toggle_play_pause(&mut self) {
        if self.state.is_playing {
            self.pause_track();
        } else {
            self.resume_track();
        }
    }

    /// Seek, clamped to `[0, duration]` (upper bound only once duration is known).
    /// Non-finite targets are ignored.
    pub fn seek_to(&mut self, time: f64) {
        if !time.is_finite() {
            return;
        }
        let mut target = time.max(0.0);
        if self.state.duration > 0.0 {
            target = target.min(self.state.duration);
        }

        self.session.set_position(target);
        self.state.current_time = target;
        if self.state.status == PlayerStatus::Ended {
            self.state.status = PlayerStatus::Paused;
        }
        trace!(target, "seek");
    }

    /// Seek to a fraction of the track (progress-bar click). Needs a known duration.
    pub fn seek_to_fraction(&mut self, fraction: f64) {
        if self.state.duration <= 0.0 || fraction.is_nan() {
            return;
        }
        self.seek_to(fraction.clamp(0.0, 1.0) * self.state.duration);
    }

    /// Set output gain, clamped to `[0, 1]`. Applies with or without a track.
    pub fn set_volume(&mut self, level: f64) {
        let Some(volume) = clamp_unit(level) else {
            return;
        };
        self.session.set_gain(volume as f32);
        self.state.volume = volume;
    }

    /// Silence, or restore the default volume if already silent.
    pub fn toggle_mute(&mut self) {
        if self.state.volume > 0.0 {
            self.set_volume(0.0);
        } else {
            self.set_volume(self.default_volume);
        }
    }

    pub fn next_track(&mut self) {
        let Some(current) = self.state.current_track.as_ref() else {
            return;
        };
        let playlist = &self.state.playlist;
        if playlist.is_empty() {
            return;
        }

        // A current track missing from the playlist counts as "before the first".
        let next = match playlist.iter().position(|t| t.is_same(current)) {
            Some(i) if i + 1 < playlist.len() => Some(playlist[i + 1].clone()),
            Some(_) => None,
            None => Some(playlist[0].clone()),
        };
        if let Some(next) = next {
            self.play_track(&next);
        }
    }

    /// Play the preceding track; at the start of the playlist, restart the
    /// current one instead.
    pub fn previous_track(&mut self) {
        let Some(current) = self.state.current_track.as_ref() else {
            return;
        };
        let playlist = &self.state.playlist;
        if playlist.is_empty() {
            return;
        }

        match playlist.iter().position(|t| t.is_same(current)) {
            Some(i) if i > 0 => {
                let prev = playlist[i - 1].clone();
                self.play_track(&prev);
            }
            _ => self.seek_to(0.0),
        }
    }

    pub fn skip_forward(&mut self, seconds: f64) {
        if self.state.duration <= 0.0 {
            return;
        }
        let target = (self.state.current_time + seconds).min(self.state.duration);
        self.seek_to(target);
    }

    pub fn skip_backward(&mut self, seconds: f64) {
        let target = (self.state.current_time - seconds).max(0.0);
        self.seek_to(target);
    }

    pub fn skip_to_start(&mut self) {
        self.seek_to(0.0);
    }

    /// One second short of the end, so the track doesn't finish immediately.
    pub fn skip_to_end(&mut self) {
        self.seek_to((self.state.duration - 1.0).max(0.0));
    }

    /// Replace the navigation playlist. Current playback is untouched.
    pub fn set_playlist(&mut self, tracks: Vec<Track>) {
        debug!(len = tracks.len(), "playlist replaced");
        self.state.playlist = Playlist::from(tracks);
    }

    /// Apply every session event queued so far. Returns how many were applied.
    pub fn pump_events(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events.try_recv() {
            self.apply_event(event);
            applied += 1;
        }
        applied
    }

    pub fn apply_event(&mut self, event: SessionEvent) {
        if event.generation != self.generation {
            trace!(
                event = ?event.kind,
                stale = event.generation,
                current = self.generation,
                "dropping event from an old binding"
            );
            return;
        }

        match event.kind {
            SessionEventKind::Started => {
                if self.state.is_playing {
                    self.state.status = PlayerStatus::Playing;
                } else {
                    // Paused while the start was in flight.
                    self.session.pause();
                    self.state.status = PlayerStatus::Paused;
                }
            }
            SessionEventKind::Rejected(reason) => {
                warn!(%reason, "playback request rejected");
                self.state.is_playing = false;
                self.state.status = match self.state.status {
                    PlayerStatus::Loading => PlayerStatus::Failed,
                    PlayerStatus::Playing => PlayerStatus::Paused,
                    other => other,
                };
            }
            SessionEventKind::MetadataReady { duration } => {
                if duration.is_finite() && duration >= 0.0 {
                    self.state.duration = duration;
                }
            }
            SessionEventKind::TimeAdvanced { position } => {
                if position.is_finite() {
                    self.state.current_time = position.max(0.0);
                }
            }
            SessionEventKind::Ended => {
                info!("track ended");
                self.state.is_playing = false;
                self.state.status = PlayerStatus::Ended;
                if self.state.duration > 0.0 {
                    self.state.current_time = self.state.duration;
                }
            }
            SessionEventKind::Failed(reason) => {
                warn!(%reason, "playback failed");
                self.state.is_playing = false;
                self.state.status = PlayerStatus::Failed;
            }
        }
    }

    /// Release the output at the end of the application session.
    pub fn release(&mut self) {
        self.session.release();
        self.state.is_playing = false;
        info!("playback output released");
    }
}

/// Clamp into `[0, 1]`; `None` for NaN.
fn clamp_unit(level: f64) -> Option<f64> {
    if level.is_nan() {
        None
    } else {
        Some(level.clamp(0.0, 1.0))
    }
}
