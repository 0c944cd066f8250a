//! Observable playback state shared with every subscriber.

use std::sync::{Arc, Mutex};

use crate::catalog::{Track, TrackId};

/// Navigation order for next/previous. Order as supplied is authoritative.
pub type Playlist = Arc<[Track]>;

/// Confirmed position of the current track in its lifecycle.
///
/// Advanced by session events; commands only ever move it to `Loading`
/// (new track) or between `Playing` and `Paused`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum PlayerStatus {
    #[default]
    Idle,
    Loading,
    Playing,
    Paused,
    Ended,
    Failed,
}

/// The controller's state, as subscribers see it.
///
/// `is_playing` is the intent set when a command is issued; `status` is what
/// the session has confirmed so far.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    pub current_track: Option<Track>,
    pub status: PlayerStatus,
    pub is_playing: bool,
    /// Seconds, >= 0.
    pub current_time: f64,
    /// Seconds; 0 means unknown.
    pub duration: f64,
    /// Output gain in `[0, 1]`.
    pub volume: f64,
    pub playlist: Playlist,
}

impl PlaybackState {
    pub fn new(volume: f64) -> Self {
        Self {
            current_track: None,
            status: PlayerStatus::Idle,
            is_playing: false,
            current_time: 0.0,
            duration: 0.0,
            volume,
            playlist: Playlist::from(Vec::new()),
        }
    }

    /// Fraction of the track played, in `[0, 1]`; 0 when duration is unknown.
    pub fn progress(&self) -> f64 {
        if self.duration > 0.0 {
            (self.current_time / self.duration).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Whether `id` is the current track and is meant to be playing.
    pub fn is_current_and_playing(&self, id: TrackId) -> bool {
        self.is_playing && self.current_track.as_ref().is_some_and(|t| t.id == id)
    }

    pub fn is_current(&self, id: TrackId) -> bool {
        self.current_track.as_ref().is_some_and(|t| t.id == id)
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::new(0.7)
    }
}

/// Shared read handle onto the latest published state.
pub type StateHandle = Arc<Mutex<PlaybackState>>;
