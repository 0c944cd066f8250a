use crate::audio::AudioSession;
use crate::catalog::Track;

use super::controller::PlaybackController;

/// Commands a subscriber can send to the playback service.
#[derive(Debug, Clone)]
pub enum PlayerCmd {
    /// Play a track, or toggle it if it is already current.
    PlayTrack(Track),
    Pause,
    Resume,
    TogglePlayPause,
    /// Seek to an absolute position in seconds.
    SeekTo(f64),
    /// Seek to a fraction of the known duration.
    SeekToFraction(f64),
    SetVolume(f64),
    ToggleMute,
    Next,
    Previous,
    /// Relative seek forward by the given seconds.
    SkipForward(f64),
    /// Relative seek backward by the given seconds.
    SkipBackward(f64),
    SkipToStart,
    SkipToEnd,
    SetPlaylist(Vec<Track>),
    /// Release the output and stop the service.
    Quit,
}

impl<S: AudioSession> PlaybackController<S> {
    /// Apply `cmd`. Returns `false` once the controller has been told to quit.
    pub fn dispatch(&mut self, cmd: PlayerCmd) -> bool {
        match cmd {
            PlayerCmd::PlayTrack(track) => self.play_track(&track),
            PlayerCmd::Pause => self.pause_track(),
            PlayerCmd::Resume => self.resume_track(),
            PlayerCmd::TogglePlayPause => self.toggle_play_pause(),
            PlayerCmd::SeekTo(t) => self.seek_to(t),
            PlayerCmd::SeekToFraction(f) => self.seek_to_fraction(f),
            PlayerCmd::SetVolume(v) => self.set_volume(v),
            PlayerCmd::ToggleMute => self.toggle_mute(),
            PlayerCmd::Next => self.next_track(),
            PlayerCmd::Previous => self.previous_track(),
            PlayerCmd::SkipForward(s) => self.skip_forward(s),
            PlayerCmd::SkipBackward(s) => self.skip_backward(s),
            PlayerCmd::SkipToStart => self.skip_to_start(),
            PlayerCmd::SkipToEnd => self.skip_to_end(),
            PlayerCmd::SetPlaylist(tracks) => self.set_playlist(tracks),
            PlayerCmd::Quit => {
                self.release();
                return false;
            }
        }
        true
    }
}
