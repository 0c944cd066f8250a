//! Playback controller: the one authoritative "now playing" state.
//!
//! [`PlaybackController`] is the state machine; [`PlayerService`] runs it
//! on its own thread for a multi-surface front end and publishes snapshots
//! through a [`StateHandle`].

mod command;
mod controller;
mod service;
mod state;

pub use command::PlayerCmd;
pub use controller::PlaybackController;
pub use service::PlayerService;
pub use state::{PlaybackState, PlayerStatus, Playlist, StateHandle};

#[cfg(test)]
mod tests;
