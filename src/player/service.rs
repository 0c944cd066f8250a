use std::sync::mpsc::{self, RecvTimeoutError, SendError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

use crate::audio::{AudioSession, EventSender};
use crate::config::PlayerSettings;

use super::command::PlayerCmd;
use super::controller::PlaybackController;
use super::state::{PlaybackState, StateHandle};

/// How often the service thread looks for session events between commands.
const EVENT_POLL: Duration = Duration::from_millis(25);

/// The process-wide playback service.
///
/// Owns the one [`PlaybackController`] on a dedicated thread. Commands and
/// session events are serialised onto that thread; every change is published
/// to a shared [`StateHandle`] that any number of subscribers can read.
pub struct PlayerService {
    tx: Sender<PlayerCmd>,
    state: StateHandle,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl PlayerService {
    /// Start the service. `open_session` runs on the service thread and is
    /// handed the sender its session must raise events on.
    pub fn spawn<S, F>(settings: &PlayerSettings, open_session: F) -> Self
    where
        S: AudioSession + 'static,
        F: FnOnce(EventSender) -> S + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<PlayerCmd>();
        let state: StateHandle = Arc::new(Mutex::new(PlaybackState::new(
            settings.default_volume.clamp(0.0, 1.0),
        )));

        let settings = settings.clone();
        let published = state.clone();
        let join = thread::spawn(move || {
            let (event_tx, event_rx) = mpsc::channel();
            let session = open_session(event_tx);
            let mut controller = PlaybackController::new(session, event_rx, &settings);
            publish(&published, &controller);

            loop {
                match rx.recv_timeout(EVENT_POLL) {
                    Ok(cmd) => {
                        let keep_running = controller.dispatch(cmd);
                        controller.pump_events();
                        publish(&published, &controller);
                        if !keep_running {
                            break;
                        }
                    }
                    Err(RecvTimeoutError::Timeout) => {
                        if controller.pump_events() > 0 {
                            publish(&published, &controller);
                        }
                    }
                    Err(RecvTimeoutError::Disconnected) => {
                        controller.release();
                        publish(&published, &controller);
                        break;
                    }
                }
            }
            debug!("player service stopped");
        });

        Self {
            tx,
            state,
            join: Mutex::new(Some(join)),
        }
    }

    /// Handle onto the latest published state.
    pub fn state_handle(&self) -> StateHandle {
        self.state.clone()
    }

    /// Copy of the latest published state.
    pub fn snapshot(&self) -> PlaybackState {
        match self.state.lock() {
            Ok(s) => s.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn send(&self, cmd: PlayerCmd) -> Result<(), SendError<PlayerCmd>> {
        self.tx.send(cmd)
    }

    /// Release the output and wait for the service thread to finish.
    pub fn shutdown(&self) {
        let _ = self.send(PlayerCmd::Quit);

        if let Ok(mut j) = self.join.lock() {
            if let Some(h) = j.take() {
                if h.join().is_err() {
                    warn!("player service thread panicked");
                }
            }
        }
    }
}

fn publish<S: AudioSession>(handle: &StateHandle, controller: &PlaybackController<S>) {
    if let Ok(mut s) = handle.lock() {
        *s = controller.state().clone();
    }
}
