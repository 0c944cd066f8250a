//! Scripted session used by controller and preview tests.

use std::sync::{Arc, Mutex};

use super::session::AudioSession;
use super::types::{EventSender, SessionEvent, SessionEventKind};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SessionCall {
    Bind(String, u64),
    Play,
    Pause,
    Stop,
    SetPosition(f64),
    SetGain(f32),
    Release,
}

pub(crate) type CallLog = Arc<Mutex<Vec<SessionCall>>>;

/// How the fake host answers `play`.
#[derive(Debug, Clone)]
pub(crate) enum PlayReply {
    /// Answer with `Started` right away.
    Start,
    /// Answer with `Rejected(reason)` right away.
    Reject(String),
    /// Don't answer; the test injects the outcome itself.
    Silent,
}

pub(crate) struct RecordingSession {
    calls: CallLog,
    events: EventSender,
    generation: u64,
    reply: PlayReply,
}

impl RecordingSession {
    pub(crate) fn new(events: EventSender, reply: PlayReply) -> Self {
        Self::with_log(events, reply, CallLog::default())
    }

    /// Record into an existing log (for sessions built on another thread).
    pub(crate) fn with_log(events: EventSender, reply: PlayReply, calls: CallLog) -> Self {
        Self {
            calls,
            events,
            generation: 0,
            reply,
        }
    }

    pub(crate) fn log(&self) -> CallLog {
        self.calls.clone()
    }

    fn record(&self, call: SessionCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl AudioSession for RecordingSession {
    fn bind(&mut self, url: &str, generation: u64) {
        self.generation = generation;
        self.record(SessionCall::Bind(url.to_string(), generation));
    }

    fn play(&mut self) {
        self.record(SessionCall::Play);
        let kind = match &self.reply {
            PlayReply::Start => SessionEventKind::Started,
            PlayReply::Reject(reason) => SessionEventKind::Rejected(reason.clone()),
            PlayReply::Silent => return,
        };
        let _ = self.events.send(SessionEvent::new(self.generation, kind));
    }

    fn pause(&mut self) {
        self.record(SessionCall::Pause);
    }

    fn stop(&mut self) {
        self.record(SessionCall::Stop);
    }

    fn set_position(&mut self, seconds: f64) {
        self.record(SessionCall::SetPosition(seconds));
    }

    fn set_gain(&mut self, level: f32) {
        self.record(SessionCall::SetGain(level));
    }

    fn release(&mut self) {
        self.record(SessionCall::Release);
    }
}

pub(crate) fn take_calls(log: &CallLog) -> Vec<SessionCall> {
    std::mem::take(&mut *log.lock().unwrap())
}
