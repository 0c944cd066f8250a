//! Event types raised by audio sessions.

use std::sync::mpsc::Sender;

/// What happened inside a session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEventKind {
    /// A `play` request was honoured and output is running.
    Started,
    /// The host declined a `play` request (nothing bound, no device, ...).
    Rejected(String),
    /// Duration of the bound source is known. Raised once per bind.
    MetadataReady { duration: f64 },
    /// Periodic position report while playing.
    TimeAdvanced { position: f64 },
    /// The source played through to the end.
    Ended,
    /// Hard fetch/decode error after bind; the binding is unusable.
    Failed(String),
}

/// A session notification, stamped with the generation passed to the `bind`
/// it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionEvent {
    pub generation: u64,
    pub kind: SessionEventKind,
}

impl SessionEvent {
    pub fn new(generation: u64, kind: SessionEventKind) -> Self {
        Self { generation, kind }
    }
}

pub type EventSender = Sender<SessionEvent>;
