//! Audio session abstraction.
//!
//! An [`AudioSession`] wraps exactly one output binding. Commands go in
//! through the trait; lifecycle notifications come back asynchronously as
//! [`SessionEvent`]s on the channel the session was opened with.

mod session;
mod sink;
mod thread;
mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use session::AudioSession;
pub use thread::{RodioSession, SessionOptions};
pub use types::{EventSender, SessionEvent, SessionEventKind};
