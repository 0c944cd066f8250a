//! Hover previews: one short-lived, independently owned session per hovered
//! catalog row. Previews never touch the controller's session.

mod player;

pub use player::{PreviewPhase, PreviewPlayer};
