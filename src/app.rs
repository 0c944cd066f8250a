//! Application module: the terminal front end's model.
//!
//! `App` holds the catalog list, the cursor (which doubles as hover) and the
//! preview player for the hovered row. Playback state is not kept here; it is
//! read from the player service on every frame.

mod model;

pub use model::*;
