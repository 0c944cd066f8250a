//! Catalog types and helpers.
//!
//! The catalog service owns tracks; this module only knows the shape of its
//! track-list JSON, how to resolve service-relative paths, and how to label
//! tracks and times for display.

mod display;
mod load;
mod model;

pub use display::{format_time, track_label};
pub use load::{load_catalog, parse_catalog, resolve_url};
pub use model::{Track, TrackId};
