use std::fmt;

use serde::{Deserialize, Deserializer};

/// Opaque catalog identity. Two tracks are "the same track" iff their ids match.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct TrackId(pub u64);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A playable catalog item, as returned by the catalog's track-list endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub artist_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub album_title: String,
    #[serde(default)]
    pub album_cover: Option<String>,
    #[serde(default)]
    pub preview_file: Option<String>,
    #[serde(default)]
    pub file: Option<String>,
    /// Advisory; the session's metadata is authoritative once loaded.
    #[serde(default, deserialize_with = "null_as_default")]
    pub duration: f64,
    #[serde(default)]
    pub genre: Option<String>,
}

impl Track {
    /// The source a play session should load: the primary file when present,
    /// otherwise the preview. Empty strings count as absent.
    pub fn playable_source(&self) -> Option<&str> {
        non_empty(self.file.as_deref()).or_else(|| non_empty(self.preview_file.as_deref()))
    }

    pub fn is_same(&self, other: &Track) -> bool {
        self.id == other.id
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
impl Track {
    /// Minimal track for tests: `title` is `T<id>`, primary source `file`.
    pub(crate) fn fixture(id: u64, file: Option<&str>, preview_file: Option<&str>) -> Self {
        Self {
            id: TrackId(id),
            title: format!("T{id}"),
            artist_name: "Artist".to_string(),
            album_title: "Album".to_string(),
            album_cover: None,
            preview_file: preview_file.map(str::to_string),
            file: file.map(str::to_string),
            duration: 180.0,
            genre: None,
        }
    }
}
