use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use crate::config::CatalogSettings;
use crate::error::CatalogError;

use super::model::Track;

/// The track-list endpoint returns a bare array; paginated dumps wrap it.
#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogDump {
    Plain(Vec<Track>),
    Paged { results: Vec<Track> },
}

/// Resolve a service-relative path against `base_url`.
///
/// Absolute URLs (anything starting with `http`) are returned unchanged.
pub fn resolve_url(base_url: &str, path: &str) -> String {
    if path.starts_with("http") || base_url.is_empty() {
        return path.to_string();
    }
    let base = base_url.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

/// Parse a catalog dump and resolve every source and cover path.
pub fn parse_catalog(json: &str, base_url: &str) -> Result<Vec<Track>, serde_json::Error> {
    let dump: CatalogDump = serde_json::from_str(json)?;
    let mut tracks = match dump {
        CatalogDump::Plain(v) => v,
        CatalogDump::Paged { results } => results,
    };

    for t in &mut tracks {
        for slot in [&mut t.file, &mut t.preview_file, &mut t.album_cover] {
            *slot = slot
                .take()
                .filter(|p| !p.trim().is_empty())
                .map(|p| resolve_url(base_url, &p));
        }
    }
    Ok(tracks)
}

/// Read the catalog dump at `path`.
pub fn load_catalog(path: &Path, settings: &CatalogSettings) -> Result<Vec<Track>, CatalogError> {
    let display = path.display().to_string();
    let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: display.clone(),
        source,
    })?;
    let tracks =
        parse_catalog(&json, &settings.base_url).map_err(|source| CatalogError::Json {
            path: display.clone(),
            source,
        })?;

    let unplayable = tracks
        .iter()
        .filter(|t| t.playable_source().is_none())
        .count();
    if unplayable > 0 {
        debug!(unplayable, "catalog has tracks without any source");
    }
    info!(path = %path.display(), count = tracks.len(), "catalog loaded");
    Ok(tracks)
}
