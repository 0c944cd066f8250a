//! Error types shared by the audio backend and the catalog loader.
//!
//! None of these ever reach a playback command's caller: the controller
//! turns session errors into observable state and a log line.

use thiserror::Error;

/// Failures an audio session can hit while loading or starting a source.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The source could not be read from disk.
    #[error("failed to read source {url}: {source}")]
    Read {
        url: String,
        #[source]
        source: std::io::Error,
    },

    /// The source could not be fetched over HTTP.
    #[error("failed to fetch source {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: ureq::Error,
    },

    /// The bytes were fetched but are not a format we can decode.
    #[error("failed to decode source {url}: {reason}")]
    Decode { url: String, reason: String },

    /// No output device could be opened.
    #[error("audio output unavailable: {0}")]
    Output(String),

    /// `play` was requested with nothing bound (or the bind failed).
    #[error("no playable source bound")]
    NoSource,
}

/// Failures loading the catalog dump the front end browses.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid catalog JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
