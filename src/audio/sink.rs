//! Utilities for turning a source URL into a `rodio` sink.
//!
//! Sources are read fully into memory so a sink can be rebuilt at any
//! offset (seek fallback, replay after end) without fetching again.

use std::io::{Cursor, Read};
use std::sync::Arc;
use std::time::Duration;

use lofty::prelude::*;
use lofty::probe::Probe;
use rodio::{Decoder, OutputStream, Sink, Source};
use ureq::Agent;

use crate::error::SessionError;

pub(super) type SourceBytes = Arc<[u8]>;

fn is_http(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Fetch the whole source: HTTP(S) through `ureq`, anything else from disk.
pub(super) fn fetch_source(url: &str, timeout: Duration) -> Result<SourceBytes, SessionError> {
    if is_http(url) {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        let response = agent.get(url).call().map_err(|source| SessionError::Fetch {
            url: url.to_string(),
            source,
        })?;

        let mut bytes = Vec::new();
        response
            .into_body()
            .into_reader()
            .read_to_end(&mut bytes)
            .map_err(|source| SessionError::Read {
                url: url.to_string(),
                source,
            })?;
        return Ok(bytes.into());
    }

    let path = url.strip_prefix("file://").unwrap_or(url);
    std::fs::read(path)
        .map(SourceBytes::from)
        .map_err(|source| SessionError::Read {
            url: url.to_string(),
            source,
        })
}

/// Create a paused `Sink` for `bytes` that starts playback at `start_at`.
///
/// Also returns the decoder's idea of the total duration, if it has one.
pub(super) fn create_sink_at(
    stream: &OutputStream,
    url: &str,
    bytes: &SourceBytes,
    start_at: Duration,
) -> Result<(Sink, Option<Duration>), SessionError> {
    let source = Decoder::builder()
        .with_data(Cursor::new(bytes.clone()))
        .with_byte_len(bytes.len() as u64)
        .with_seekable(true)
        .build()
        .map_err(|e| SessionError::Decode {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
    let total = source.total_duration();

    let sink = Sink::connect_new(stream.mixer());
    // `skip_duration` is the fallback seeking primitive; Duration::ZERO is fine.
    sink.append(source.skip_duration(start_at));
    sink.pause();
    Ok((sink, total))
}

/// Read the duration from container metadata when the decoder can't tell.
pub(super) fn probe_duration(bytes: &[u8]) -> Option<Duration> {
    let tagged = Probe::new(Cursor::new(bytes))
        .guess_file_type()
        .ok()?
        .read()
        .ok()?;
    Some(tagged.properties().duration()).filter(|d| !d.is_zero())
}
