use super::model::Track;

/// Format seconds as `m:ss`. Unknown (zero, negative, NaN) renders as `0:00`.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "0:00".to_string();
    }
    let total = seconds.floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

/// "Artist - Title", or just the title when the artist is blank.
pub fn track_label(track: &Track) -> String {
    match track.artist_name.trim() {
        "" => track.title.clone(),
        artist => format!("{} - {}", artist, track.title.trim()),
    }
}
