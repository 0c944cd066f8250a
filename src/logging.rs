//! Tracing setup. The terminal is in raw mode while the UI runs, so events go
//! to a log file instead of stderr.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingSettings;

/// Where log lines go when no file is configured.
pub fn default_log_path() -> PathBuf {
    std::env::temp_dir().join("encore.log")
}

/// Install the global subscriber. `RUST_LOG` wins over `logging.filter`.
///
/// Returns the file being written to.
pub fn init(settings: &LoggingSettings) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let path = settings.file.clone().unwrap_or_else(default_log_path);
    let file = open_log_file(&path)?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter_from(settings)))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(Mutex::new(file)),
        )
        .try_init()?;

    Ok(path)
}

fn filter_from(settings: &LoggingSettings) -> EnvFilter {
    EnvFilter::try_new(&settings.filter).unwrap_or_else(|_| EnvFilter::new("encore=info"))
}

fn open_log_file(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}
