use std::path::PathBuf;

use serde::Deserialize;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/encore/config.toml` or `~/.config/encore/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `ENCORE__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub player: PlayerSettings,
    pub preview: PreviewSettings,
    pub catalog: CatalogSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlayerSettings {
    /// Output gain the controller starts with, in `[0, 1]`.
    /// Also the level `toggle_mute` restores to.
    pub default_volume: f64,
    /// Seconds moved by skip forward / skip backward.
    pub skip_seconds: f64,
    /// How often (milliseconds) a playing session reports its position.
    pub tick_ms: u64,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            default_volume: 0.7,
            skip_seconds: 10.0,
            tick_ms: 250,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PreviewSettings {
    /// Whether resting the cursor on a row starts a preview at all.
    pub enabled: bool,
    /// Delay between hover start and preview start (milliseconds).
    pub debounce_ms: u64,
    /// Output gain for previews, in `[0, 1]`.
    pub gain: f64,
    /// Previews stop on their own after this many seconds.
    pub window_secs: u64,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            debounce_ms: 150,
            gain: 0.3,
            window_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    /// Track-list JSON dump to browse (used when no path is given on the command line).
    pub path: PathBuf,
    /// Prefix for service-relative `file` / `preview_file` / `album_cover` paths.
    pub base_url: String,
    /// Timeout for fetching an HTTP source (seconds).
    pub fetch_timeout_secs: u64,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("catalog.json"),
            base_url: String::new(),
            fetch_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is not set.
    pub filter: String,
    /// Log file; the terminal is in raw mode so logs never go to stderr.
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "encore=info".to_string(),
            file: None,
        }
    }
}
