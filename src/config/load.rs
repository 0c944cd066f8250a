use std::env;
use std::path::{Path, PathBuf};

use ::config::{Config, ConfigError, Environment, File};

use super::schema::Settings;

/// Environment prefix; `ENCORE__PLAYER__TICK_MS` sets `player.tick_ms`.
const ENV_PREFIX: &str = "ENCORE";

impl Settings {
    /// Layer defaults, the config file at [`resolve_config_path`] and `ENCORE__*`.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(resolve_config_path().as_deref())
    }

    /// Same as [`load`](Self::load) with an explicit (optional) file.
    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }
        builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Load and validate, falling back to defaults on any problem.
    ///
    /// Runs before logging is up, so the reason for a fallback is returned
    /// for the caller to report.
    pub fn load_or_default() -> (Self, Option<String>) {
        match Self::load().map(|s| s.validate().map(|()| s)) {
            Ok(Ok(s)) => (s, None),
            Ok(Err(msg)) => (
                Self::default(),
                Some(format!("invalid config, using defaults: {msg}")),
            ),
            Err(e) => (
                Self::default(),
                Some(format!("failed to load config, using defaults: {e}")),
            ),
        }
    }

    /// Range checks the schema can't express.
    pub fn validate(&self) -> Result<(), String> {
        let unit = 0.0..=1.0;
        if !unit.contains(&self.player.default_volume) {
            return Err("player.default_volume must be within [0, 1]".to_string());
        }
        if !unit.contains(&self.preview.gain) {
            return Err("preview.gain must be within [0, 1]".to_string());
        }
        if !(self.player.skip_seconds > 0.0) {
            return Err("player.skip_seconds must be > 0".to_string());
        }
        if self.player.tick_ms < 10 {
            return Err("player.tick_ms must be >= 10".to_string());
        }
        Ok(())
    }
}

/// `ENCORE_CONFIG_PATH` if set, else [`default_config_path`].
pub fn resolve_config_path() -> Option<PathBuf> {
    env::var_os("ENCORE_CONFIG_PATH")
        .map(PathBuf::from)
        .or_else(default_config_path)
}

/// `$XDG_CONFIG_HOME/encore/config.toml`, or `~/.config/encore/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
        .map(|dir| dir.join("encore").join("config.toml"))
}
