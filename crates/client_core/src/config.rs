use std::{fs, path::Path, time::Duration};

use serde::Deserialize;
use shared::domain::LengthScale;
use tracing::warn;

pub const SETTINGS_FILE: &str = "configurator.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server_url: String,
    /// Display units per metre in the editing tables.
    pub length_scale: f64,
    pub save_error_cooldown_ms: u64,
    pub request_timeout_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:1200".into(),
            length_scale: 1.0,
            save_error_cooldown_ms: 5000,
            request_timeout_ms: 10_000,
        }
    }
}

impl Settings {
    pub fn length_scale(&self) -> LengthScale {
        LengthScale::new(self.length_scale).unwrap_or_else(|| {
            warn!(
                length_scale = self.length_scale,
                "config: length scale must be positive; using SI units"
            );
            LengthScale::SI
        })
    }

    pub fn save_error_cooldown(&self) -> Duration {
        Duration::from_millis(self.save_error_cooldown_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

pub fn load_settings() -> Settings {
    load_settings_from(Path::new(SETTINGS_FILE), |key| std::env::var(key).ok())
}

/// File values override defaults; environment overrides both. Values that do
/// not parse are ignored.
pub fn load_settings_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<Settings>(&raw) {
            Ok(file_cfg) => settings = file_cfg,
            Err(error) => warn!(path = %path.display(), %error, "config: ignoring unreadable settings file"),
        }
    }

    if let Some(v) = env("CONFIGURATOR_SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = env("APP__SERVER_URL") {
        settings.server_url = v;
    }

    if let Some(v) = env("APP__LENGTH_SCALE") {
        if let Ok(parsed) = v.trim().parse::<f64>() {
            settings.length_scale = parsed;
        }
    }

    if let Some(v) = env("APP__SAVE_ERROR_COOLDOWN_MS") {
        if let Ok(parsed) = v.trim().parse::<u64>() {
            settings.save_error_cooldown_ms = parsed;
        }
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_MS") {
        if let Ok(parsed) = v.trim().parse::<u64>() {
            settings.request_timeout_ms = parsed;
        }
    }

    settings
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
