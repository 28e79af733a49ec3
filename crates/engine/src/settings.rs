use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{EngineError, Result};
use crate::source::{SampleVideo, default_samples};

/// Environment variable naming an optional JSON settings file.
pub const SETTINGS_ENV_VAR: &str = "CAPEDIT_SETTINGS";

/// Default length of a newly added caption in seconds.
pub const DEFAULT_CAPTION_SECONDS: f64 = 5.0;
const DEFAULT_TICK_INTERVAL_MS: u64 = 250;
const DEFAULT_PREVIEW_MAX_WIDTH: u32 = 640;

/// Editor-wide settings. Fields missing from a settings file keep defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    pub default_caption_seconds: f64,
    pub tick_interval_ms: u64,
    pub preview_max_width: u32,
    /// Requests playback as soon as a source finishes loading.
    pub autoplay: bool,
    pub samples: Vec<SampleVideo>,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            default_caption_seconds: DEFAULT_CAPTION_SECONDS,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            preview_max_width: DEFAULT_PREVIEW_MAX_WIDTH,
            autoplay: false,
            samples: default_samples(),
        }
    }
}

impl EditorSettings {
    /// Reads settings from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| EngineError::SettingsIo {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_json(&raw).map_err(|source| {
            EngineError::SettingsSerialization {
                path: path.to_path_buf(),
                source,
            }
        })?;
        info!(path = %path.display(), "settings loaded");
        Ok(settings)
    }

    /// Loads the file named by `CAPEDIT_SETTINGS`, or defaults when unset.
    pub fn from_env() -> Result<Self> {
        match std::env::var_os(SETTINGS_ENV_VAR) {
            Some(path) if !path.is_empty() => Self::load(path),
            _ => Ok(Self::default()),
        }
    }

    fn from_json(raw: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_CAPTION_SECONDS, EditorSettings};
    use crate::error::EngineError;

    #[test]
    fn partial_json_keeps_defaults_for_missing_fields() {
        let settings = EditorSettings::from_json(r#"{ "autoplay": true, "tick_interval_ms": 100 }"#)
            .expect("settings should parse");

        assert!(settings.autoplay);
        assert_eq!(settings.tick_interval_ms, 100);
        assert_eq!(settings.default_caption_seconds, DEFAULT_CAPTION_SECONDS);
        assert_eq!(settings.samples.len(), 3);
    }

    #[test]
    fn zero_tick_interval_is_raised_to_one_millisecond() {
        let settings = EditorSettings {
            tick_interval_ms: 0,
            ..EditorSettings::default()
        };

        assert_eq!(settings.tick_interval().as_millis(), 1);
    }

    #[test]
    fn load_reports_missing_file_with_path() {
        let path = std::env::temp_dir().join("capedit-missing-settings.json");

        let error = EditorSettings::load(&path).expect_err("load should fail");

        let EngineError::SettingsIo { path: reported, .. } = error else {
            panic!("expected SettingsIo");
        };
        assert_eq!(reported, path);
    }

    #[test]
    fn load_reports_malformed_json() {
        let path = std::env::temp_dir().join(format!(
            "capedit-settings-{}.json",
            std::process::id()
        ));
        std::fs::write(&path, "{ not json").expect("write settings file");

        let result = EditorSettings::load(&path);
        let _ = std::fs::remove_file(&path);

        assert!(matches!(
            result,
            Err(EngineError::SettingsSerialization { .. })
        ));
    }
}
