//! Persistent user preferences for the workout builder.

use dirs_next as dirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::api::DEFAULT_BASE_URL;

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_debounce_ms() -> u64 {
    250
}

fn default_workout_type() -> String {
    "Strength".to_string()
}

fn default_duration_minutes() -> u32 {
    60
}

/// Settings stored as JSON in the user's config directory.
///
/// Every field has a serde default so files written by older versions,
/// or edited by hand, still load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default = "default_base_url")]
    pub api_base_url: String,
    /// Overridden by `TRAINER_API_KEY`, see [`crate::api::resolve_api_key`].
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_debounce_ms")]
    pub search_debounce_ms: u64,
    #[serde(default = "default_workout_type")]
    pub default_workout_type: String,
    #[serde(default = "default_duration_minutes")]
    pub default_duration_minutes: u32,
    #[serde(default)]
    pub last_draft: Option<PathBuf>,
}

impl Settings {
    const FILE: &'static str = "trainer_workout_settings.json";

    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join(Self::FILE))
    }

    /// Load settings, falling back to defaults when the file is missing or invalid.
    pub fn load() -> Self {
        if let Some(path) = Self::path() {
            if let Ok(data) = std::fs::read_to_string(&path) {
                match serde_json::from_str(&data) {
                    Ok(cfg) => return cfg,
                    Err(e) => log::warn!("Ignoring invalid settings at {}: {e}", path.display()),
                }
            }
        }
        Self::default()
    }

    /// Persist the settings. Failures are logged and otherwise ignored.
    pub fn save(&self) {
        if let Some(path) = Self::path() {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            if let Ok(data) = serde_json::to_string_pretty(self) {
                if let Err(e) = std::fs::write(&path, data) {
                    log::error!("Failed to save settings to {}: {e}", path.display());
                }
            }
        }
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: default_base_url(),
            api_key: None,
            search_debounce_ms: default_debounce_ms(),
            default_workout_type: default_workout_type(),
            default_duration_minutes: default_duration_minutes(),
            last_draft: None,
        }
    }
}
