use crate::submission::Readiness;
use anyhow::{Context, Result};
use log::{info, warn};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

pub const BACKEND_ENV: &str = "POURDECK_BACKEND";

pub static DEFAULT_BACKEND: Lazy<Url> =
    Lazy::new(|| Url::parse("http://127.0.0.1:5000/").expect("constant backend URL"));

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct AppSettings {
    pub backend_url: Url,
    pub request_timeout_ms: u64,
    pub search_debounce_ms: u64,
    pub readiness_attempts: u32,
    pub readiness_interval_ms: u64,
    pub baud_rate: u32,
    pub drink_types: Vec<String>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND.clone(),
            request_timeout_ms: 10_000,
            search_debounce_ms: 300,
            readiness_attempts: 30,
            readiness_interval_ms: 500,
            baud_rate: 115_200,
            drink_types: vec!["Regular".into(), "Light".into(), "Strong".into()],
        }
    }
}

impl AppSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn readiness(&self) -> Readiness {
        Readiness {
            attempts: self.readiness_attempts,
            interval: Duration::from_millis(self.readiness_interval_ms),
        }
    }

    /// Read settings from `path`. A missing file is not an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("[SETTINGS] No settings at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {:?}", path))?;
        let mut settings: AppSettings = serde_json::from_str(&text)
            .with_context(|| format!("Invalid settings file {:?}", path))?;
        settings.backend_url = with_trailing_slash(settings.backend_url);
        Ok(settings)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {:?}", parent))?;
        }
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text).with_context(|| format!("Failed to write settings to {:?}", path))?;
        Ok(())
    }

    /// Replace the backend address with an override such as the
    /// `POURDECK_BACKEND` value. Unparseable overrides are ignored.
    pub fn apply_backend_override(&mut self, value: Option<&str>) {
        let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return;
        };
        match Url::parse(raw) {
            Ok(url) => {
                info!("[SETTINGS] Backend overridden to {}", url);
                self.backend_url = with_trailing_slash(url);
            }
            Err(e) => warn!("[SETTINGS] Ignoring {}={:?}: {}", BACKEND_ENV, raw, e),
        }
    }
}

/// Settings for this run: the user file (or defaults) plus the environment.
pub fn load_settings() -> AppSettings {
    let mut settings = load_or_init(&user_config_path());
    let env_value = std::env::var(BACKEND_ENV).ok();
    settings.apply_backend_override(env_value.as_deref());
    settings
}

/// A missing file is created with the defaults so there is something to edit.
/// A broken file is left alone.
pub fn load_or_init(path: &Path) -> AppSettings {
    if !path.exists() {
        let settings = AppSettings::default();
        match settings.save_to(path) {
            Ok(()) => info!("[SETTINGS] Wrote defaults to {:?}", path),
            Err(e) => warn!("[SETTINGS] {:#}", e),
        }
        return settings;
    }
    AppSettings::load_from(path).unwrap_or_else(|e| {
        warn!("[SETTINGS] {:#}; using defaults", e);
        AppSettings::default()
    })
}

// `Url::join` drops the last path segment unless the base ends in '/'.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

pub fn user_config_path() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        if let Some(home) = home::home_dir() {
            return home
                .join("Library")
                .join("Application Support")
                .join("Pourdeck")
                .join("settings.json");
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Some(base) = std::env::var_os("APPDATA") {
            return PathBuf::from(base).join("Pourdeck").join("settings.json");
        }
    }

    // Linux / fallback: XDG or ~/.config
    if let Ok(base) = std::env::var("XDG_CONFIG_HOME") {
        PathBuf::from(base).join("pourdeck").join("settings.json")
    } else if let Some(home) = home::home_dir() {
        home.join(".config").join("pourdeck").join("settings.json")
    } else {
        PathBuf::from("settings.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = AppSettings::load_from(&dir.path().join("settings.json")).unwrap();
        assert_eq!(settings, AppSettings::default());
        assert_eq!(settings.backend_url.as_str(), "http://127.0.0.1:5000/");
        assert_eq!(settings.readiness().attempts, 30);
        assert_eq!(settings.search_debounce(), Duration::from_millis(300));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"backend_url": "http://kiosk.local:8080/api", "baud_rate": 57600}"#)
            .unwrap();

        let settings = AppSettings::load_from(&path).unwrap();
        assert_eq!(settings.backend_url.as_str(), "http://kiosk.local:8080/api/");
        assert_eq!(settings.baud_rate, 57600);
        assert_eq!(settings.request_timeout_ms, 10_000);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        let err = AppSettings::load_from(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("Invalid settings file"));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let mut settings = AppSettings::default();
        settings.drink_types = vec!["Tall".into()];
        settings.save_to(&path).unwrap();
        assert_eq!(AppSettings::load_from(&path).unwrap(), settings);
    }

    #[test]
    fn test_first_run_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pourdeck").join("settings.json");
        assert_eq!(load_or_init(&path), AppSettings::default());
        assert!(path.exists());
        assert_eq!(AppSettings::load_from(&path).unwrap(), AppSettings::default());
    }

    #[test]
    fn test_broken_file_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(load_or_init(&path), AppSettings::default());
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[test]
    fn test_backend_override() {
        let mut settings = AppSettings::default();
        settings.apply_backend_override(Some("http://10.0.0.5:5000"));
        assert_eq!(settings.backend_url.as_str(), "http://10.0.0.5:5000/");

        settings.apply_backend_override(Some("not a url"));
        assert_eq!(settings.backend_url.as_str(), "http://10.0.0.5:5000/", "Bad override ignored");

        settings.apply_backend_override(None);
        settings.apply_backend_override(Some("  "));
        assert_eq!(settings.backend_url.as_str(), "http://10.0.0.5:5000/");
    }
}
