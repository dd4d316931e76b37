//! Settings management for the shroud_ledd daemon.
//!
//! Handles loading, clamping and persisting the JSON settings file that
//! selects the color, the animation and the temperature thresholds.

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::sync::RwLock;

use crate::{animation::AnimationMode, temperature::Rgb};

/// File name of the settings file, resolved next to the executable.
pub const SETTINGS_FILE_NAME: &str = "Settings.json";

/// User settings as stored on disk.
///
/// # Example
///
/// ```json
/// {
///   "R": 255,
///   "G": 0,
///   "B": 0,
///   "AnimationType": 0,
///   "TemperatureUpperLimit": 85,
///   "TemperatureLowerLimit": 45,
///   "OverwriteSecurityChecks": false
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Settings {
    #[serde(rename = "R")]
    pub r: u8,

    #[serde(rename = "G")]
    pub g: u8,

    #[serde(rename = "B")]
    pub b: u8,

    #[serde(default)]
    pub animation_type: AnimationMode,

    #[serde(default = "defaults::temperature_upper_limit")]
    pub temperature_upper_limit: i32,

    #[serde(default = "defaults::temperature_lower_limit")]
    pub temperature_lower_limit: i32,

    /// Controls every adapter of the active vendor, not only supported cards.
    #[serde(default)]
    pub overwrite_security_checks: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            r: 255,
            g: 0,
            b: 0,
            animation_type: AnimationMode::NoAnimation,
            temperature_upper_limit: defaults::temperature_upper_limit(),
            temperature_lower_limit: defaults::temperature_lower_limit(),
            overwrite_security_checks: false,
        }
    }
}

impl Settings {
    pub fn color(&self) -> Rgb {
        Rgb::new(self.r, self.g, self.b)
    }

    /// Forces the thresholds into a usable range.
    ///
    /// Lower is raised to at least 0, upper is capped at 100, and upper is
    /// bumped to `lower + 1` whenever it does not exceed lower.
    ///
    /// ```
    /// use shroud_ledd::config::Settings;
    ///
    /// let settings = Settings {
    ///     temperature_lower_limit: 80,
    ///     temperature_upper_limit: 50,
    ///     ..Settings::default()
    /// }
    /// .clamped();
    /// assert_eq!(settings.temperature_upper_limit, 81);
    /// ```
    pub fn clamped(mut self) -> Self {
        if self.temperature_lower_limit < 0 {
            self.temperature_lower_limit = 0;
        }

        if self.temperature_upper_limit > 100 {
            self.temperature_upper_limit = 100;
        }

        if self.temperature_upper_limit <= self.temperature_lower_limit {
            self.temperature_upper_limit = self.temperature_lower_limit.saturating_add(1);
        }

        self
    }

    /// `(lower, upper)` temperature thresholds.
    pub fn temperature_limits(&self) -> (i32, i32) {
        (self.temperature_lower_limit, self.temperature_upper_limit)
    }
}

mod defaults {
    pub fn temperature_upper_limit() -> i32 {
        85
    }

    pub fn temperature_lower_limit() -> i32 {
        45
    }
}

/// Default settings path: next to the running executable.
pub fn default_settings_path() -> Result<PathBuf> {
    let exe = env::current_exe().context("Failed to locate the running executable")?;
    let dir = exe
        .parent()
        .context("Executable path has no parent directory")?;
    Ok(dir.join(SETTINGS_FILE_NAME))
}

/// Settings store that owns both the settings and their file.
///
/// # Example
///
/// ```no_run
/// use shroud_ledd::config::SettingsStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let store = SettingsStore::load_or_init(None).await?;
/// let mode = store.clone_settings().await.animation_type;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SettingsStore {
    settings: Arc<RwLock<Settings>>,
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(settings: Settings, path: PathBuf) -> Self {
        Self {
            settings: Arc::new(RwLock::new(settings.clamped())),
            path,
        }
    }

    /// Loads the settings file, creating it with defaults when absent.
    ///
    /// A file that cannot be read or parsed is not fatal: the in-memory
    /// defaults are used and the file is left untouched.
    pub async fn load_or_init(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(p) => p,
            None => default_settings_path()?,
        };

        if !path.exists() {
            info!("No settings at {}, writing defaults", path.display());
            let store = Self::new(Settings::default(), path);
            if let Err(e) = store.save().await {
                warn!("Failed to persist default settings: {e:#}");
            }
            return Ok(store);
        }

        info!("Loading settings from: {}", path.display());
        let settings = match Self::load_settings_from_path(&path) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Using default settings: {e:#}");
                Settings::default()
            }
        };

        Ok(Self::new(settings, path))
    }

    pub async fn clone_settings(&self) -> Settings {
        self.settings.read().await.clone()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the current settings to the store's file.
    pub async fn save(&self) -> Result<()> {
        let settings = self.settings.read().await;
        Self::save_to_path(&settings, &self.path)
    }

    fn save_to_path(settings: &Settings, path: &Path) -> Result<()> {
        let json =
            serde_json::to_string_pretty(settings).context("Failed to serialize settings")?;

        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, json).with_context(|| {
            format!("Failed to write temporary settings to {}", tmp_path.display())
        })?;

        fs::rename(&tmp_path, path)
            .with_context(|| format!("Failed to move settings to {}", path.display()))?;

        info!("Settings saved to: {}", path.display());
        Ok(())
    }

    fn load_settings_from_path(path: &Path) -> Result<Settings> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

        serde_json::from_str(content.trim_start_matches('\u{feff}'))
            .with_context(|| format!("Failed to parse JSON in: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn create_temp_settings(content: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();
        temp_file.flush().unwrap();
        temp_file
    }

    #[test]
    fn settings_load_valid_json() {
        let json = r#"{
            "R": 0, "G": 128, "B": 255,
            "AnimationType": 5,
            "TemperatureUpperLimit": 90,
            "TemperatureLowerLimit": 40,
            "OverwriteSecurityChecks": true
        }"#;
        let temp_file = create_temp_settings(json);

        let store = tokio_test::block_on(SettingsStore::load_or_init(Some(
            temp_file.path().to_path_buf(),
        )))
        .unwrap();
        let settings = tokio_test::block_on(store.clone_settings());

        assert_eq!(settings.color(), Rgb::new(0, 128, 255));
        assert_eq!(settings.animation_type, AnimationMode::TemperatureBased);
        assert_eq!(settings.temperature_limits(), (40, 90));
        assert!(settings.overwrite_security_checks);
    }

    #[test]
    fn settings_accept_mode_name_and_bom() {
        let json = "\u{feff}{\"R\":1,\"G\":2,\"B\":3,\"AnimationType\":\"DoubleFlashing\"}";
        let temp_file = create_temp_settings(json);

        let settings = SettingsStore::load_settings_from_path(temp_file.path()).unwrap();
        assert_eq!(settings.animation_type, AnimationMode::DoubleFlashing);
        assert_eq!(settings.temperature_limits(), (45, 85));
    }

    #[tokio::test]
    async fn malformed_file_falls_back_to_defaults() {
        let temp_file = create_temp_settings("{ not json");

        let store = SettingsStore::load_or_init(Some(temp_file.path().to_path_buf()))
            .await
            .unwrap();

        assert_eq!(store.clone_settings().await, Settings::default());
        let untouched = fs::read_to_string(temp_file.path()).unwrap();
        assert_eq!(untouched, "{ not json");
    }

    #[tokio::test]
    async fn missing_file_is_created_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(SETTINGS_FILE_NAME);

        let store = SettingsStore::load_or_init(Some(path.clone())).await.unwrap();
        assert_eq!(store.clone_settings().await, Settings::default());

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["R"], 255);
        assert_eq!(written["G"], 0);
        assert_eq!(written["B"], 0);
        assert_eq!(written["AnimationType"], 0);
        assert_eq!(written["TemperatureUpperLimit"], 85);
        assert_eq!(written["TemperatureLowerLimit"], 45);
        assert_eq!(written["OverwriteSecurityChecks"], false);
    }

    #[test]
    fn clamp_negative_lower_limit() {
        let settings = Settings {
            temperature_lower_limit: -5,
            ..Settings::default()
        }
        .clamped();
        assert_eq!(settings.temperature_lower_limit, 0);
    }

    #[test]
    fn clamp_upper_limit_to_hundred() {
        let settings = Settings {
            temperature_upper_limit: 150,
            ..Settings::default()
        }
        .clamped();
        assert_eq!(settings.temperature_upper_limit, 100);
    }

    #[test]
    fn clamp_bumps_upper_above_lower() {
        let settings = Settings {
            temperature_lower_limit: 80,
            temperature_upper_limit: 50,
            ..Settings::default()
        }
        .clamped();
        assert_eq!(settings.temperature_limits(), (80, 81));

        let equal = Settings {
            temperature_lower_limit: 60,
            temperature_upper_limit: 60,
            ..Settings::default()
        }
        .clamped();
        assert_eq!(equal.temperature_limits(), (60, 61));
    }

    #[tokio::test]
    async fn store_clamps_before_saving() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(SETTINGS_FILE_NAME);
        let store = SettingsStore::new(
            Settings {
                temperature_lower_limit: -10,
                temperature_upper_limit: 200,
                ..Settings::default()
            },
            path.clone(),
        );

        store.save().await.unwrap();

        let reloaded = SettingsStore::load_settings_from_path(&path).unwrap();
        assert_eq!(reloaded.temperature_limits(), (0, 100));
        assert_eq!(store.path(), path.as_path());
    }
}
