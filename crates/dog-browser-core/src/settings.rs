// SPDX-License-Identifier: AGPL-3.0
// Dog Browser Core - Settings persistence
//
// Settings are stored in a local JSON file.
// The API base URL can be overridden per run through DOG_BROWSER_API.

use crate::types::{AppError, AppSettings};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Environment variable overriding the configured API base URL
pub const API_OVERRIDE_ENV: &str = "DOG_BROWSER_API";

/// In-memory copy of settings, persisted to disk on changes
pub struct SettingsStore {
    settings: RwLock<AppSettings>,
    file_path: PathBuf,
}

impl SettingsStore {
    /// Create a new settings store in the platform config directory
    pub fn new() -> Result<Self, AppError> {
        let file_path = Self::get_settings_path()?;
        Self::open(file_path)
    }

    /// Load settings from `file_path`, writing defaults if the file is missing
    pub fn open(file_path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let file_path = file_path.into();
        tracing::info!("Settings file path: {:?}", file_path);

        let settings = if file_path.exists() {
            tracing::info!("Loading settings from disk");
            let content = fs::read_to_string(&file_path)
                .map_err(|e| AppError::FileIo(format!("Failed to read settings: {}", e)))?;

            serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse settings, using defaults: {}", e);
                AppSettings::default()
            })
        } else {
            tracing::info!("No settings file found, using defaults");
            AppSettings::default()
        };

        let store = Self {
            settings: RwLock::new(settings),
            file_path,
        };

        if !store.file_path.exists() {
            tracing::info!("Creating initial settings file");
            store.persist()?;
        }

        Ok(store)
    }

    /// Get the path to the settings file
    fn get_settings_path() -> Result<PathBuf, AppError> {
        let config_dir = directories::ProjectDirs::from("dev", "dogbrowser", "dog-browser")
            .ok_or_else(|| AppError::FileIo("Could not determine config directory".to_string()))?
            .config_dir()
            .to_path_buf();

        Ok(config_dir.join("settings.json"))
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Persist settings to disk
    fn persist(&self) -> Result<(), AppError> {
        let settings = self.get();

        let content = serde_json::to_string_pretty(&settings)
            .map_err(|e| AppError::Serialization(format!("Failed to serialize settings: {}", e)))?;

        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| AppError::FileIo(format!("Failed to create config dir: {}", e)))?;
        }

        fs::write(&self.file_path, content)
            .map_err(|e| AppError::FileIo(format!("Failed to write settings: {}", e)))?;

        Ok(())
    }

    /// Get current settings as stored
    pub fn get(&self) -> AppSettings {
        self.settings
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Current settings with environment overrides applied
    pub fn effective(&self) -> AppSettings {
        apply_env_overrides(self.get(), std::env::var(API_OVERRIDE_ENV).ok())
    }

    /// Update settings and persist to disk
    pub fn update(&self, new_settings: AppSettings) -> Result<(), AppError> {
        if new_settings.image_count == 0 {
            return Err(AppError::InvalidConfig(
                "imageCount must be at least 1".to_string(),
            ));
        }
        if new_settings.request_timeout_secs == 0 {
            return Err(AppError::InvalidConfig(
                "requestTimeoutSecs must be at least 1".to_string(),
            ));
        }

        tracing::info!("Updating settings, api: {}", new_settings.api_base_url);
        {
            let mut settings = self
                .settings
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            *settings = new_settings;
        }

        let result = self.persist();
        if result.is_ok() {
            tracing::info!("Settings persisted successfully");
        } else {
            tracing::error!("Failed to persist settings: {:?}", result);
        }
        result
    }
}

fn apply_env_overrides(mut settings: AppSettings, api_override: Option<String>) -> AppSettings {
    if let Some(api) = api_override.filter(|a| !a.trim().is_empty()) {
        tracing::info!("Using API base URL from {}: {}", API_OVERRIDE_ENV, api);
        settings.api_base_url = api;
    }
    settings
}
