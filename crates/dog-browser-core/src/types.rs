// SPDX-License-Identifier: AGPL-3.0
// Dog Browser Core - Type definitions

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Public dog image API used when nothing else is configured
pub const DEFAULT_API_BASE_URL: &str = "https://dog.ceo/api";

/// Largest number of images the API hands out per request
pub const MAX_IMAGE_COUNT: u32 = 50;

/// A dog picture, optionally tagged with its breed.
///
/// The image URL is the natural key: two dogs with the same image are the
/// same dog as far as favorites and list diffing are concerned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Dog {
    pub breed: Option<String>,
    pub image: String,
    pub favorite: bool,
}

impl Dog {
    pub fn new(breed: Option<String>, image: impl Into<String>) -> Self {
        Self {
            breed,
            image: image.into(),
            favorite: false,
        }
    }

    /// Copy of this dog with the favorite flag replaced
    pub fn with_favorite(mut self, favorite: bool) -> Self {
        self.favorite = favorite;
        self
    }

    pub fn to_json(&self) -> Result<String, AppError> {
        serde_json::to_string(self)
            .map_err(|e| AppError::Serialization(format!("Failed to serialize dog: {}", e)))
    }

    pub fn from_json(json: &str) -> Result<Self, AppError> {
        serde_json::from_str(json)
            .map_err(|e| AppError::Serialization(format!("Failed to parse dog: {}", e)))
    }
}

/// Application settings (frontend-agnostic)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    /// Base URL of the dog image API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Images requested per browse (capped at 50 by the API)
    #[serde(default = "default_image_count")]
    pub image_count: u32,
    /// Keep successful responses in the local cache
    #[serde(default = "default_cache_enabled")]
    pub cache_enabled: bool,
    /// Byte budget of the response cache
    #[serde(default = "default_cache_max_bytes")]
    pub cache_max_bytes: u64,
    /// Cached responses older than this are refetched
    #[serde(default = "default_cache_max_age_secs")]
    pub cache_max_age_secs: u64,
    /// Cache location; the platform cache directory when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
    /// Per-request timeout
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_image_count() -> u32 {
    MAX_IMAGE_COUNT
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_max_bytes() -> u64 {
    100 * 1024 * 1024 // 100 MiB
}

fn default_cache_max_age_secs() -> u64 {
    24 * 60 * 60
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            image_count: default_image_count(),
            cache_enabled: default_cache_enabled(),
            cache_max_bytes: default_cache_max_bytes(),
            cache_max_age_secs: default_cache_max_age_secs(),
            cache_dir: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Error types for the application
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("{context}: {status}{}", .detail.as_deref().map(|d| format!(" ({})", d)).unwrap_or_default())]
    Http {
        context: &'static str,
        status: u16,
        detail: Option<String>,
    },

    #[error("status is not success: {0}")]
    ApiStatus(String),

    #[error("File I/O error: {0}")]
    FileIo(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::FileIo(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Network(format!("Request timed out: {}", err))
        } else if err.is_connect() {
            AppError::Network(format!("Cannot connect: {}", err))
        } else {
            AppError::Network(format!("Request failed: {}", err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hound() -> Dog {
        Dog::new(Some("hound-afghan".to_string()), "https://images.dog.ceo/a.jpg")
    }

    #[test]
    fn test_dog_json_round_trip() {
        let dog = hound().with_favorite(true);
        let json = dog.to_json().unwrap();
        assert_eq!(
            json,
            r#"{"breed":"hound-afghan","image":"https://images.dog.ceo/a.jpg","favorite":true}"#
        );
        assert_eq!(Dog::from_json(&json).unwrap(), dog);
    }

    #[test]
    fn test_dog_without_breed() {
        let dog = Dog::from_json(r#"{"breed":null,"image":"x.jpg","favorite":false}"#).unwrap();
        assert_eq!(dog, Dog::new(None, "x.jpg"));

        let dog = Dog::from_json(r#"{"image":"x.jpg","favorite":false}"#).unwrap();
        assert_eq!(dog.breed, None);
    }

    #[test]
    fn test_dog_decoding_is_strict() {
        assert!(Dog::from_json(r#"{"breed":"a","favorite":false}"#).is_err());
        assert!(Dog::from_json(r#"{"breed":"a","image":"x.jpg"}"#).is_err());
        assert!(matches!(
            Dog::from_json(r#"{"image":"x.jpg","favorite":true,"size":3}"#),
            Err(AppError::Serialization(_))
        ));
    }

    #[test]
    fn test_default_settings() {
        let settings = AppSettings::default();
        assert_eq!(settings.api_base_url, "https://dog.ceo/api");
        assert_eq!(settings.image_count, 50);
        assert!(settings.cache_enabled);
        assert_eq!(settings.cache_max_bytes, 100 * 1024 * 1024);
    }

    #[test]
    fn test_partial_settings_take_defaults() {
        let settings: AppSettings = serde_json::from_str(r#"{"imageCount":12}"#).unwrap();
        assert_eq!(settings.image_count, 12);
        assert_eq!(settings.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(settings.request_timeout_secs, 30);
        assert_eq!(settings.cache_dir, None);

        let settings: AppSettings = serde_json::from_str(r#"{"cacheDir":"/tmp/dogs"}"#).unwrap();
        assert_eq!(settings.cache_dir, Some(PathBuf::from("/tmp/dogs")));
    }

    #[test]
    fn test_error_messages() {
        let err = AppError::Http {
            context: "Failed to fetch images",
            status: 404,
            detail: None,
        };
        assert_eq!(err.to_string(), "Failed to fetch images: 404");

        let err = AppError::Http {
            context: "Failed to fetch images",
            status: 404,
            detail: Some("Breed not found".to_string()),
        };
        assert_eq!(err.to_string(), "Failed to fetch images: 404 (Breed not found)");

        assert_eq!(
            AppError::ApiStatus("fail".to_string()).to_string(),
            "status is not success: fail"
        );
    }
}
