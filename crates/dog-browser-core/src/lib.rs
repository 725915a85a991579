// SPDX-License-Identifier: AGPL-3.0
// Dog Browser Core - Shared logic for all frontends
//
// This crate provides:
// - Dog, AppSettings and AppError types
// - Dogs, the client for the dog image API
// - Favorites, the locally persisted favorite set
// - SettingsStore for persistent settings
// - BrowseDogs and FavoriteDogs presenters
//
// Frontend-specific code lives in separate crates.

pub mod cache;
pub mod dogs;
pub mod favorites;
pub mod prefs;
pub mod presenter;
pub mod settings;
pub mod types;

#[cfg(test)]
mod test_support;

// Re-export commonly used items
pub use cache::ResponseCache;
pub use dogs::Dogs;
pub use favorites::Favorites;
pub use prefs::PreferencesFile;
pub use presenter::{BrowseDogs, BrowseEvent, BrowseState, FavoriteDogs, Notice};
pub use settings::SettingsStore;
pub use types::{AppError, AppSettings, Dog, DEFAULT_API_BASE_URL, MAX_IMAGE_COUNT};
