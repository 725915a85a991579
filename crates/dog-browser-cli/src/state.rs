// SPDX-License-Identifier: AGPL-3.0
// Dog Browser CLI - Application State

use dog_browser_core::{AppError, BrowseDogs, Dogs, Favorites, SettingsStore};
use std::sync::Arc;

/// Stores and clients shared by every command
pub struct AppState {
    pub settings: SettingsStore,
    pub favorites: Arc<Favorites>,
    pub browse: BrowseDogs,
}

impl AppState {
    /// Create new application state with all stores initialized
    pub async fn new() -> Result<Self, AppError> {
        let settings = SettingsStore::new()?;
        let effective = settings.effective();

        let dogs = Arc::new(Dogs::from_settings(&effective).await?);
        let favorites = Arc::new(Favorites::new().await?);

        tracing::info!("Using dog API at {}", dogs.base_url());

        Ok(Self::with_parts(settings, dogs, favorites))
    }

    /// Assemble state from stores that are already open
    pub fn with_parts(settings: SettingsStore, dogs: Arc<Dogs>, favorites: Arc<Favorites>) -> Self {
        let browse = BrowseDogs::new(dogs, favorites.clone());
        Self {
            settings,
            favorites,
            browse,
        }
    }

    /// Images per browse when the user did not ask for a count
    pub fn default_count(&self) -> u32 {
        self.settings.get().image_count
    }
}
