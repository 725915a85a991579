// SPDX-License-Identifier: AGPL-3.0
// Dog Browser Core - Browse and favorites presenters
//
// Frontend-agnostic state for the browse and favorites screens.
// Frontends feed events in and render whatever state comes out.

use crate::dogs::Dogs;
use crate::favorites::Favorites;
use crate::types::{AppError, Dog};
use futures::Stream;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// User actions on the browse screen
#[derive(Debug, Clone, PartialEq)]
pub enum BrowseEvent {
    Browse {
        breed: Option<String>,
        count: Option<u32>,
    },
    AddFavorite(Dog),
    RemoveFavorite(Dog),
}

/// What the browse screen shows
#[derive(Debug, Clone, PartialEq)]
pub struct BrowseState {
    pub dogs: Result<Vec<Dog>, String>,
    pub breeds: Result<Vec<String>, String>,
    pub selected_breed: Option<String>,
}

impl Default for BrowseState {
    fn default() -> Self {
        Self {
            dogs: Ok(Vec::new()),
            breeds: Ok(Vec::new()),
            selected_breed: None,
        }
    }
}

impl BrowseState {
    /// Notifications for every failed part of the state
    pub fn notices(&self) -> Vec<Notice> {
        let mut notices = Vec::new();
        if let Err(message) = &self.dogs {
            notices.push(Notice::DogsFailed(message.clone()));
        }
        if let Err(message) = &self.breeds {
            notices.push(Notice::BreedsFailed(message.clone()));
        }
        notices
    }
}

/// Transient failure message for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    DogsFailed(String),
    BreedsFailed(String),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::DogsFailed(message) => write!(f, "Failed to load dogs: {}", message),
            Notice::BreedsFailed(message) => write!(f, "Failed to load breeds: {}", message),
        }
    }
}

/// Presenter for the browse screen
pub struct BrowseDogs {
    dogs: Arc<Dogs>,
    favorites: Arc<Favorites>,
    state: BrowseState,
}

impl BrowseDogs {
    pub fn new(dogs: Arc<Dogs>, favorites: Arc<Favorites>) -> Self {
        Self {
            dogs,
            favorites,
            state: BrowseState::default(),
        }
    }

    pub fn state(&self) -> &BrowseState {
        &self.state
    }

    /// Fetch the breed list into the state
    pub async fn load_breeds(&mut self) -> &BrowseState {
        self.state.breeds = self.dogs.breeds().await.map_err(|e| {
            tracing::warn!("Loading breeds failed: {}", e);
            e.to_string()
        });
        &self.state
    }

    /// Select `breed` as filter, or clear the filter if it is already selected.
    ///
    /// Returns the new selection.
    pub fn toggle_breed(&mut self, breed: &str) -> Option<&str> {
        if self.state.selected_breed.as_deref() == Some(breed) {
            self.state.selected_breed = None;
        } else {
            self.state.selected_breed = Some(breed.to_string());
        }
        self.state.selected_breed.as_deref()
    }

    /// Apply an event.
    ///
    /// Browse failures land in the state; favorite failures are returned.
    pub async fn handle(&mut self, event: BrowseEvent) -> Result<&BrowseState, AppError> {
        match event {
            BrowseEvent::Browse { breed, count } => {
                self.state.dogs = self
                    .browse(breed.as_deref(), count)
                    .await
                    .map_err(|e| {
                        tracing::warn!("Browsing failed: {}", e);
                        e.to_string()
                    });
            }
            BrowseEvent::AddFavorite(dog) => {
                self.favorites.add(&dog).await?;
                self.mark_favorite(&dog.image, true);
            }
            BrowseEvent::RemoveFavorite(dog) => {
                self.favorites.remove(&dog).await?;
                self.mark_favorite(&dog.image, false);
            }
        }
        Ok(&self.state)
    }

    async fn browse(&self, breed: Option<&str>, count: Option<u32>) -> Result<Vec<Dog>, AppError> {
        let images = self.dogs.images(breed, count).await?;
        let favorite_images: HashSet<String> = self
            .favorites
            .list()?
            .into_iter()
            .map(|dog| dog.image)
            .collect();

        let mut seen = HashSet::new();
        Ok(images
            .into_iter()
            .filter(|image| seen.insert(image.clone()))
            .map(|image| {
                let favorite = favorite_images.contains(&image);
                Dog::new(breed.map(str::to_string), image).with_favorite(favorite)
            })
            .collect())
    }

    fn mark_favorite(&mut self, image: &str, favorite: bool) {
        if let Ok(dogs) = &mut self.state.dogs {
            for dog in dogs.iter_mut().filter(|dog| dog.image == image) {
                dog.favorite = favorite;
            }
        }
    }
}

/// Presenter for the favorites screen
pub struct FavoriteDogs {
    favorites: Arc<Favorites>,
}

impl FavoriteDogs {
    pub fn new(favorites: Arc<Favorites>) -> Self {
        Self { favorites }
    }

    /// Favorite list, re-emitted on every change
    pub fn dogs(&self) -> impl Stream<Item = Vec<Dog>> + Send + 'static {
        self.favorites.observe()
    }

    pub async fn remove(&self, dog: &Dog) -> Result<(), AppError> {
        self.favorites.remove(dog).await
    }
}
