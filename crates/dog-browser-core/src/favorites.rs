// SPDX-License-Identifier: AGPL-3.0
// Dog Browser Core - Local favorites storage
//
// Favorites are kept as a set of serialized dogs under a single key
// of a local preferences file. Dogs are identified by their image URL.

use crate::prefs::{Preferences, PreferencesFile};
use crate::types::{AppError, Dog};
use futures::Stream;
use std::path::PathBuf;
use tokio_stream::wrappers::WatchStream;
use tokio_stream::StreamExt;

/// Preference key holding the favorite set
pub const KEY_FAVORITES: &str = "favorites";

const DATA_DESTINATION: &str = "dog-favorites";

/// Favorited dogs persisted in a preferences file
pub struct Favorites {
    prefs: PreferencesFile,
}

impl Favorites {
    /// Open the favorites in the platform data directory
    pub async fn new() -> Result<Self, AppError> {
        let file_path = Self::get_favorites_path()?;
        Self::open(file_path).await
    }

    /// Open favorites backed by the given preferences file
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let prefs = PreferencesFile::open(path).await?;
        Ok(Self { prefs })
    }

    /// Get the path to the favorites file
    fn get_favorites_path() -> Result<PathBuf, AppError> {
        let data_dir = directories::ProjectDirs::from("dev", "dogbrowser", "dog-browser")
            .ok_or_else(|| AppError::FileIo("Could not determine data directory".to_string()))?
            .data_dir()
            .to_path_buf();

        Ok(data_dir.join(format!("{}{}", DATA_DESTINATION, crate::prefs::FILE_EXTENSION)))
    }

    /// Mark a dog as favorite, replacing an entry with the same image
    pub async fn add(&self, dog: &Dog) -> Result<(), AppError> {
        let json = dog.clone().with_favorite(true).to_json()?;
        let image = dog.image.clone();

        self.prefs
            .edit(move |prefs| {
                let favorites = prefs.entry(KEY_FAVORITES.to_string()).or_default();
                match favorites.iter().position(|entry| is_same_image(entry, &image)) {
                    Some(index) => favorites[index] = json,
                    None => favorites.push(json),
                }
            })
            .await?;

        tracing::debug!("Added favorite {}", dog.image);
        Ok(())
    }

    /// Drop a dog from the favorites
    pub async fn remove(&self, dog: &Dog) -> Result<(), AppError> {
        let image = dog.image.clone();

        self.prefs
            .edit(move |prefs| {
                prefs
                    .entry(KEY_FAVORITES.to_string())
                    .or_default()
                    .retain(|entry| !is_same_image(entry, &image));
            })
            .await?;

        tracing::debug!("Removed favorite {}", dog.image);
        Ok(())
    }

    pub fn contains(&self, dog: &Dog) -> bool {
        self.prefs
            .get(KEY_FAVORITES)
            .unwrap_or_default()
            .iter()
            .any(|entry| is_same_image(entry, &dog.image))
    }

    /// All favorites, oldest first
    pub fn list(&self) -> Result<Vec<Dog>, AppError> {
        self.prefs
            .get(KEY_FAVORITES)
            .unwrap_or_default()
            .iter()
            .map(|json| Dog::from_json(json).map(|dog| dog.with_favorite(true)))
            .collect()
    }

    /// Stream of the favorite list, starting with the current one.
    ///
    /// Nothing is emitted until favorites have been written at least once.
    /// Observers see the latest list: changes made between two polls are
    /// folded into a single item.
    pub fn observe(&self) -> impl Stream<Item = Vec<Dog>> + Send + 'static {
        WatchStream::new(self.prefs.subscribe()).filter_map(|prefs| decode_favorites(&prefs))
    }
}

fn decode_favorites(prefs: &Preferences) -> Option<Vec<Dog>> {
    let entries = prefs.get(KEY_FAVORITES)?;
    let dogs = entries
        .iter()
        .filter_map(|json| match Dog::from_json(json) {
            Ok(dog) => Some(dog.with_favorite(true)),
            Err(e) => {
                tracing::warn!("Skipping unreadable favorite: {}", e);
                None
            }
        })
        .collect();
    Some(dogs)
}

fn is_same_image(entry: &str, image: &str) -> bool {
    match Dog::from_json(entry) {
        Ok(dog) => dog.image == image,
        Err(_) => false,
    }
}
