// SPDX-License-Identifier: AGPL-3.0
// Dog Browser Core - Preferences file
//
// A local JSON file mapping keys to ordered string sets.
// Every committed edit is written to disk and then published to observers.

use crate::types::AppError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::{watch, Mutex};

/// Required suffix of every preferences file name
pub const FILE_EXTENSION: &str = ".preferences.json";

/// Snapshot of all keys and their string sets
pub type Preferences = BTreeMap<String, Vec<String>>;

/// File-backed preferences with change notification
pub struct PreferencesFile {
    path: PathBuf,
    /// Serializes read-modify-write cycles
    write_lock: Mutex<()>,
    snapshot_tx: watch::Sender<Arc<Preferences>>,
}

impl PreferencesFile {
    /// Open a preferences file, loading it from disk if it exists
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if !file_name.ends_with(FILE_EXTENSION) {
            return Err(AppError::InvalidConfig(format!(
                "File extension for file: {} does not match required extension for preferences file: {}",
                file_name, FILE_EXTENSION
            )));
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| AppError::FileIo(format!("Failed to create data dir: {}", e)))?;
            }
        }

        let preferences = Self::load(&path).await?;
        tracing::info!(
            "Opened preferences {:?} ({} keys)",
            path,
            preferences.len()
        );

        let (snapshot_tx, _) = watch::channel(Arc::new(preferences));
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
            snapshot_tx,
        })
    }

    async fn load(path: &Path) -> Result<Preferences, AppError> {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Preferences::new()),
            Err(e) => {
                return Err(AppError::FileIo(format!("Failed to read preferences: {}", e)));
            }
        };

        if content.trim().is_empty() {
            return Ok(Preferences::new());
        }

        serde_json::from_str(&content)
            .map_err(|e| AppError::Serialization(format!("Failed to parse preferences: {}", e)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current value of a key, `None` if it was never written
    pub fn get(&self, key: &str) -> Option<Vec<String>> {
        self.snapshot_tx.borrow().get(key).cloned()
    }

    /// Latest committed snapshot
    pub fn snapshot(&self) -> Arc<Preferences> {
        self.snapshot_tx.borrow().clone()
    }

    /// Receiver that sees every committed snapshot
    pub fn subscribe(&self) -> watch::Receiver<Arc<Preferences>> {
        self.snapshot_tx.subscribe()
    }

    /// Apply `edit` to a copy of the current preferences, persist it and publish it.
    ///
    /// Edits that leave the preferences unchanged are neither written nor published.
    pub async fn edit<F>(&self, edit: F) -> Result<(), AppError>
    where
        F: FnOnce(&mut Preferences),
    {
        let _guard = self.write_lock.lock().await;

        let current = self.snapshot();
        let mut updated = (*current).clone();
        edit(&mut updated);

        if updated == *current {
            return Ok(());
        }

        self.persist(&updated).await?;
        self.snapshot_tx.send_replace(Arc::new(updated));
        Ok(())
    }

    async fn persist(&self, preferences: &Preferences) -> Result<(), AppError> {
        let content = serde_json::to_string_pretty(preferences).map_err(|e| {
            AppError::Serialization(format!("Failed to serialize preferences: {}", e))
        })?;

        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        fs::write(&tmp_path, content)
            .await
            .map_err(|e| AppError::FileIo(format!("Failed to write preferences: {}", e)))?;
        fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| AppError::FileIo(format!("Failed to replace preferences: {}", e)))?;

        tracing::debug!("Persisted preferences to {:?}", self.path);
        Ok(())
    }
}
