// SPDX-License-Identifier: AGPL-3.0
// Dog Browser Core - HTTP response cache
//
// Successful response bodies are stored one file per URL in the
// platform cache directory. Old entries expire, and the oldest are
// evicted once the directory outgrows its byte budget.

use crate::types::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::sync::Mutex;

const CACHE_DIRECTORY: &str = "responses";

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CacheEntry {
    url: String,
    stored_at: DateTime<Utc>,
    body: String,
}

/// On-disk cache of response bodies keyed by URL
pub struct ResponseCache {
    dir: PathBuf,
    max_bytes: u64,
    max_age: Duration,
    /// Serializes writes and evictions
    write_lock: Mutex<()>,
}

impl ResponseCache {
    /// Create a cache in the platform cache directory
    pub async fn new(max_bytes: u64, max_age: Duration) -> Result<Self, AppError> {
        let dir = Self::get_cache_path()?;
        Self::open(dir, max_bytes, max_age).await
    }

    pub async fn open(
        dir: impl Into<PathBuf>,
        max_bytes: u64,
        max_age: Duration,
    ) -> Result<Self, AppError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| AppError::FileIo(format!("Failed to create cache dir: {}", e)))?;

        tracing::info!("Response cache at {:?} ({} bytes max)", dir, max_bytes);
        Ok(Self {
            dir,
            max_bytes,
            max_age,
            write_lock: Mutex::new(()),
        })
    }

    /// Get the path to the cache directory
    fn get_cache_path() -> Result<PathBuf, AppError> {
        let cache_dir = directories::ProjectDirs::from("dev", "dogbrowser", "dog-browser")
            .ok_or_else(|| AppError::FileIo("Could not determine cache directory".to_string()))?
            .cache_dir()
            .to_path_buf();

        Ok(cache_dir.join(CACHE_DIRECTORY))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Fresh cached body for `url`, if any
    pub async fn get(&self, url: &str) -> Option<String> {
        let path = self.entry_path(url);
        let content = fs::read_to_string(&path).await.ok()?;

        let entry: CacheEntry = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Dropping unreadable cache entry {:?}: {}", path, e);
                self.remove_if_stale(url).await;
                return None;
            }
        };

        // Two URLs can share a file name; the stored URL decides.
        if entry.url != url {
            return None;
        }

        if self.is_expired(&entry) {
            tracing::debug!("Cache entry for {} expired", url);
            self.remove_if_stale(url).await;
            return None;
        }

        Some(entry.body)
    }

    /// Delete the entry file for `url` if it is still unreadable or expired.
    ///
    /// Runs under the write lock and re-reads the file, so an entry a
    /// concurrent `put` just wrote is kept.
    async fn remove_if_stale(&self, url: &str) {
        let _guard = self.write_lock.lock().await;
        let path = self.entry_path(url);

        let stale = match fs::read_to_string(&path).await {
            Ok(content) => match serde_json::from_str::<CacheEntry>(&content) {
                Ok(entry) => entry.url == url && self.is_expired(&entry),
                Err(_) => true,
            },
            Err(_) => return,
        };
        if !stale {
            return;
        }

        match fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to remove cache entry {:?}: {}", path, e),
        }
    }

    /// Store a body for `url`, then evict until the cache fits its budget
    pub async fn put(&self, url: &str, body: &str) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;

        let entry = CacheEntry {
            url: url.to_string(),
            stored_at: Utc::now(),
            body: body.to_string(),
        };
        let content = serde_json::to_string(&entry)
            .map_err(|e| AppError::Serialization(format!("Failed to serialize cache entry: {}", e)))?;

        fs::write(self.entry_path(url), content)
            .await
            .map_err(|e| AppError::FileIo(format!("Failed to write cache entry: {}", e)))?;

        self.evict().await
    }

    /// Remove every cached response
    pub async fn clear(&self) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;

        for (path, _, _) in self.entries().await? {
            fs::remove_file(&path).await?;
        }
        Ok(())
    }

    /// Total bytes currently on disk
    pub async fn size(&self) -> Result<u64, AppError> {
        Ok(self.entries().await?.iter().map(|(_, len, _)| len).sum())
    }

    fn is_expired(&self, entry: &CacheEntry) -> bool {
        let age = Utc::now().signed_duration_since(entry.stored_at);
        match age.to_std() {
            Ok(age) => age >= self.max_age,
            // Stored in the future: clock moved backwards
            Err(_) => false,
        }
    }

    async fn evict(&self) -> Result<(), AppError> {
        let mut entries = self.entries().await?;
        let mut total: u64 = entries.iter().map(|(_, len, _)| len).sum();
        if total <= self.max_bytes {
            return Ok(());
        }

        entries.sort_by_key(|(_, _, stored_at)| *stored_at);
        for (path, len, _) in entries {
            if total <= self.max_bytes {
                break;
            }
            tracing::debug!("Evicting cache entry {:?}", path);
            fs::remove_file(&path).await?;
            total -= len;
        }
        Ok(())
    }

    /// (path, size, stored_at) for every entry file
    async fn entries(&self) -> Result<Vec<(PathBuf, u64, DateTime<Utc>)>, AppError> {
        let mut entries = Vec::new();
        let mut dir = fs::read_dir(&self.dir).await?;

        while let Some(item) = dir.next_entry().await? {
            let path = item.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let len = item.metadata().await?.len();
            // Unreadable entries sort first so they go first.
            let stored_at = fs::read_to_string(&path)
                .await
                .ok()
                .and_then(|c| serde_json::from_str::<CacheEntry>(&c).ok())
                .map(|e| e.stored_at)
                .unwrap_or(DateTime::<Utc>::MIN_UTC);
            entries.push((path, len, stored_at));
        }

        Ok(entries)
    }

    fn entry_path(&self, url: &str) -> PathBuf {
        let key: String = url
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", key))
    }
}
