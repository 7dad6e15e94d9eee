//! TOML-based recent-handles repository.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use livefeed_core::error::{LiveFeedError, Result};
use livefeed_core::recent::{RecentHandles, RecentHandlesRepository};
use tokio::task;

use crate::storage::AtomicTomlFile;

/// Stores the recent-handles list in `recent_handles.toml`.
///
/// File access runs on the blocking pool.
pub struct TomlRecentHandlesRepository {
    file: Arc<AtomicTomlFile<RecentHandles>>,
    limit: usize,
}

impl TomlRecentHandlesRepository {
    pub fn new(path: PathBuf, limit: usize) -> Self {
        Self {
            file: Arc::new(AtomicTomlFile::new(path)),
            limit,
        }
    }

    async fn update<F>(&self, f: F) -> Result<RecentHandles>
    where
        F: FnOnce(&mut RecentHandles) + Send + 'static,
    {
        let file = Arc::clone(&self.file);
        task::spawn_blocking(move || file.update(RecentHandles::default(), f))
            .await
            .map_err(|e| LiveFeedError::io(format!("Failed to spawn blocking task: {}", e)))?
            .map_err(LiveFeedError::from)
    }
}

#[async_trait]
impl RecentHandlesRepository for TomlRecentHandlesRepository {
    async fn load(&self) -> Result<RecentHandles> {
        let file = Arc::clone(&self.file);
        let loaded = task::spawn_blocking(move || file.load())
            .await
            .map_err(|e| LiveFeedError::io(format!("Failed to spawn blocking task: {}", e)))??;
        Ok(loaded.unwrap_or_default())
    }

    async fn remember(&self, handle: &str) -> Result<RecentHandles> {
        let handle = handle.to_string();
        let limit = self.limit;
        self.update(move |recent| recent.remember(&handle, limit)).await
    }

    async fn forget(&self, handle: &str) -> Result<RecentHandles> {
        let handle = handle.to_string();
        self.update(move |recent| {
            recent.forget(&handle);
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_handles_persist_across_instances() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("recent_handles.toml");

        let repository = TomlRecentHandlesRepository::new(path.clone(), 2);
        repository.remember("alice").await.unwrap();
        repository.remember("bob").await.unwrap();
        repository.remember("carol").await.unwrap();
        repository.remember("bob").await.unwrap();

        let reloaded = TomlRecentHandlesRepository::new(path, 2);
        let recent = reloaded.load().await.unwrap();
        assert_eq!(recent.handles, vec!["carol", "bob"]);
    }

    #[tokio::test]
    async fn test_forget_removes_handle() {
        let temp_dir = TempDir::new().unwrap();
        let repository =
            TomlRecentHandlesRepository::new(temp_dir.path().join("recent_handles.toml"), 5);
        repository.remember("alice").await.unwrap();

        let recent = repository.forget("alice").await.unwrap();
        assert!(recent.handles.is_empty());
        assert!(repository.load().await.unwrap().handles.is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let temp_dir = TempDir::new().unwrap();
        let repository =
            TomlRecentHandlesRepository::new(temp_dir.path().join("recent_handles.toml"), 5);
        assert_eq!(repository.load().await.unwrap(), RecentHandles::default());
    }
}
