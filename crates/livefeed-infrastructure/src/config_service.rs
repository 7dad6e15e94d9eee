//! Configuration service.
//!
//! Loads `PipelineConfig` from `config.toml`, writing the defaults on first
//! run, and caches it.

use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use livefeed_core::config::PipelineConfig;
use livefeed_core::error::Result;

use crate::paths::LiveFeedPaths;
use crate::storage::AtomicTomlFile;

/// Loads and caches the pipeline configuration.
#[derive(Clone)]
pub struct ConfigService {
    file: Arc<AtomicTomlFile<PipelineConfig>>,
    paths: LiveFeedPaths,
    config: Arc<RwLock<Option<PipelineConfig>>>,
}

impl ConfigService {
    /// Uses `config.toml` under the config directory of `paths`.
    pub fn new(paths: LiveFeedPaths) -> Result<Self> {
        let path = paths.config_file()?;
        Ok(Self::with_path(path, paths))
    }

    /// Uses an explicit config file (the `--config` flag).
    pub fn with_path(path: PathBuf, paths: LiveFeedPaths) -> Self {
        Self {
            file: Arc::new(AtomicTomlFile::new(path)),
            paths,
            config: Arc::new(RwLock::new(None)),
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.file.path().to_path_buf()
    }

    /// Returns the configuration, loading it on first access.
    ///
    /// A missing file is created with defaults. `script_dir` is filled in from
    /// the data directory when the file leaves it unset.
    pub fn get_config(&self) -> Result<PipelineConfig> {
        if let Some(cached) = self
            .config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return Ok(cached.clone());
        }

        let mut config = match self.file.load()? {
            Some(config) => config,
            None => {
                let defaults = PipelineConfig::default();
                self.file.save(&defaults)?;
                tracing::info!(
                    "[Config] Wrote default configuration to {}",
                    self.file.path().display()
                );
                defaults
            }
        };
        if config.script_dir.is_none() {
            config.script_dir = Some(self.paths.scripts_dir()?);
        }

        *self.config.write().unwrap_or_else(PoisonError::into_inner) = Some(config.clone());
        Ok(config)
    }

    /// Forces a reload on next access.
    pub fn invalidate_cache(&self) {
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_config_is_created_with_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let service = ConfigService::new(LiveFeedPaths::new(Some(temp_dir.path().to_path_buf())))
            .unwrap();

        let config = service.get_config().unwrap();
        assert_eq!(config.slow_drip_interval_ms, 4000);
        assert!(!config.allow_multiple_sessions);
        assert_eq!(config.script_dir, Some(temp_dir.path().join("scripts")));
        assert!(temp_dir.path().join("config.toml").exists());
    }

    #[test]
    fn test_existing_config_is_read_and_cached() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "slow_drip_interval_ms = 1000\nscript_dir = \"/srv/scripts\"\n",
        )
        .unwrap();
        let service = ConfigService::with_path(path.clone(), LiveFeedPaths::new(Some(temp_dir.path().to_path_buf())));

        let config = service.get_config().unwrap();
        assert_eq!(config.slow_drip_interval_ms, 1000);
        assert_eq!(config.script_dir, Some(PathBuf::from("/srv/scripts")));

        std::fs::write(&path, "slow_drip_interval_ms = 2000\n").unwrap();
        assert_eq!(service.get_config().unwrap().slow_drip_interval_ms, 1000);
        service.invalidate_cache();
        assert_eq!(service.get_config().unwrap().slow_drip_interval_ms, 2000);
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "slow_drip_interval_ms = \"fast\"\n").unwrap();
        let service = ConfigService::with_path(path, LiveFeedPaths::default());
        assert!(service.get_config().unwrap_err().is_serialization());
    }
}
