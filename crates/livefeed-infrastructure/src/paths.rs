//! Path management for LiveFeed configuration and data files.
//!
//! Paths resolve through the `dirs` crate so they follow platform conventions
//! (XDG on Linux, `Library/Application Support` on macOS, `AppData` on Windows).

use std::path::PathBuf;

use livefeed_core::error::LiveFeedError;
use thiserror::Error;

/// Errors that can occur during path resolution.
#[derive(Debug, Error)]
pub enum PathError {
    /// The platform has no config directory (no home directory).
    #[error("Cannot find config directory")]
    ConfigDirNotFound,
    #[error("Cannot find data directory")]
    DataDirNotFound,
}

impl From<PathError> for LiveFeedError {
    fn from(err: PathError) -> Self {
        LiveFeedError::config(err.to_string())
    }
}

const APP_DIR: &str = "livefeed";

/// Resolves every file location used by LiveFeed.
///
/// # Directory Structure
///
/// ```text
/// ~/.config/livefeed/            # Config directory
/// ├── config.toml                # Pipeline configuration
/// ├── recent_handles.toml        # Recently started handles
/// └── logs/                      # REPL logs
///     └── livefeed.log.YYYY-MM-DD
///
/// ~/.local/share/livefeed/       # Data directory
/// └── scripts/                   # Scripted source replays (<handle>.jsonl)
/// ```
///
/// With a base override both directories collapse into that base, which
/// keeps tests inside a temporary directory.
#[derive(Debug, Clone, Default)]
pub struct LiveFeedPaths {
    base: Option<PathBuf>,
}

impl LiveFeedPaths {
    pub fn new(base: Option<PathBuf>) -> Self {
        Self { base }
    }

    pub fn config_dir(&self) -> Result<PathBuf, PathError> {
        match &self.base {
            Some(base) => Ok(base.clone()),
            None => dirs::config_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or(PathError::ConfigDirNotFound),
        }
    }

    pub fn data_dir(&self) -> Result<PathBuf, PathError> {
        match &self.base {
            Some(base) => Ok(base.clone()),
            None => dirs::data_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or(PathError::DataDirNotFound),
        }
    }

    pub fn config_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("config.toml"))
    }

    pub fn recent_handles_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("recent_handles.toml"))
    }

    /// Default directory for scripted-source replays.
    pub fn scripts_dir(&self) -> Result<PathBuf, PathError> {
        Ok(self.data_dir()?.join("scripts"))
    }

    pub fn logs_dir(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("logs"))
    }
}
