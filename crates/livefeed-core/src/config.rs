use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Lower bound for the slow-drip period.
pub const MIN_SLOW_DRIP_INTERVAL_MS: u64 = 50;

fn default_slow_drip_interval_ms() -> u64 {
    4000
}

fn default_recent_handles_limit() -> usize {
    20
}

/// Pipeline settings, stored as `config.toml`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    #[serde(default = "default_slow_drip_interval_ms")]
    pub slow_drip_interval_ms: u64,
    /// Keep several sessions running at once. When off, starting a handle
    /// stops every other session.
    #[serde(default)]
    pub allow_multiple_sessions: bool,
    #[serde(default = "default_recent_handles_limit")]
    pub recent_handles_limit: usize,
    /// Directory the scripted source reads `<handle>.jsonl` files from.
    /// Resolved against the data directory when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_dir: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            slow_drip_interval_ms: default_slow_drip_interval_ms(),
            allow_multiple_sessions: false,
            recent_handles_limit: default_recent_handles_limit(),
            script_dir: None,
        }
    }
}

impl PipelineConfig {
    /// The slow-drip period, clamped to [`MIN_SLOW_DRIP_INTERVAL_MS`].
    pub fn slow_drip_interval(&self) -> Duration {
        Duration::from_millis(self.slow_drip_interval_ms.max(MIN_SLOW_DRIP_INTERVAL_MS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_keys_use_defaults() {
        let config: PipelineConfig = toml::from_str("allow_multiple_sessions = true").unwrap();
        assert!(config.allow_multiple_sessions);
        assert_eq!(config.slow_drip_interval_ms, 4000);
        assert_eq!(config.recent_handles_limit, 20);
        assert!(config.script_dir.is_none());
    }

    #[test]
    fn test_interval_is_clamped() {
        let config = PipelineConfig {
            slow_drip_interval_ms: 1,
            ..Default::default()
        };
        assert_eq!(config.slow_drip_interval(), Duration::from_millis(50));
    }
}
