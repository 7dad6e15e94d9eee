//! Delivery mode types for session state management.

use serde::{Deserialize, Serialize};

/// Governs whether and when an incoming event reaches the delivered feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    /// Events are delivered as soon as they arrive.
    Live,
    /// Events are held in the pause buffer until resume.
    Paused,
    /// Events are released one per timer tick.
    SlowDrip,
}

impl DeliveryMode {
    /// Derives the effective mode from the two user toggles.
    ///
    /// Pause takes precedence: with both toggles on, new events go to the
    /// pause buffer.
    pub fn from_flags(paused: bool, slow_mode: bool) -> Self {
        match (paused, slow_mode) {
            (true, _) => DeliveryMode::Paused,
            (false, true) => DeliveryMode::SlowDrip,
            (false, false) => DeliveryMode::Live,
        }
    }
}

/// The full pair of toggles plus the mode derived from them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeState {
    pub mode: DeliveryMode,
    pub paused: bool,
    pub slow_mode: bool,
}

impl ModeState {
    pub fn new(paused: bool, slow_mode: bool) -> Self {
        Self {
            mode: DeliveryMode::from_flags(paused, slow_mode),
            paused,
            slow_mode,
        }
    }
}

impl Default for ModeState {
    fn default() -> Self {
        Self::new(false, false)
    }
}
