//! Session domain module.
//!
//! A session is one monitored handle together with its delivered feed,
//! buffers and pinned set.
//!
//! # Module Structure
//!
//! - `mode`: Delivery mode types (`DeliveryMode`, `ModeState`)
//! - `state`: The per-session buffering state machine (`SessionState`)

mod mode;
mod state;

pub use mode::{DeliveryMode, ModeState};
pub use state::{Delivery, ModeTransition, PinToggle, PinnedItem, SessionSnapshot, SessionState};

use crate::error::{LiveFeedError, Result};

/// Normalizes a user-typed handle: trims whitespace and strips one leading `@`.
///
/// # Errors
///
/// Returns `InvalidHandle` if nothing is left, or if the handle could escape
/// a directory when used as a file name (path separators, `.` or `..`).
pub fn normalize_handle(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    let handle = trimmed.strip_prefix('@').unwrap_or(trimmed).trim();
    let escapes = handle.contains(['/', '\\']) || handle == "." || handle == "..";
    if handle.is_empty() || escapes {
        return Err(LiveFeedError::InvalidHandle(raw.to_string()));
    }
    Ok(handle.to_string())
}
