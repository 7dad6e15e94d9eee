//! Signals pushed from the pipeline to the presentation surface.

use serde::{Deserialize, Serialize};

use crate::event::FeedEvent;
use crate::session::{ModeState, PinnedItem};

/// One message from the pipeline to a subscriber.
///
/// Serialized with a `type` tag so a GUI host can forward it unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedSignal {
    /// A session was (re)started; the surface should clear its view.
    SessionStarted { handle: String, session_id: String },
    SessionStopped { handle: String },
    /// One event entered the delivered feed.
    Event {
        handle: String,
        index: usize,
        event: FeedEvent,
    },
    /// Several events entered the delivered feed at once.
    Batch {
        handle: String,
        first_index: usize,
        events: Vec<FeedEvent>,
    },
    PinnedChanged {
        handle: String,
        pins: Vec<PinnedItem>,
    },
    /// The first item was pinned; the surface should show its pinned view.
    OpenPinnedView { handle: String },
    ModeChanged { handle: String, state: ModeState },
}

impl FeedSignal {
    /// The handle this signal belongs to.
    pub fn handle(&self) -> &str {
        match self {
            FeedSignal::SessionStarted { handle, .. }
            | FeedSignal::SessionStopped { handle }
            | FeedSignal::Event { handle, .. }
            | FeedSignal::Batch { handle, .. }
            | FeedSignal::PinnedChanged { handle, .. }
            | FeedSignal::OpenPinnedView { handle }
            | FeedSignal::ModeChanged { handle, .. } => handle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_is_tagged() {
        let signal = FeedSignal::OpenPinnedView {
            handle: "alice".to_string(),
        };
        let value = serde_json::to_value(&signal).unwrap();
        assert_eq!(value["type"], "open_pinned_view");
        assert_eq!(value["handle"], "alice");
        assert_eq!(signal.handle(), "alice");
    }
}
