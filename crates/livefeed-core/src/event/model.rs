//! Feed event types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The kind of a feed event as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Comment,
    Gift,
    Subscription,
    /// Synthetic event emitted when the source could not connect to a handle.
    InvalidUser,
}

impl EventKind {
    /// Short upper-case label used in plain-text renderings.
    pub fn label(&self) -> &'static str {
        match self {
            EventKind::Comment => "COMMENT",
            EventKind::Gift => "GIFT",
            EventKind::Subscription => "SUBSCRIPTION",
            EventKind::InvalidUser => "INVALID_USER",
        }
    }

    /// Parses a user-typed kind name (`comment`, `gifts`, `sub`, ...).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "comment" | "comments" | "chat" => Some(EventKind::Comment),
            "gift" | "gifts" => Some(EventKind::Gift),
            "subscription" | "subscriptions" | "sub" | "subs" | "subscribed" => {
                Some(EventKind::Subscription)
            }
            "invalid_user" => Some(EventKind::InvalidUser),
            _ => None,
        }
    }
}

/// The callback channel a raw event arrived on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceChannel {
    Chat,
    Gift,
    Subscribed,
    /// Any channel name the pipeline does not know about.
    Other(String),
}

impl SourceChannel {
    /// Maps a channel name from the live-connection library.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "chat" | "comment" => SourceChannel::Chat,
            "gift" => SourceChannel::Gift,
            "subscribed" | "subscribe" | "subscription" => SourceChannel::Subscribed,
            other => SourceChannel::Other(other.to_string()),
        }
    }
}

/// An event exactly as the external source handed it over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    pub channel: SourceChannel,
    #[serde(default)]
    pub payload: Value,
}

impl RawEvent {
    pub fn new(channel: SourceChannel, payload: Value) -> Self {
        Self { channel, payload }
    }

    pub fn chat(payload: Value) -> Self {
        Self::new(SourceChannel::Chat, payload)
    }

    pub fn gift(payload: Value) -> Self {
        Self::new(SourceChannel::Gift, payload)
    }

    pub fn subscribed(payload: Value) -> Self {
        Self::new(SourceChannel::Subscribed, payload)
    }
}

/// A classified, timestamped event.
///
/// Immutable once created. `sequence` is assigned when the event is
/// submitted to its session and reflects source-emission order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedEvent {
    pub sequence: u64,
    pub kind: EventKind,
    pub timestamp: DateTime<Utc>,
    /// Identity of the sender (`uniqueId`), when the payload carries one.
    pub unique_id: Option<String>,
    /// Display name of the sender.
    pub nickname: Option<String>,
    /// Human-readable message text for this event.
    pub text: String,
    pub payload: Value,
}

impl FeedEvent {
    /// Identity shown in the feed, falling back to `unknown`.
    pub fn identity(&self) -> &str {
        self.unique_id.as_deref().unwrap_or("unknown")
    }

    /// Display name shown in the feed, falling back to `Unknown`.
    pub fn display_name(&self) -> &str {
        self.nickname.as_deref().unwrap_or("Unknown")
    }

    /// One-line rendering: `id | name | message`.
    pub fn summary(&self) -> String {
        format!("{} | {} | {}", self.identity(), self.display_name(), self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_channel_from_name() {
        assert_eq!(SourceChannel::from_name("chat"), SourceChannel::Chat);
        assert_eq!(SourceChannel::from_name(" Gift "), SourceChannel::Gift);
        assert_eq!(
            SourceChannel::from_name("subscribed"),
            SourceChannel::Subscribed
        );
        assert_eq!(
            SourceChannel::from_name("like"),
            SourceChannel::Other("like".to_string())
        );
    }

    #[test]
    fn test_kind_parse_accepts_plurals() {
        assert_eq!(EventKind::parse("gifts"), Some(EventKind::Gift));
        assert_eq!(EventKind::parse("SUB"), Some(EventKind::Subscription));
        assert_eq!(EventKind::parse("comment"), Some(EventKind::Comment));
        assert_eq!(EventKind::parse("likes"), None);
    }

    #[test]
    fn test_summary_uses_fallbacks() {
        let event = FeedEvent {
            sequence: 0,
            kind: EventKind::Comment,
            timestamp: Utc::now(),
            unique_id: None,
            nickname: None,
            text: "hi".to_string(),
            payload: json!({}),
        };
        assert_eq!(event.summary(), "unknown | Unknown | hi");
    }
}
