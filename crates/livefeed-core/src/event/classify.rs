//! Classification and field extraction for raw source events.
//!
//! Payload shapes follow the live-connection library: the sender lives either
//! at the top level (`uniqueId`, `nickname`) or under `user`, gift names can
//! sit in several places, and some events only carry a `common.describe`
//! sentence. Extraction is best-effort; nothing here fails.

use chrono::Utc;
use serde_json::{Value, json};

use super::model::{EventKind, FeedEvent, RawEvent, SourceChannel};

/// Phrases that mark an otherwise unknown event as a subscription.
const SUBSCRIPTION_MARKERS: [&str; 4] = [
    "subscribed",
    "became a member",
    "joined",
    "is now a subscriber",
];

/// Result of classifying a raw event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub kind: EventKind,
    /// `true` when the channel was unknown and the kind had to be guessed
    /// from the payload.
    pub fallback: bool,
}

/// Decides the kind of a raw event.
///
/// Known channels map directly. For anything else the payload text is
/// inspected; if that does not settle it the event is treated as a comment.
pub fn classify(raw: &RawEvent) -> Classification {
    let kind = match &raw.channel {
        SourceChannel::Chat => EventKind::Comment,
        SourceChannel::Gift => EventKind::Gift,
        SourceChannel::Subscribed => EventKind::Subscription,
        SourceChannel::Other(_) => {
            return Classification {
                kind: guess_kind(&raw.payload),
                fallback: true,
            };
        }
    };
    Classification {
        kind,
        fallback: false,
    }
}

fn guess_kind(payload: &Value) -> EventKind {
    let comment = lookup_str(payload, &[&["comment"], &["data", "comment"]]).unwrap_or_default();
    let describe = lookup_str(
        payload,
        &[&["common", "describe"], &["data", "common", "describe"]],
    )
    .unwrap_or_default();

    let haystack = format!("{comment} {describe}").to_lowercase();
    if SUBSCRIPTION_MARKERS
        .iter()
        .any(|marker| haystack.contains(marker))
    {
        return EventKind::Subscription;
    }
    if !describe.is_empty() {
        return EventKind::Gift;
    }
    EventKind::Comment
}

/// Builds a feed event from a raw event, classifying it and extracting the
/// sender and message text.
pub fn build_event(sequence: u64, raw: RawEvent) -> (FeedEvent, Classification) {
    let classification = classify(&raw);
    let payload = raw.payload;

    let unique_id = lookup_str(&payload, &[&["uniqueId"], &["user", "uniqueId"]]);
    let nickname = lookup_str(&payload, &[&["nickname"], &["user", "nickname"]]);
    let text = match classification.kind {
        EventKind::Gift => gift_text(&payload),
        EventKind::Subscription => "Subscribed!".to_string(),
        EventKind::Comment | EventKind::InvalidUser => comment_text(&payload),
    };

    let event = FeedEvent {
        sequence,
        kind: classification.kind,
        timestamp: Utc::now(),
        unique_id,
        nickname,
        text,
        payload,
    };
    (event, classification)
}

/// Builds the synthetic event reported when a handle cannot be monitored.
pub fn invalid_user_event(sequence: u64, handle: &str, reason: &str) -> FeedEvent {
    FeedEvent {
        sequence,
        kind: EventKind::InvalidUser,
        timestamp: Utc::now(),
        unique_id: Some(handle.to_string()),
        nickname: None,
        text: format!("Could not connect to @{handle}: {reason}"),
        payload: json!({ "type": "invalid_user", "handle": handle, "reason": reason }),
    }
}

fn comment_text(payload: &Value) -> String {
    if let Value::String(text) = payload {
        return text.clone();
    }
    lookup_str(
        payload,
        &[
            &["comment"],
            &["rawComment"],
            &["message"],
            &["common", "describe"],
            &["label"],
            &["description"],
        ],
    )
    .unwrap_or_default()
}

fn gift_text(payload: &Value) -> String {
    let name = lookup_str(
        payload,
        &[
            &["giftName"],
            &["gift", "giftName"],
            &["gift", "name"],
            &["common", "giftName"],
            &["common", "describe"],
            &["label"],
            &["description"],
        ],
    )
    .unwrap_or_else(|| "Unknown Gift".to_string());
    let quantity = lookup_u64(payload, &[&["gift", "repeatCount"], &["repeatCount"]]).unwrap_or(1);
    format!("sent \"{name}\" x{quantity}")
}

/// Returns the first non-empty string found at any of the given paths.
fn lookup_str(payload: &Value, paths: &[&[&str]]) -> Option<String> {
    paths.iter().find_map(|path| {
        walk(payload, path)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    })
}

fn lookup_u64(payload: &Value, paths: &[&[&str]]) -> Option<u64> {
    paths
        .iter()
        .find_map(|path| walk(payload, path).and_then(Value::as_u64))
        .filter(|value| *value > 0)
}

fn walk<'a>(payload: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter()
        .try_fold(payload, |current, key| current.get(*key))
}
