//! Feed filter and search state.

use serde::{Deserialize, Serialize};

use crate::event::{EventKind, FeedEvent};

/// Which user-facing kinds are shown.
///
/// At least one of the three stays enabled. `InvalidUser` events are always
/// shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindFilter {
    pub comment: bool,
    pub gift: bool,
    pub subscription: bool,
}

impl Default for KindFilter {
    fn default() -> Self {
        Self {
            comment: true,
            gift: true,
            subscription: true,
        }
    }
}

impl KindFilter {
    pub fn includes(&self, kind: EventKind) -> bool {
        match kind {
            EventKind::Comment => self.comment,
            EventKind::Gift => self.gift,
            EventKind::Subscription => self.subscription,
            EventKind::InvalidUser => true,
        }
    }

    fn enabled_count(&self) -> usize {
        [self.comment, self.gift, self.subscription]
            .iter()
            .filter(|enabled| **enabled)
            .count()
    }

    /// Flips one kind. Turning off the last enabled kind is refused.
    ///
    /// Returns `true` if the filter changed.
    pub fn toggle(&mut self, kind: EventKind) -> bool {
        if kind == EventKind::InvalidUser {
            return false;
        }
        if self.includes(kind) && self.enabled_count() == 1 {
            return false;
        }
        match kind {
            EventKind::Comment => self.comment = !self.comment,
            EventKind::Gift => self.gift = !self.gift,
            EventKind::Subscription => self.subscription = !self.subscription,
            EventKind::InvalidUser => {}
        }
        true
    }
}

/// Kind filter plus user / text search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedFilter {
    pub kinds: KindFilter,
    /// Matched against identity and nickname.
    #[serde(default)]
    pub user_query: String,
    /// Matched against message text.
    #[serde(default)]
    pub text_query: String,
    /// When on, events that hit neither query are hidden. When off, queries
    /// only drive highlighting.
    #[serde(default)]
    pub filter_mode: bool,
}

impl FeedFilter {
    /// Whether `event` should be shown.
    pub fn matches(&self, event: &FeedEvent) -> bool {
        if !self.kinds.includes(event.kind) {
            return false;
        }
        if !self.filter_mode {
            return true;
        }

        let user_query = self.user_query.trim();
        let text_query = self.text_query.trim();
        if user_query.is_empty() && text_query.is_empty() {
            return true;
        }

        let user_hit = !user_query.is_empty()
            && (contains_ignore_case(event.identity(), user_query)
                || contains_ignore_case(event.display_name(), user_query));
        let text_hit = !text_query.is_empty() && contains_ignore_case(&event.text, text_query);
        user_hit || text_hit
    }

    pub fn has_queries(&self) -> bool {
        !self.user_query.trim().is_empty() || !self.text_query.trim().is_empty()
    }

    pub fn clear_queries(&mut self) {
        self.user_query.clear();
        self.text_query.clear();
        self.filter_mode = false;
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
