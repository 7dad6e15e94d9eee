//! Recently started handles.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Ordered, de-duplicated list of handles, newest last.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentHandles {
    #[serde(default)]
    pub handles: Vec<String>,
}

impl RecentHandles {
    /// Moves `handle` to the end of the list, dropping the oldest entries
    /// beyond `limit`. A `limit` of zero keeps nothing.
    pub fn remember(&mut self, handle: &str, limit: usize) {
        self.handles.retain(|existing| existing != handle);
        self.handles.push(handle.to_string());
        if self.handles.len() > limit {
            let excess = self.handles.len() - limit;
            self.handles.drain(..excess);
        }
    }

    /// Removes `handle`. Returns `true` if it was present.
    pub fn forget(&mut self, handle: &str) -> bool {
        let before = self.handles.len();
        self.handles.retain(|existing| existing != handle);
        before != self.handles.len()
    }

    /// Handles, most recent first.
    pub fn newest_first(&self) -> Vec<String> {
        self.handles.iter().rev().cloned().collect()
    }
}

/// Persistence for the recent-handles list.
#[async_trait]
pub trait RecentHandlesRepository: Send + Sync {
    async fn load(&self) -> Result<RecentHandles>;

    /// Records a started handle and returns the updated list.
    async fn remember(&self, handle: &str) -> Result<RecentHandles>;

    async fn forget(&self, handle: &str) -> Result<RecentHandles>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remember_deduplicates_and_moves_to_end() {
        let mut recent = RecentHandles::default();
        recent.remember("alice", 5);
        recent.remember("bob", 5);
        recent.remember("alice", 5);
        assert_eq!(recent.handles, vec!["bob", "alice"]);
        assert_eq!(recent.newest_first(), vec!["alice", "bob"]);
    }

    #[test]
    fn test_remember_caps_list() {
        let mut recent = RecentHandles::default();
        for handle in ["a", "b", "c", "d"] {
            recent.remember(handle, 3);
        }
        assert_eq!(recent.handles, vec!["b", "c", "d"]);
    }

    #[test]
    fn test_forget() {
        let mut recent = RecentHandles::default();
        recent.remember("alice", 5);
        assert!(recent.forget("alice"));
        assert!(!recent.forget("alice"));
        assert!(recent.handles.is_empty());
    }
}
