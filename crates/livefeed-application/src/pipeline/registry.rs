use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::slot::SessionSlot;

/// Active sessions keyed by normalized handle.
pub(crate) struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<String, Arc<SessionSlot>>>>,
}

impl SessionRegistry {
    pub(crate) fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub(crate) async fn get(&self, handle: &str) -> Option<Arc<SessionSlot>> {
        let sessions = self.sessions.read().await;
        sessions.get(handle).cloned()
    }

    /// Inserts `slot` unless its handle is already registered.
    ///
    /// With `exclusive` set, every other session is removed in the same step
    /// and returned so the caller can disconnect it.
    ///
    /// `announce` runs under the write lock with the evicted sessions and the
    /// new one, right before the new slot becomes visible. Nothing reachable
    /// through the registry can signal for the new session ahead of it.
    ///
    /// Returns `None` if the handle was already active.
    pub(crate) async fn insert<F>(
        &self,
        slot: Arc<SessionSlot>,
        exclusive: bool,
        announce: F,
    ) -> Option<Vec<Arc<SessionSlot>>>
    where
        F: FnOnce(&[Arc<SessionSlot>], &SessionSlot),
    {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(slot.handle()) {
            return None;
        }

        let evicted: Vec<Arc<SessionSlot>> = if exclusive {
            sessions.drain().map(|(_, evicted)| evicted).collect()
        } else {
            Vec::new()
        };
        announce(evicted.as_slice(), slot.as_ref());
        sessions.insert(slot.handle().to_string(), slot);
        Some(evicted)
    }

    pub(crate) async fn remove(&self, handle: &str) -> Option<Arc<SessionSlot>> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(handle)
    }

    /// Removes and returns every session.
    pub(crate) async fn drain(&self) -> Vec<Arc<SessionSlot>> {
        let mut sessions = self.sessions.write().await;
        sessions.drain().map(|(_, slot)| slot).collect()
    }

    pub(crate) async fn handles(&self) -> Vec<String> {
        let sessions = self.sessions.read().await;
        let mut handles: Vec<String> = sessions.keys().cloned().collect();
        handles.sort();
        handles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::hub::SignalHub;

    #[tokio::test]
    async fn test_announce_runs_under_lock_for_new_handles_only() {
        let registry = SessionRegistry::new();
        let hub = Arc::new(SignalHub::default());
        let slot = |handle: &str| Arc::new(SessionSlot::new(handle.to_string(), Arc::clone(&hub)));
        let mut announced = Vec::new();

        let evicted = registry
            .insert(slot("alice"), false, |evicted, started| {
                assert!(evicted.is_empty());
                assert!(registry.sessions.try_read().is_err());
                announced.push(started.handle().to_string());
            })
            .await;
        assert_eq!(evicted.map(|e| e.len()), Some(0));

        let duplicate = registry
            .insert(slot("alice"), true, |_, started| {
                announced.push(started.handle().to_string());
            })
            .await;
        assert!(duplicate.is_none());

        let evicted = registry
            .insert(slot("bob"), true, |evicted, started| {
                assert_eq!(evicted.len(), 1);
                assert_eq!(evicted[0].handle(), "alice");
                announced.push(started.handle().to_string());
            })
            .await
            .unwrap();
        assert_eq!(evicted.len(), 1);
        assert_eq!(announced, vec!["alice", "bob"]);
        assert_eq!(registry.handles().await, vec!["bob"]);
    }
}
