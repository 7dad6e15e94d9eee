//! One registered session: its state, connection and slow-drip timer.

use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, Weak};
use std::time::Duration;

use livefeed_core::error::Result;
use livefeed_core::event::{RawEvent, build_event, invalid_user_event};
use livefeed_core::session::{ModeState, PinToggle, SessionSnapshot, SessionState};
use livefeed_core::signal::FeedSignal;
use livefeed_core::source::{SourceConnection, SourceHandler};
use tokio_util::sync::CancellationToken;

use super::drip::spawn_slow_drip;
use super::hub::SignalHub;

struct SlotInner {
    state: SessionState,
    closed: bool,
    /// Bumped whenever the slow-drip timer is armed or disarmed. A tick only
    /// counts if it carries the current epoch.
    drip_epoch: u64,
    drip_token: Option<CancellationToken>,
}

impl SlotInner {
    fn disarm_drip(&mut self) {
        self.drip_epoch += 1;
        if let Some(token) = self.drip_token.take() {
            token.cancel();
        }
    }
}

pub(crate) struct SessionSlot {
    handle: String,
    session_id: String,
    inner: Mutex<SlotInner>,
    connection: OnceLock<Arc<dyn SourceConnection>>,
    hub: Arc<SignalHub>,
}

impl SessionSlot {
    pub(crate) fn new(handle: String, hub: Arc<SignalHub>) -> Self {
        let state = SessionState::new(handle.clone());
        Self {
            session_id: state.session_id().to_string(),
            handle,
            inner: Mutex::new(SlotInner {
                state,
                closed: false,
                drip_epoch: 0,
                drip_token: None,
            }),
            connection: OnceLock::new(),
            hub,
        }
    }

    pub(crate) fn handle(&self) -> &str {
        &self.handle
    }

    pub(crate) fn session_id(&self) -> &str {
        &self.session_id
    }

    fn lock(&self) -> MutexGuard<'_, SlotInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn attach(&self, connection: Arc<dyn SourceConnection>) {
        if self.connection.set(connection).is_err() {
            tracing::warn!("[Pipeline] Connection for @{} already attached", self.handle);
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Classifies, stamps and routes one raw event.
    pub(crate) fn submit(&self, raw: RawEvent) {
        let mut inner = self.lock();
        if inner.closed {
            tracing::debug!("[Pipeline] Dropping event for closed session @{}", self.handle);
            return;
        }
        let sequence = inner.state.next_sequence();
        let (event, classification) = build_event(sequence, raw);
        if classification.fallback {
            tracing::debug!(
                "[Pipeline] Classification fallback for @{}: treated as {:?}",
                self.handle,
                classification.kind
            );
        }
        if let Some(delivery) = inner.state.accept(event) {
            self.hub.broadcast_delivery(&self.handle, delivery);
        }
    }

    /// Emits the synthetic invalid-user event, at most once per session.
    pub(crate) fn report_failure(&self, reason: &str) {
        let mut inner = self.lock();
        if inner.closed || !inner.state.mark_failure_reported() {
            return;
        }
        tracing::warn!("[Pipeline] Could not monitor @{}: {}", self.handle, reason);
        let sequence = inner.state.next_sequence();
        let event = invalid_user_event(sequence, &self.handle, reason);
        if let Some(delivery) = inner.state.accept(event) {
            self.hub.broadcast_delivery(&self.handle, delivery);
        }
    }

    pub(crate) fn mode(&self) -> ModeState {
        self.lock().state.mode()
    }

    pub(crate) fn set_paused(&self, paused: bool) -> ModeState {
        let mut inner = self.lock();
        if inner.closed {
            return inner.state.mode();
        }
        let transition = inner.state.set_paused(paused);
        if transition.changed {
            self.hub.broadcast(FeedSignal::ModeChanged {
                handle: self.handle.clone(),
                state: transition.state,
            });
        }
        if let Some(delivery) = transition.delivery {
            self.hub.broadcast_delivery(&self.handle, delivery);
        }
        transition.state
    }

    /// Turns slow mode on or off, arming or disarming the drip timer.
    pub(crate) fn set_slow_mode(self: &Arc<Self>, slow_mode: bool, period: Duration) -> ModeState {
        let mut inner = self.lock();
        if inner.closed {
            return inner.state.mode();
        }
        let transition = inner.state.set_slow_mode(slow_mode);
        if !transition.changed {
            return transition.state;
        }

        inner.disarm_drip();
        if slow_mode {
            let token = CancellationToken::new();
            inner.drip_token = Some(token.clone());
            spawn_slow_drip(Arc::clone(self), inner.drip_epoch, token, period);
        }

        self.hub.broadcast(FeedSignal::ModeChanged {
            handle: self.handle.clone(),
            state: transition.state,
        });
        if let Some(delivery) = transition.delivery {
            self.hub.broadcast_delivery(&self.handle, delivery);
        }
        transition.state
    }

    /// Releases one queued event. Returns `false` once the timer that fired
    /// is stale and should stop.
    pub(crate) fn drip_tick(&self, epoch: u64) -> bool {
        let mut inner = self.lock();
        if inner.closed || inner.drip_epoch != epoch || !inner.state.mode().slow_mode {
            return false;
        }
        if let Some(delivery) = inner.state.drip() {
            self.hub.broadcast_delivery(&self.handle, delivery);
        }
        true
    }

    pub(crate) fn toggle_pin(&self, index: usize) -> Result<PinToggle> {
        let mut inner = self.lock();
        let toggle = inner.state.toggle_pin(index)?;
        self.broadcast_pins(&inner.state);
        if toggle.opens_view {
            self.hub.broadcast(FeedSignal::OpenPinnedView {
                handle: self.handle.clone(),
            });
        }
        Ok(toggle)
    }

    pub(crate) fn unpin(&self, index: usize) -> bool {
        let mut inner = self.lock();
        let removed = inner.state.unpin(index);
        if removed {
            self.broadcast_pins(&inner.state);
        }
        removed
    }

    pub(crate) fn clear_pins(&self) -> bool {
        let mut inner = self.lock();
        let cleared = inner.state.clear_pins();
        if cleared {
            self.broadcast_pins(&inner.state);
        }
        cleared
    }

    fn broadcast_pins(&self, state: &SessionState) {
        self.hub.broadcast(FeedSignal::PinnedChanged {
            handle: self.handle.clone(),
            pins: state.pinned_items(),
        });
    }

    pub(crate) fn snapshot(&self) -> SessionSnapshot {
        self.lock().state.snapshot()
    }

    pub(crate) fn connection(&self) -> Option<Arc<dyn SourceConnection>> {
        self.connection.get().cloned()
    }

    /// Marks the session closed and stops its timer.
    ///
    /// Returns the connection so the caller can disconnect it without holding
    /// the session lock.
    pub(crate) fn close(&self) -> Option<Arc<dyn SourceConnection>> {
        let mut inner = self.lock();
        inner.closed = true;
        inner.disarm_drip();
        self.connection()
    }
}

/// The handler a connection reports into.
///
/// Holds the slot weakly: the slot owns the connection, which owns the
/// handler.
pub(crate) struct SlotHandler {
    slot: Weak<SessionSlot>,
}

impl SlotHandler {
    pub(crate) fn new(slot: &Arc<SessionSlot>) -> Self {
        Self {
            slot: Arc::downgrade(slot),
        }
    }
}

impl SourceHandler for SlotHandler {
    fn on_event(&self, raw: RawEvent) {
        if let Some(slot) = self.slot.upgrade() {
            slot.submit(raw);
        }
    }

    fn on_failure(&self, reason: String) {
        if let Some(slot) = self.slot.upgrade() {
            slot.report_failure(&reason);
        }
    }
}
