//! Event ingestion, buffering and staged delivery.
//!
//! `EventPipeline` owns the session registry. Each session lives in a
//! `SessionSlot` whose state sits behind a `std::sync::Mutex` that is never
//! held across an `.await`; signals are broadcast while the lock is held so
//! subscribers observe deliveries in feed order.

mod drip;
mod hub;
mod registry;
mod slot;

use std::sync::Arc;

use livefeed_core::config::PipelineConfig;
use livefeed_core::error::{LiveFeedError, Result};
use livefeed_core::event::RawEvent;
use livefeed_core::recent::RecentHandlesRepository;
use livefeed_core::session::{ModeState, PinToggle, SessionSnapshot, normalize_handle};
use livefeed_core::signal::FeedSignal;
use livefeed_core::source::{EventSource, SourceConnection};
use tokio::sync::mpsc::UnboundedReceiver;

use hub::SignalHub;
use registry::SessionRegistry;
use slot::{SessionSlot, SlotHandler};

/// Result of a start request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    /// A new session was created.
    Started { handle: String, session_id: String },
    /// A session for the handle was already running; nothing changed.
    AlreadyActive { handle: String },
}

/// Mediates between an [`EventSource`] and any number of signal subscribers.
pub struct EventPipeline {
    source: Arc<dyn EventSource>,
    config: PipelineConfig,
    registry: SessionRegistry,
    hub: Arc<SignalHub>,
    recent: Option<Arc<dyn RecentHandlesRepository>>,
}

impl EventPipeline {
    pub fn new(source: Arc<dyn EventSource>, config: PipelineConfig) -> Self {
        Self {
            source,
            config,
            registry: SessionRegistry::new(),
            hub: Arc::new(SignalHub::default()),
            recent: None,
        }
    }

    /// Remembers every started handle in `repository`.
    pub fn with_recent_handles(mut self, repository: Arc<dyn RecentHandlesRepository>) -> Self {
        self.recent = Some(repository);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Returns a receiver for every signal emitted from now on.
    pub fn subscribe(&self) -> UnboundedReceiver<FeedSignal> {
        self.hub.subscribe()
    }

    /// Starts monitoring `handle`.
    ///
    /// A second start for a running handle is a no-op. Unless multiple
    /// sessions are allowed, every other session is stopped first. Connecting
    /// happens in the background; a failure shows up as one invalid-user event
    /// in the new session's feed.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHandle` if the handle is empty after normalization.
    pub async fn start_session(&self, handle: &str) -> Result<StartOutcome> {
        let handle = normalize_handle(handle)?;
        let slot = Arc::new(SessionSlot::new(handle.clone(), Arc::clone(&self.hub)));

        let exclusive = !self.config.allow_multiple_sessions;
        let announce = |evicted: &[Arc<SessionSlot>], started: &SessionSlot| {
            for other in evicted {
                tracing::info!("[Pipeline] Stopping @{} to start @{}", other.handle(), handle);
                self.retire_slot(other);
            }
            self.hub.broadcast(FeedSignal::SessionStarted {
                handle: started.handle().to_string(),
                session_id: started.session_id().to_string(),
            });
        };
        let Some(evicted) = self
            .registry
            .insert(Arc::clone(&slot), exclusive, announce)
            .await
        else {
            tracing::debug!("[Pipeline] Session for @{} already active", handle);
            return Ok(StartOutcome::AlreadyActive { handle });
        };
        for other in evicted {
            if let Some(connection) = other.connection() {
                connection.disconnect().await;
            }
        }

        let handler = Arc::new(SlotHandler::new(&slot));
        let connection = self.source.open(&handle, handler);
        slot.attach(Arc::clone(&connection));

        let connecting = Arc::clone(&slot);
        tokio::spawn(async move {
            if connecting.is_closed() {
                return;
            }
            match connection.connect().await {
                Ok(()) => {
                    if connecting.is_closed() {
                        connection.disconnect().await;
                    } else {
                        tracing::info!("[Pipeline] Connected to @{}", connecting.handle());
                    }
                }
                Err(e) => connecting.report_failure(&e.to_string()),
            }
        });

        if let Some(recent) = &self.recent {
            if let Err(e) = recent.remember(&handle).await {
                tracing::warn!("[Pipeline] Failed to remember @{}: {}", handle, e);
            }
        }

        tracing::info!("[Pipeline] Started session @{} ({})", handle, slot.session_id());
        Ok(StartOutcome::Started {
            handle,
            session_id: slot.session_id().to_string(),
        })
    }

    /// Stops monitoring `handle`. Returns `false` if it was not running.
    pub async fn stop_session(&self, handle: &str) -> Result<bool> {
        let handle = normalize_handle(handle)?;
        match self.registry.remove(&handle).await {
            Some(slot) => {
                self.close_slot(slot).await;
                tracing::info!("[Pipeline] Stopped session @{}", handle);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Stops every session.
    pub async fn shutdown(&self) {
        for slot in self.registry.drain().await {
            self.close_slot(slot).await;
        }
        tracing::info!("[Pipeline] Shut down");
    }

    async fn close_slot(&self, slot: Arc<SessionSlot>) {
        if let Some(connection) = self.retire_slot(&slot) {
            connection.disconnect().await;
        }
    }

    /// Closes `slot` and signals its stop. The caller disconnects the returned
    /// connection once no lock is held.
    fn retire_slot(&self, slot: &SessionSlot) -> Option<Arc<dyn SourceConnection>> {
        let connection = slot.close();
        self.hub.broadcast(FeedSignal::SessionStopped {
            handle: slot.handle().to_string(),
        });
        connection
    }

    async fn slot(&self, handle: &str) -> Result<Arc<SessionSlot>> {
        let handle = normalize_handle(handle)?;
        self.registry
            .get(&handle)
            .await
            .ok_or_else(|| LiveFeedError::not_found("Session", handle))
    }

    /// Feeds one raw event into `handle`'s session.
    pub async fn submit_event(&self, handle: &str, raw: RawEvent) -> Result<()> {
        self.slot(handle).await?.submit(raw);
        Ok(())
    }

    pub async fn set_paused(&self, handle: &str, paused: bool) -> Result<ModeState> {
        Ok(self.slot(handle).await?.set_paused(paused))
    }

    pub async fn toggle_paused(&self, handle: &str) -> Result<ModeState> {
        let slot = self.slot(handle).await?;
        let paused = !slot.mode().paused;
        Ok(slot.set_paused(paused))
    }

    pub async fn set_slow_mode(&self, handle: &str, slow_mode: bool) -> Result<ModeState> {
        let slot = self.slot(handle).await?;
        Ok(slot.set_slow_mode(slow_mode, self.config.slow_drip_interval()))
    }

    pub async fn toggle_slow_mode(&self, handle: &str) -> Result<ModeState> {
        let slot = self.slot(handle).await?;
        let slow_mode = !slot.mode().slow_mode;
        Ok(slot.set_slow_mode(slow_mode, self.config.slow_drip_interval()))
    }

    /// Toggles the pin on a delivered index.
    pub async fn pin(&self, handle: &str, index: usize) -> Result<PinToggle> {
        self.slot(handle).await?.toggle_pin(index)
    }

    pub async fn unpin(&self, handle: &str, index: usize) -> Result<bool> {
        Ok(self.slot(handle).await?.unpin(index))
    }

    pub async fn clear_pins(&self, handle: &str) -> Result<bool> {
        Ok(self.slot(handle).await?.clear_pins())
    }

    pub async fn snapshot(&self, handle: &str) -> Result<SessionSnapshot> {
        Ok(self.slot(handle).await?.snapshot())
    }

    /// Handles of every running session, sorted.
    pub async fn active_handles(&self) -> Vec<String> {
        self.registry.handles().await
    }

    /// Recently started handles, newest first. Empty without a repository.
    pub async fn recent_handles(&self) -> Result<Vec<String>> {
        match &self.recent {
            Some(recent) => Ok(recent.load().await?.newest_first()),
            None => Ok(Vec::new()),
        }
    }

    /// Removes `handle` from the recent list.
    pub async fn forget_handle(&self, handle: &str) -> Result<Vec<String>> {
        let handle = normalize_handle(handle)?;
        match &self.recent {
            Some(recent) => Ok(recent.forget(&handle).await?.newest_first()),
            None => Ok(Vec::new()),
        }
    }
}
