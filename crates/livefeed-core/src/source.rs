//! Producer-side traits for external event sources.
//!
//! The live-streaming protocol client is modelled as an [`EventSource`] that
//! opens one [`SourceConnection`] per handle and reports everything it sees to
//! a [`SourceHandler`]. The pipeline is the only handler implementation.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::event::RawEvent;

/// Receives events and failures for one session.
///
/// Implementations must not block: both methods are called from the source's
/// own task.
pub trait SourceHandler: Send + Sync {
    fn on_event(&self, raw: RawEvent);

    /// The source gave up on the connection.
    fn on_failure(&self, reason: String);
}

/// A single connection to a handle's live stream.
#[async_trait]
pub trait SourceConnection: Send + Sync {
    /// Connects and starts delivering to the handler given at open time.
    ///
    /// Returns once the connection is established; an `Err` means the handle
    /// cannot be monitored.
    async fn connect(&self) -> Result<()>;

    /// Stops delivering. Safe to call more than once.
    async fn disconnect(&self);
}

/// Factory for connections.
pub trait EventSource: Send + Sync {
    fn open(&self, handle: &str, handler: Arc<dyn SourceHandler>) -> Arc<dyn SourceConnection>;
}
