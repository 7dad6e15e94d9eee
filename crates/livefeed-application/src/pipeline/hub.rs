use std::sync::{Mutex, PoisonError};

use livefeed_core::session::Delivery;
use livefeed_core::signal::FeedSignal;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Fan-out of pipeline signals to every subscriber.
///
/// Sends never block, so callers may broadcast while holding a session lock.
#[derive(Default)]
pub(crate) struct SignalHub {
    subscribers: Mutex<Vec<UnboundedSender<FeedSignal>>>,
}

impl SignalHub {
    pub(crate) fn subscribe(&self) -> UnboundedReceiver<FeedSignal> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    /// Sends `signal` to every live subscriber and forgets closed ones.
    pub(crate) fn broadcast(&self, signal: FeedSignal) {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|tx| tx.send(signal.clone()).is_ok());
    }

    pub(crate) fn broadcast_delivery(&self, handle: &str, delivery: Delivery) {
        let signal = match delivery {
            Delivery::Single { index, event } => FeedSignal::Event {
                handle: handle.to_string(),
                index,
                event,
            },
            Delivery::Batch {
                first_index,
                events,
            } => FeedSignal::Batch {
                handle: handle.to_string(),
                first_index,
                events,
            },
        };
        self.broadcast(signal);
    }
}
