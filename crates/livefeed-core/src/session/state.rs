//! Per-session buffering state machine.
//!
//! `SessionState` holds the delivered feed, the pause buffer, the slow-drip
//! queue and the pinned set of a single session. It is plain data: it never
//! spawns, sleeps or locks. Callers (the pipeline) serialize access and turn
//! the returned [`Delivery`] values into surface signals.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::mode::{DeliveryMode, ModeState};
use crate::error::{LiveFeedError, Result};
use crate::event::FeedEvent;

/// Events that just entered the delivered feed.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    /// One event, at `index` in the delivered feed.
    Single { index: usize, event: FeedEvent },
    /// Several events flushed together, the first at `first_index`.
    Batch {
        first_index: usize,
        events: Vec<FeedEvent>,
    },
}

/// What a mode toggle did.
#[derive(Debug, Clone, PartialEq)]
pub struct ModeTransition {
    /// `false` when the request matched the current toggle.
    pub changed: bool,
    pub state: ModeState,
    /// Events flushed to the feed by this transition, if any.
    pub delivery: Option<Delivery>,
}

/// A pinned feed entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinnedItem {
    pub index: usize,
    pub event: FeedEvent,
}

/// What a pin toggle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinToggle {
    /// `true` if the index is pinned after the call.
    pub pinned: bool,
    /// `true` if this pin was the first one, which asks the surface to open
    /// its pinned-items view.
    pub opens_view: bool,
}

/// Read-only view of a session for the presentation surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub handle: String,
    pub session_id: String,
    pub mode: ModeState,
    pub delivered: Vec<FeedEvent>,
    pub pins: Vec<PinnedItem>,
    /// Events waiting in the pause buffer.
    pub paused_pending: usize,
    /// Events waiting in the slow-drip queue.
    pub queued_pending: usize,
}

/// Buffering state for one monitored handle.
#[derive(Debug)]
pub struct SessionState {
    handle: String,
    session_id: String,
    paused: bool,
    slow_mode: bool,
    next_sequence: u64,
    delivered: Vec<FeedEvent>,
    pause_buffer: VecDeque<FeedEvent>,
    slow_queue: VecDeque<FeedEvent>,
    pins: Vec<usize>,
    failure_reported: bool,
}

impl SessionState {
    /// Creates an empty, live session for `handle`.
    pub fn new(handle: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            session_id: Uuid::new_v4().to_string(),
            paused: false,
            slow_mode: false,
            next_sequence: 0,
            delivered: Vec::new(),
            pause_buffer: VecDeque::new(),
            slow_queue: VecDeque::new(),
            pins: Vec::new(),
            failure_reported: false,
        }
    }

    pub fn handle(&self) -> &str {
        &self.handle
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn mode(&self) -> ModeState {
        ModeState::new(self.paused, self.slow_mode)
    }

    pub fn delivered(&self) -> &[FeedEvent] {
        &self.delivered
    }

    pub fn pins(&self) -> &[usize] {
        &self.pins
    }

    pub fn paused_pending(&self) -> usize {
        self.pause_buffer.len()
    }

    pub fn queued_pending(&self) -> usize {
        self.slow_queue.len()
    }

    /// Reserves the next source-order sequence number.
    pub fn next_sequence(&mut self) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        sequence
    }

    /// Records that a connection failure was reported for this session.
    ///
    /// Returns `true` only the first time, so one failure event is emitted
    /// even if the source reports the failure through several paths.
    pub fn mark_failure_reported(&mut self) -> bool {
        !std::mem::replace(&mut self.failure_reported, true)
    }

    /// Routes an incoming event according to the current mode.
    ///
    /// Returns the delivery when the event went straight to the feed.
    pub fn accept(&mut self, event: FeedEvent) -> Option<Delivery> {
        match self.mode().mode {
            DeliveryMode::Live => Some(self.deliver_one(event)),
            DeliveryMode::Paused => {
                self.pause_buffer.push_back(event);
                None
            }
            DeliveryMode::SlowDrip => {
                self.slow_queue.push_back(event);
                None
            }
        }
    }

    /// Turns pausing on or off.
    ///
    /// Resuming flushes the pause buffer to the feed as one batch. If slow
    /// mode is still on, the buffer is appended to the slow-drip queue instead
    /// so that the older queued events keep going out first.
    pub fn set_paused(&mut self, paused: bool) -> ModeTransition {
        if self.paused == paused {
            return self.unchanged();
        }
        self.paused = paused;

        let delivery = if paused {
            None
        } else if self.slow_mode {
            self.slow_queue.extend(self.pause_buffer.drain(..));
            None
        } else {
            let drained: Vec<FeedEvent> = self.pause_buffer.drain(..).collect();
            self.deliver_batch(drained)
        };

        ModeTransition {
            changed: true,
            state: self.mode(),
            delivery,
        }
    }

    /// Turns slow mode on or off.
    ///
    /// Leaving slow mode flushes every queued event to the feed at once.
    pub fn set_slow_mode(&mut self, slow_mode: bool) -> ModeTransition {
        if self.slow_mode == slow_mode {
            return self.unchanged();
        }
        self.slow_mode = slow_mode;

        let delivery = if slow_mode {
            None
        } else {
            let drained: Vec<FeedEvent> = self.slow_queue.drain(..).collect();
            self.deliver_batch(drained)
        };

        ModeTransition {
            changed: true,
            state: self.mode(),
            delivery,
        }
    }

    /// Releases the oldest slow-drip event, if slow mode is on and the queue
    /// is not empty.
    pub fn drip(&mut self) -> Option<Delivery> {
        if !self.slow_mode {
            return None;
        }
        let event = self.slow_queue.pop_front()?;
        Some(self.deliver_one(event))
    }

    /// Toggles the pin on a delivered index.
    ///
    /// # Errors
    ///
    /// Returns `InvalidIndex` if nothing has been delivered at `index`.
    pub fn toggle_pin(&mut self, index: usize) -> Result<PinToggle> {
        if index >= self.delivered.len() {
            return Err(LiveFeedError::InvalidIndex {
                index,
                len: self.delivered.len(),
            });
        }

        if let Some(position) = self.pins.iter().position(|pinned| *pinned == index) {
            self.pins.remove(position);
            return Ok(PinToggle {
                pinned: false,
                opens_view: false,
            });
        }

        let opens_view = self.pins.is_empty();
        self.pins.push(index);
        Ok(PinToggle {
            pinned: true,
            opens_view,
        })
    }

    /// Removes a pin. Returns `true` if the index was pinned.
    pub fn unpin(&mut self, index: usize) -> bool {
        match self.pins.iter().position(|pinned| *pinned == index) {
            Some(position) => {
                self.pins.remove(position);
                true
            }
            None => false,
        }
    }

    /// Removes every pin. Returns `true` if anything was pinned.
    pub fn clear_pins(&mut self) -> bool {
        let had_pins = !self.pins.is_empty();
        self.pins.clear();
        had_pins
    }

    /// Pinned entries in pin order.
    pub fn pinned_items(&self) -> Vec<PinnedItem> {
        self.pins
            .iter()
            .filter_map(|index| {
                self.delivered.get(*index).map(|event| PinnedItem {
                    index: *index,
                    event: event.clone(),
                })
            })
            .collect()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            handle: self.handle.clone(),
            session_id: self.session_id.clone(),
            mode: self.mode(),
            delivered: self.delivered.clone(),
            pins: self.pinned_items(),
            paused_pending: self.pause_buffer.len(),
            queued_pending: self.slow_queue.len(),
        }
    }

    fn unchanged(&self) -> ModeTransition {
        ModeTransition {
            changed: false,
            state: self.mode(),
            delivery: None,
        }
    }

    fn deliver_one(&mut self, event: FeedEvent) -> Delivery {
        let index = self.delivered.len();
        self.delivered.push(event.clone());
        Delivery::Single { index, event }
    }

    fn deliver_batch(&mut self, events: Vec<FeedEvent>) -> Option<Delivery> {
        if events.is_empty() {
            return None;
        }
        let first_index = self.delivered.len();
        self.delivered.extend(events.iter().cloned());
        Some(Delivery::Batch {
            first_index,
            events,
        })
    }
}
