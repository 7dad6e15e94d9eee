//! Feed event domain module.
//!
//! - `model`: event kinds, raw source events and classified `FeedEvent`s
//! - `classify`: kind detection and best-effort field extraction

mod classify;
mod model;

pub use classify::{Classification, build_event, classify, invalid_user_event};
pub use model::{EventKind, FeedEvent, RawEvent, SourceChannel};
