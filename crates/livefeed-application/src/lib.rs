//! Application layer for LiveFeed.
//!
//! This crate hosts the event pipeline that sits between an external event
//! source and the presentation surface.

pub mod pipeline;

pub use pipeline::{EventPipeline, StartOutcome};
