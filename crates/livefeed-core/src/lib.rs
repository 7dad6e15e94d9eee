pub mod config;
pub mod error;
pub mod event;
pub mod filter;
pub mod recent;
pub mod session;
pub mod signal;
pub mod source;

// Re-export common error type
pub use error::{LiveFeedError, Result};
