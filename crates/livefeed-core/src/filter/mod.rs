//! Feed filtering and search.
//!
//! Filters never touch the delivered feed; they decide what a surface shows.

mod highlight;
mod model;

pub use highlight::{Segment, highlight};
pub use model::{FeedFilter, KindFilter};
