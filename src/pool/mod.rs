//! Content pool module
//!
//! Holds the finite set of candidate messages for one campaign and enforces
//! at-most-once use per item.

mod content;

pub use content::{ContentItem, ContentPool};
