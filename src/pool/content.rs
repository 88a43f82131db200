//! In-memory content pool with random, non-repeating draws.
//!
//! A drawn item is removed and never returned. The pool lives for one process
//! lifetime; a restart resets it (accepted limitation).

use std::path::PathBuf;

use rand::Rng;
use tracing::debug;

use crate::error::CampaignError;

/// One candidate message for the campaign.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    /// Message body posted to the platform
    pub text: String,
    /// Optional local media file uploaded before posting
    #[serde(default)]
    pub media: Option<PathBuf>,
}

impl ContentItem {
    /// Create a text-only item
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            media: None,
        }
    }

    /// Create an item with an attached media file
    pub fn with_media(text: impl Into<String>, media: impl Into<PathBuf>) -> Self {
        Self {
            text: text.into(),
            media: Some(media.into()),
        }
    }
}

/// Finite pool of candidate items, consumed at most once each.
#[derive(Debug)]
pub struct ContentPool {
    items: Vec<ContentItem>,
}

impl ContentPool {
    /// Create a pool from the configured items
    pub fn new(items: Vec<ContentItem>) -> Self {
        Self { items }
    }

    /// Number of items still available
    pub fn remaining(&self) -> usize {
        self.items.len()
    }

    /// Check whether the pool has been fully consumed
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Draw one item at uniform random, removing it from the pool.
    ///
    /// Returns `PoolExhausted` once every item has been consumed. Exhaustion
    /// is recoverable for the caller; the pool itself stays usable (and
    /// empty).
    pub fn draw(&mut self) -> Result<ContentItem, CampaignError> {
        if self.items.is_empty() {
            return Err(CampaignError::PoolExhausted);
        }

        let index = rand::thread_rng().gen_range(0..self.items.len());
        let item = self.items.swap_remove(index);

        debug!("Drew content item ({} remaining)", self.items.len());
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool_of(texts: &[&str]) -> ContentPool {
        ContentPool::new(texts.iter().map(|t| ContentItem::text(*t)).collect())
    }

    #[test]
    fn draw_removes_item() {
        let mut pool = pool_of(&["a", "b", "c"]);
        assert_eq!(pool.remaining(), 3);
        pool.draw().unwrap();
        assert_eq!(pool.remaining(), 2);
    }

    #[test]
    fn no_item_drawn_twice() {
        let mut pool = pool_of(&["a", "b", "c", "d", "e"]);
        let mut seen = Vec::new();
        while let Ok(item) = pool.draw() {
            assert!(!seen.contains(&item.text), "item drawn twice: {}", item.text);
            seen.push(item.text);
        }
        assert_eq!(seen.len(), 5);
    }

    #[test]
    fn empty_pool_is_exhausted() {
        let mut pool = pool_of(&[]);
        assert!(matches!(pool.draw(), Err(CampaignError::PoolExhausted)));
    }

    #[test]
    fn two_items_then_exhausted() {
        let mut pool = pool_of(&["A", "B"]);

        let first = pool.draw().unwrap();
        let second = pool.draw().unwrap();
        assert_ne!(first.text, second.text);
        assert!(["A", "B"].contains(&first.text.as_str()));
        assert!(["A", "B"].contains(&second.text.as_str()));

        // Third draw fails but must not poison the pool
        assert!(matches!(pool.draw(), Err(CampaignError::PoolExhausted)));
        assert!(matches!(pool.draw(), Err(CampaignError::PoolExhausted)));
        assert!(pool.is_empty());
    }
}
