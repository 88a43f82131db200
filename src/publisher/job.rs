//! Publish job
//!
//! One scheduled publish attempt: draw a content item, upload its media,
//! post, record the outcome. Every failure is caught here; nothing
//! propagates to the clock or the lifecycle controller, and a failed
//! publish never stops the campaign.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::error::CampaignError;
use crate::pool::{ContentItem, ContentPool};

use super::PublishingService;

/// Result of one attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    Failure(String),
}

/// Ephemeral record of one publish attempt, used only for logging and tests
#[derive(Debug, Clone)]
pub struct PublishAttempt {
    pub item: ContentItem,
    pub media_id: Option<String>,
    pub published_at: DateTime<Utc>,
    pub outcome: AttemptOutcome,
}

/// Orchestrates a single publish attempt per clock fire.
pub struct PublishJob {
    pool: Arc<tokio::sync::Mutex<ContentPool>>,
    service: Arc<dyn PublishingService>,
}

impl PublishJob {
    /// Create a job over the shared pool and publishing service
    pub fn new(
        pool: Arc<tokio::sync::Mutex<ContentPool>>,
        service: Arc<dyn PublishingService>,
    ) -> Self {
        Self { pool, service }
    }

    /// Run one publish attempt.
    ///
    /// The draw happens before any network call, so an item is consumed even
    /// if the upload or post fails afterwards (at-most-once consumption).
    /// Returns `None` when the pool is exhausted; retries happen only at the
    /// next scheduled tick.
    pub async fn run(&self) -> Option<PublishAttempt> {
        let item = {
            let mut pool = self.pool.lock().await;
            match pool.draw() {
                Ok(item) => item,
                Err(CampaignError::PoolExhausted) => {
                    warn!("All messages have been used - skipping this tick");
                    return None;
                }
                Err(e) => {
                    error!("Unexpected draw failure: {}", e);
                    return None;
                }
            }
        };

        let mut media_id = None;
        if let Some(path) = &item.media {
            match self.service.upload_media(path).await {
                Ok(id) => media_id = Some(id),
                Err(e) => return Some(self.record(item, None, AttemptOutcome::Failure(e.to_string()))),
            }
        }

        match self.service.post(&item.text, media_id.as_deref()).await {
            Ok(post_id) => {
                info!("Successfully published post {}", post_id);
                Some(self.record(item, media_id, AttemptOutcome::Success))
            }
            Err(e) => Some(self.record(item, media_id, AttemptOutcome::Failure(e.to_string()))),
        }
    }

    fn record(
        &self,
        item: ContentItem,
        media_id: Option<String>,
        outcome: AttemptOutcome,
    ) -> PublishAttempt {
        if let AttemptOutcome::Failure(reason) = &outcome {
            error!("Publish attempt failed: {} (no retry until next tick)", reason);
        }
        PublishAttempt {
            item,
            media_id,
            published_at: Utc::now(),
            outcome,
        }
    }
}
