//! Publishing module
//!
//! The platform SDK is modeled as the `PublishingService` trait so the job
//! can be exercised with test doubles; `HttpPublisher` is the production
//! implementation.

mod client;
mod job;

use std::path::Path;

use async_trait::async_trait;

use crate::error::CampaignError;

pub use client::{HttpPublisher, PublisherConfig};
pub use job::{AttemptOutcome, PublishAttempt, PublishJob};

/// Platform publishing calls: media upload, then post.
///
/// Either call may fail with a transport error; callers treat failures
/// uniformly and never branch on error codes.
#[async_trait]
pub trait PublishingService: Send + Sync {
    /// Upload a local media file, returning the platform media id
    async fn upload_media(&self, path: &Path) -> Result<String, CampaignError>;

    /// Publish a post, optionally referencing an uploaded media id.
    /// Returns the platform post id.
    async fn post(&self, text: &str, media_id: Option<&str>) -> Result<String, CampaignError>;
}
