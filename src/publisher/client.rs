//! HTTP publishing client
//!
//! Talks to the platform's upload and post endpoints with a bearer token.
//! Media is sent base64-encoded in the upload form; the post references the
//! returned media id.

use std::path::Path;

use async_trait::async_trait;
use base64::Engine;
use tracing::debug;

use crate::error::CampaignError;

use super::PublishingService;

/// Publisher endpoint and credential configuration
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublisherConfig {
    /// Media upload endpoint
    pub upload_url: String,
    /// Post creation endpoint
    pub post_url: String,
    /// Bearer token; usually supplied via the CAMPAIGN_BOT_TOKEN env var
    #[serde(default)]
    pub bearer_token: String,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            upload_url: "https://upload.twitter.com/1.1/media/upload.json".to_string(),
            post_url: "https://api.twitter.com/2/tweets".to_string(),
            bearer_token: String::new(),
        }
    }
}

#[derive(serde::Deserialize)]
struct UploadResponse {
    media_id_string: String,
}

#[derive(serde::Deserialize)]
struct PostResponse {
    data: PostData,
}

#[derive(serde::Deserialize)]
struct PostData {
    id: String,
}

#[derive(serde::Serialize)]
struct PostBody<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    media: Option<PostMedia<'a>>,
}

#[derive(serde::Serialize)]
struct PostMedia<'a> {
    media_ids: Vec<&'a str>,
}

/// Production `PublishingService` backed by reqwest
pub struct HttpPublisher {
    client: reqwest::Client,
    config: PublisherConfig,
}

impl HttpPublisher {
    /// Create a publisher from endpoint configuration
    pub fn new(config: PublisherConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl PublishingService for HttpPublisher {
    async fn upload_media(&self, path: &Path) -> Result<String, CampaignError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| CampaignError::Unknown(format!("cannot read media {:?}: {}", path, e)))?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);

        debug!("Uploading media {:?} ({} bytes encoded)", path, encoded.len());

        let response = self
            .client
            .post(&self.config.upload_url)
            .bearer_auth(&self.config.bearer_token)
            .form(&[("media_data", encoded.as_str())])
            .send()
            .await?
            .error_for_status()?;

        let upload: UploadResponse = response.json().await?;
        Ok(upload.media_id_string)
    }

    async fn post(&self, text: &str, media_id: Option<&str>) -> Result<String, CampaignError> {
        let body = PostBody {
            text,
            media: media_id.map(|id| PostMedia { media_ids: vec![id] }),
        };

        let response = self
            .client
            .post(&self.config.post_url)
            .bearer_auth(&self.config.bearer_token)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let posted: PostResponse = response.json().await?;
        Ok(posted.data.id)
    }
}
