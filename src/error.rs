//! Campaign error types

use thiserror::Error;

/// Errors raised by the campaign engine.
///
/// `Config` is fatal at startup; everything else is recoverable per tick and
/// caught at the publish-job boundary.
#[derive(Error, Debug)]
pub enum CampaignError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Content pool exhausted")]
    PoolExhausted,

    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Unexpected failure: {0}")]
    Unknown(String),
}

impl From<reqwest::Error> for CampaignError {
    fn from(err: reqwest::Error) -> Self {
        CampaignError::Transport(err.to_string())
    }
}
