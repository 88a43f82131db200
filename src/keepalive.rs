//! Keep-alive probe
//!
//! Periodic outbound GET that keeps the hosting environment from idling the
//! process. Failures are logged only and never touch campaign state; the
//! probe outlives the campaign itself.

use std::time::Duration;

use tracing::{info, warn};

/// Default ping period: every 5 minutes
const PING_PERIOD: Duration = Duration::from_secs(300);

/// Periodic liveness ping to an external endpoint
pub struct KeepAliveProbe {
    url: String,
    period: Duration,
}

impl KeepAliveProbe {
    /// Create a probe for the given liveness URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            period: PING_PERIOD,
        }
    }

    /// Override the ping period
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Start pinging. The first ping is sent immediately.
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let client = reqwest::Client::new();
            let mut ticker = tokio::time::interval(self.period);

            loop {
                ticker.tick().await;
                match client.get(&self.url).send().await {
                    Ok(_) => info!("Ping sent to keep the bot alive"),
                    Err(e) => warn!("Error while sending keep-alive ping: {}", e),
                }
            }
        })
    }
}
