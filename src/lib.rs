//! Campaign Bot
//!
//! Autonomous scheduled-posting engine: posts one randomly drawn,
//! never-repeated message (with optional media) at a weekly scheduled
//! instant, and stops itself after a configured number of elapsed days.

pub mod error;
pub mod keepalive;
pub mod lifecycle;
pub mod pool;
pub mod publisher;
pub mod scheduler;
pub mod web;

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use error::CampaignError;
use lifecycle::{LifecycleController, StopConfig};
use pool::{ContentItem, ContentPool};
use publisher::{HttpPublisher, PublisherConfig, PublishingService};
use scheduler::{CampaignSchedule, ScheduleConfig};

/// Application configuration
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// Weekly posting schedule
    pub schedule: ScheduleConfig,
    /// Absolute campaign stop instant (interpreted in the schedule timezone)
    pub stop: StopConfig,
    /// Candidate messages for this campaign
    pub messages: Vec<ContentItem>,
    /// Publishing platform endpoints and credentials
    pub publisher: PublisherConfig,
    /// Liveness URL pinged every 5 minutes
    pub keepalive_url: String,
    /// Port for the local liveness server
    #[serde(default = "default_web_port")]
    pub web_port: u16,
}

fn default_web_port() -> u16 {
    8080
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            schedule: ScheduleConfig::default(),
            stop: StopConfig {
                year: 2026,
                month: 12,
                day: 31,
                hour: 23,
                minute: 59,
            },
            messages: vec![
                ContentItem::with_media("New release is out now 🔥", "image.png"),
                ContentItem::with_media("Have you heard this yet?", "image.png"),
            ],
            publisher: PublisherConfig::default(),
            keepalive_url: "http://localhost:8080/".to_string(),
            web_port: default_web_port(),
        }
    }
}

/// Get log directory path (shared across modules)
pub fn log_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("campaign-bot").join("logs"))
}

impl AppConfig {
    /// Get config file path
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("campaign-bot").join("config.json"))
    }

    /// Load config from file, then apply environment overrides.
    ///
    /// `CAMPAIGN_BOT_TOKEN` overrides the publisher bearer token so the
    /// credential never has to live in the config file.
    pub fn load() -> Self {
        let mut config = Self::load_file();

        if let Ok(token) = std::env::var("CAMPAIGN_BOT_TOKEN") {
            if !token.is_empty() {
                config.publisher.bearer_token = token;
            }
        }
        if let Ok(port) = std::env::var("CAMPAIGN_BOT_WEB_PORT") {
            if let Ok(port) = port.parse() {
                config.web_port = port;
            }
        }

        config
    }

    fn load_file() -> Self {
        if let Some(path) = Self::config_path() {
            if path.exists() {
                match std::fs::read_to_string(&path) {
                    Ok(content) => match serde_json::from_str(&content) {
                        Ok(config) => {
                            info!("Loaded config from {:?}", path);
                            return config;
                        }
                        Err(e) => {
                            warn!("Failed to parse config file: {}", e);
                        }
                    },
                    Err(e) => {
                        warn!("Failed to read config file: {}", e);
                    }
                }
            }
        }
        Self::default()
    }
}

/// Application state shared across the app.
///
/// The composition root: owns the content pool, the publishing service and
/// the lifecycle controller, and hands shared handles to the clock and the
/// web layer.
pub struct AppState {
    /// Content pool, mutated only by the publish job's draw
    pub pool: Arc<tokio::sync::Mutex<ContentPool>>,
    /// Publishing service injected into the publish job
    pub publisher: Arc<dyn PublishingService>,
    /// Lifecycle controller; exclusive owner of the campaign state
    pub lifecycle: Arc<LifecycleController>,
    /// Validated weekly schedule
    pub schedule: CampaignSchedule,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Validate the configuration and build the application state.
    ///
    /// Any configuration error is fatal: nothing is spawned and the process
    /// must not start.
    pub fn new(config: AppConfig) -> Result<Self, CampaignError> {
        let schedule = CampaignSchedule::from_config(&config.schedule)?;
        let stop_at = config.stop.resolve(schedule.timezone())?;
        let lifecycle = Arc::new(LifecycleController::new(stop_at, chrono::Utc::now()));

        let pool = Arc::new(tokio::sync::Mutex::new(ContentPool::new(
            config.messages.clone(),
        )));
        let publisher: Arc<dyn PublishingService> =
            Arc::new(HttpPublisher::new(config.publisher.clone()));

        Ok(Self {
            pool,
            publisher,
            lifecycle,
            schedule,
            config,
        })
    }
}

/// Initialize logging: console layer plus a daily-rolling file layer when a
/// log directory is available.
pub fn init_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false);

    if let Some(log_dir) = log_dir() {
        let _ = std::fs::create_dir_all(&log_dir);
        let file_appender = tracing_appender::rolling::daily(&log_dir, "campaign-bot.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(true)
            .with_writer(non_blocking);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .with(file_layer)
            .init();

        Some(guard)
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .init();

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let state = AppState::new(AppConfig::default());
        assert!(state.is_ok());
    }

    #[test]
    fn invalid_schedule_rejects_startup() {
        let config = AppConfig {
            schedule: ScheduleConfig {
                weekday: 9,
                start_time: "14:30".to_string(),
                timezone: "America/Chicago".to_string(),
            },
            ..Default::default()
        };
        assert!(matches!(
            AppState::new(config),
            Err(CampaignError::Config(_))
        ));
    }

    #[test]
    fn invalid_stop_date_rejects_startup() {
        let config = AppConfig {
            stop: StopConfig {
                year: 2026,
                month: 13,
                day: 1,
                hour: 0,
                minute: 0,
            },
            ..Default::default()
        };
        assert!(matches!(
            AppState::new(config),
            Err(CampaignError::Config(_))
        ));
    }

    #[test]
    fn config_roundtrips_through_json() {
        let config = AppConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.schedule.start_time, config.schedule.start_time);
        assert_eq!(parsed.messages, config.messages);
    }
}
