//! Campaign lifecycle controller
//!
//! Counts elapsed wall-clock days while the campaign runs and performs a
//! single terminal Running -> Stopped transition when the configured window
//! elapses. The clock observes the shared running flag; it is never flipped
//! back to true.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::error::CampaignError;

/// Absolute campaign stop instant as it appears in the config file,
/// interpreted in the schedule's timezone.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopConfig {
    pub year: i32,
    /// 1 = January .. 12 = December
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
}

impl StopConfig {
    /// Resolve the stop instant in the given timezone.
    ///
    /// A date that does not exist (bad day-of-month, DST gap) is a fatal
    /// configuration error.
    pub fn resolve(&self, tz: Tz) -> Result<DateTime<Utc>, CampaignError> {
        match tz.with_ymd_and_hms(self.year, self.month, self.day, self.hour, self.minute, 0) {
            chrono::LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
            chrono::LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
            chrono::LocalResult::None => Err(CampaignError::Config(format!(
                "stop date {:04}-{:02}-{:02} {:02}:{:02} does not exist in {}",
                self.year, self.month, self.day, self.hour, self.minute, tz
            ))),
        }
    }
}

/// Campaign lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CampaignPhase {
    Created,
    Running,
    Stopped,
}

/// Observable campaign state
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignState {
    pub started_at: Option<DateTime<Utc>>,
    pub elapsed_days: u32,
    pub phase: CampaignPhase,
}

/// Controller that bounds the campaign's active lifetime.
///
/// `stop_after_days` is fixed at construction: the whole days between now and
/// the stop instant, floored, with a minimum of one full day.
pub struct LifecycleController {
    state: Arc<RwLock<CampaignState>>,
    running: Arc<AtomicBool>,
    stop_after_days: u32,
    day_period: Duration,
}

impl LifecycleController {
    /// Create a controller stopping `stop_at` relative to `now`.
    pub fn new(stop_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let whole_days = (stop_at - now).num_days();
        let stop_after_days = if whole_days <= 0 {
            warn!(
                "Stop date yields {} whole days - campaign will run for 1 day minimum",
                whole_days
            );
            1
        } else {
            whole_days as u32
        };

        Self {
            state: Arc::new(RwLock::new(CampaignState {
                started_at: None,
                elapsed_days: 0,
                phase: CampaignPhase::Created,
            })),
            running: Arc::new(AtomicBool::new(false)),
            stop_after_days,
            day_period: Duration::from_secs(86_400),
        }
    }

    /// Override the day-counter period (used by tests to compress time)
    pub fn with_day_period(mut self, period: Duration) -> Self {
        self.day_period = period;
        self
    }

    /// Number of elapsed days after which the campaign stops
    pub fn stop_after_days(&self) -> u32 {
        self.stop_after_days
    }

    /// Shared running flag, read by the clock before each fire
    pub fn running_handle(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }

    /// Whether the campaign is currently running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Snapshot of the current campaign state
    pub async fn state(&self) -> CampaignState {
        self.state.read().await.clone()
    }

    /// Transition Created -> Running and arm the day counter.
    ///
    /// Each elapsed day increments the counter; reaching the threshold stops
    /// the campaign and disarms the counter. There is no re-entry: calling
    /// `start` on a non-Created campaign is a no-op and arms nothing, so
    /// only ever one counter increments the elapsed days.
    pub async fn start(&self) -> Option<tokio::task::JoinHandle<()>> {
        {
            let mut state = self.state.write().await;
            if state.phase != CampaignPhase::Created {
                warn!("Campaign already started - ignoring start()");
                return None;
            }
            state.phase = CampaignPhase::Running;
            state.started_at = Some(Utc::now());
            self.running.store(true, Ordering::Relaxed);
            info!("Campaign started - stopping after {} elapsed days", self.stop_after_days);
        }

        let state = self.state.clone();
        let running = self.running.clone();
        let threshold = self.stop_after_days;
        let period = self.day_period;

        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await; // the first tick completes immediately

            while running.load(Ordering::Relaxed) {
                ticker.tick().await;

                if !running.load(Ordering::Relaxed) {
                    break;
                }

                let elapsed = {
                    let mut st = state.write().await;
                    st.elapsed_days += 1;
                    st.elapsed_days
                };
                info!("Campaign day {} of {}", elapsed, threshold);

                if elapsed >= threshold {
                    if transition_stopped(&state, &running).await {
                        info!("Campaign window elapsed - campaign stopped");
                    }
                    break; // disarm the counter
                }
            }
        }))
    }

    /// Explicit external stop. Terminal and idempotent.
    pub async fn stop(&self) {
        if transition_stopped(&self.state, &self.running).await {
            info!("Campaign stopped by external request");
        }
    }
}

/// Perform the terminal transition exactly once. Returns false if the
/// campaign was already stopped.
async fn transition_stopped(state: &RwLock<CampaignState>, running: &AtomicBool) -> bool {
    let mut st = state.write().await;
    if st.phase == CampaignPhase::Stopped {
        return false;
    }
    st.phase = CampaignPhase::Stopped;
    running.store(false, Ordering::Relaxed);
    true
}
