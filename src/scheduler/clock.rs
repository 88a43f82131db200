//! Campaign clock
//!
//! Evaluates the weekly schedule on a short tick interval and dispatches the
//! publish job when the current minute matches. Equivalent to a
//! `minute hour * * weekday` cron expression evaluated in the configured
//! IANA timezone.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Datelike, NaiveTime, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use tracing::{debug, info};

use crate::error::CampaignError;
use crate::publisher::PublishJob;

/// How often the clock re-evaluates the schedule. Well under a minute so a
/// matching instant is never skipped.
const TICK_INTERVAL: Duration = Duration::from_secs(15);

/// Raw schedule configuration as it appears in the config file
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleConfig {
    /// Day of the week to post (0 = Sunday .. 6 = Saturday)
    pub weekday: u8,
    /// Start time (HH:MM format, 24-hour clock)
    pub start_time: String,
    /// IANA timezone name, e.g. "America/Chicago"
    pub timezone: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            weekday: 3, // Wednesday
            start_time: "20:21".to_string(),
            timezone: "America/Chicago".to_string(),
        }
    }
}

/// Validated weekly schedule: one (weekday, hour, minute) instant per week,
/// evaluated in `tz`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignSchedule {
    weekday: Weekday,
    hour: u32,
    minute: u32,
    tz: Tz,
}

impl CampaignSchedule {
    /// Validate a raw config into a schedule.
    ///
    /// Out-of-range weekday, a malformed start time, or an unknown timezone
    /// are fatal configuration errors.
    pub fn from_config(config: &ScheduleConfig) -> Result<Self, CampaignError> {
        let weekday = match config.weekday {
            0 => Weekday::Sun,
            1 => Weekday::Mon,
            2 => Weekday::Tue,
            3 => Weekday::Wed,
            4 => Weekday::Thu,
            5 => Weekday::Fri,
            6 => Weekday::Sat,
            other => {
                return Err(CampaignError::Config(format!(
                    "weekday must be 0-6 (0 = Sunday), got {}",
                    other
                )))
            }
        };

        let time = NaiveTime::parse_from_str(&config.start_time, "%H:%M").map_err(|_| {
            CampaignError::Config(format!(
                "start time must be HH:MM (24-hour), got '{}'",
                config.start_time
            ))
        })?;

        let tz: Tz = config.timezone.parse().map_err(|_| {
            CampaignError::Config(format!(
                "unknown timezone '{}' - use IANA names like 'America/Chicago'",
                config.timezone
            ))
        })?;

        Ok(Self {
            weekday,
            hour: time.hour(),
            minute: time.minute(),
            tz,
        })
    }

    /// Timezone the schedule is evaluated in
    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Check whether `now` falls on the scheduled (weekday, hour, minute) in
    /// the schedule's timezone.
    pub fn matches(&self, now: DateTime<Utc>) -> bool {
        let local = now.with_timezone(&self.tz);
        local.weekday() == self.weekday
            && local.hour() == self.hour
            && local.minute() == self.minute
    }

    /// Local calendar-minute key used to suppress double fires
    fn minute_key(&self, now: DateTime<Utc>) -> String {
        now.with_timezone(&self.tz).format("%Y-%m-%d %H:%M").to_string()
    }
}

/// Clock that drives the publish job while the campaign is running.
///
/// The running flag is owned by the lifecycle controller; the clock only
/// reads it, immediately before each fire. Once it goes false the clock
/// disarms itself.
pub struct CampaignClock {
    schedule: CampaignSchedule,
    running: Arc<AtomicBool>,
    last_fired: Option<String>,
}

impl CampaignClock {
    /// Create a clock gated on the campaign's running flag
    pub fn new(schedule: CampaignSchedule, running: Arc<AtomicBool>) -> Self {
        Self {
            schedule,
            running,
            last_fired: None,
        }
    }

    /// Decide whether this instant should fire.
    ///
    /// Returns true at most once per matching calendar minute, and only
    /// while the running flag holds; once the campaign stops, matching
    /// instants are suppressed silently.
    pub fn should_fire(&mut self, now: DateTime<Utc>) -> bool {
        if !self.schedule.matches(now) {
            return false;
        }

        let key = self.schedule.minute_key(now);
        if self.last_fired.as_deref() == Some(key.as_str()) {
            return false; // already fired within this calendar minute
        }

        // Checked immediately before the fire: a stop between ticks must
        // suppress the dispatch.
        if !self.running.load(Ordering::Relaxed) {
            debug!("Schedule matched but campaign is stopped - fire suppressed");
            return false;
        }

        self.last_fired = Some(key);
        true
    }

    /// Start the clock loop.
    ///
    /// Each fire dispatches the job on its own task so a slow upload or post
    /// never delays the next schedule evaluation or the lifecycle timer.
    pub fn start(mut self, job: Arc<PublishJob>) -> tokio::task::JoinHandle<()> {
        info!(
            "Campaign clock armed: {:?} {:02}:{:02} ({})",
            self.schedule.weekday, self.schedule.hour, self.schedule.minute, self.schedule.tz
        );

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(TICK_INTERVAL);

            while self.running.load(Ordering::Relaxed) {
                ticker.tick().await;

                let now = Utc::now();
                if !self.should_fire(now) {
                    continue;
                }

                info!("Schedule matched at {} - dispatching publish job", now);
                let job = job.clone();
                tokio::spawn(async move {
                    let _ = job.run().await;
                });
            }

            info!("Campaign clock disarmed");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn schedule(weekday: u8, start_time: &str, tz: &str) -> CampaignSchedule {
        CampaignSchedule::from_config(&ScheduleConfig {
            weekday,
            start_time: start_time.to_string(),
            timezone: tz.to_string(),
        })
        .unwrap()
    }

    #[test]
    fn valid_config_parses() {
        let s = schedule(3, "20:21", "America/Chicago");
        assert_eq!(s.hour, 20);
        assert_eq!(s.minute, 21);
        assert_eq!(s.weekday, Weekday::Wed);
    }

    #[test]
    fn invalid_weekday_is_config_error() {
        let result = CampaignSchedule::from_config(&ScheduleConfig {
            weekday: 7,
            start_time: "10:00".to_string(),
            timezone: "UTC".to_string(),
        });
        assert!(matches!(result, Err(CampaignError::Config(_))));
    }

    #[test]
    fn invalid_start_time_is_config_error() {
        for bad in ["25:00", "10:61", "noon", "10", ""] {
            let result = CampaignSchedule::from_config(&ScheduleConfig {
                weekday: 0,
                start_time: bad.to_string(),
                timezone: "UTC".to_string(),
            });
            assert!(matches!(result, Err(CampaignError::Config(_))), "accepted '{}'", bad);
        }
    }

    #[test]
    fn unknown_timezone_is_config_error() {
        let result = CampaignSchedule::from_config(&ScheduleConfig {
            weekday: 0,
            start_time: "10:00".to_string(),
            timezone: "Mars/Olympus_Mons".to_string(),
        });
        assert!(matches!(result, Err(CampaignError::Config(_))));
    }

    #[test]
    fn matches_in_configured_timezone() {
        // Wednesday 2023-11-01 20:21 in Chicago is 2023-11-02 01:21 UTC
        // (CDT, UTC-5).
        let s = schedule(3, "20:21", "America/Chicago");
        let utc = Utc.with_ymd_and_hms(2023, 11, 2, 1, 21, 0).unwrap();
        assert!(s.matches(utc));

        // One minute later no longer matches.
        let utc = Utc.with_ymd_and_hms(2023, 11, 2, 1, 22, 0).unwrap();
        assert!(!s.matches(utc));

        // 20:21 UTC is 15:21 in Chicago - the schedule is evaluated in the
        // configured timezone, not in UTC.
        let utc = Utc.with_ymd_and_hms(2023, 11, 1, 20, 21, 0).unwrap();
        assert!(!s.matches(utc));
    }

    #[test]
    fn fires_once_per_calendar_minute() {
        let s = schedule(3, "20:21", "UTC");
        let running = Arc::new(AtomicBool::new(true));
        let mut clock = CampaignClock::new(s, running);

        // 2023-11-01 is a Wednesday.
        let t0 = Utc.with_ymd_and_hms(2023, 11, 1, 20, 21, 2).unwrap();
        let t1 = Utc.with_ymd_and_hms(2023, 11, 1, 20, 21, 40).unwrap();
        assert!(clock.should_fire(t0));
        assert!(!clock.should_fire(t1), "double fire within the same minute");

        // The following week's matching minute fires again.
        let next_week = Utc.with_ymd_and_hms(2023, 11, 8, 20, 21, 0).unwrap();
        assert!(clock.should_fire(next_week));
    }

    #[test]
    fn stopped_campaign_suppresses_matching_minutes() {
        let s = schedule(3, "20:21", "UTC");
        let running = Arc::new(AtomicBool::new(true));
        let mut clock = CampaignClock::new(s, running.clone());

        let week1 = Utc.with_ymd_and_hms(2023, 11, 1, 20, 21, 0).unwrap();
        assert!(clock.should_fire(week1));

        // Campaign stops: the clock is disarmed and every later matching
        // minute is suppressed.
        running.store(false, Ordering::Relaxed);
        let week2 = Utc.with_ymd_and_hms(2023, 11, 8, 20, 21, 0).unwrap();
        let week3 = Utc.with_ymd_and_hms(2023, 11, 15, 20, 21, 0).unwrap();
        assert!(!clock.should_fire(week2));
        assert!(!clock.should_fire(week3));
    }

    #[test]
    fn never_started_campaign_never_fires() {
        let s = schedule(3, "20:21", "UTC");
        let running = Arc::new(AtomicBool::new(false));
        let mut clock = CampaignClock::new(s, running);

        let matching = Utc.with_ymd_and_hms(2023, 11, 1, 20, 21, 0).unwrap();
        assert!(!clock.should_fire(matching));
    }

    #[test]
    fn non_matching_instants_never_fire() {
        let s = schedule(3, "20:21", "UTC");
        let running = Arc::new(AtomicBool::new(true));
        let mut clock = CampaignClock::new(s, running);

        let tuesday = Utc.with_ymd_and_hms(2023, 10, 31, 20, 21, 0).unwrap();
        let wrong_minute = Utc.with_ymd_and_hms(2023, 11, 1, 20, 22, 0).unwrap();
        assert!(!clock.should_fire(tuesday));
        assert!(!clock.should_fire(wrong_minute));
    }
}
