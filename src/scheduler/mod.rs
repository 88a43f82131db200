//! Scheduling module
//!
//! Fires the publish job at the configured weekly instant, evaluated in the
//! campaign's timezone.

mod clock;

pub use clock::{CampaignClock, CampaignSchedule, ScheduleConfig};
