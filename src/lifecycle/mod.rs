//! Lifecycle module
//!
//! Owns the campaign running state and stops the campaign after the
//! configured number of elapsed days.

mod controller;

pub use controller::{CampaignPhase, CampaignState, LifecycleController, StopConfig};
