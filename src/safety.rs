//! Safety policy.
//!
//! The policy runs **every cycle, after every decision source**: remote
//! pass-through, rules, and prediction alike.  It is a pure transform on
//! the cycle's [`Decision`]; nothing upstream can opt out of it.
//!
//! ## Trip rule
//!
//! `temperature > safe_temperature_c` forces the relay and indicator off
//! and the alarm on.  An unreadable sensor (−1.0) never trips; a garbage
//! reading that looks hot does, and that conservative bias is accepted.
//!
//! Applying the policy to its own output changes nothing.

use crate::config::SystemConfig;
use crate::control::context::Observation;
use crate::control::{Decision, STATUS_SAFETY_TRIP};

/// Over-temperature override.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SafetyPolicy {
    safe_temperature_c: f32,
}

impl SafetyPolicy {
    pub const fn new(safe_temperature_c: f32) -> Self {
        Self { safe_temperature_c }
    }

    pub fn from_config(config: &SystemConfig) -> Self {
        Self::new(config.safe_temperature_c)
    }

    /// True if this observation must trip the heater.
    pub fn is_tripped(&self, obs: &Observation) -> bool {
        obs.temperature_c > self.safe_temperature_c
    }

    /// Return `decision` with the trip rule applied.
    pub fn apply(&self, decision: Decision, obs: &Observation) -> Decision {
        if self.is_tripped(obs) {
            Decision {
                relay: false,
                alarm: true,
                indicator: false,
                status: STATUS_SAFETY_TRIP,
            }
        } else {
            decision
        }
    }

    pub fn safe_temperature_c(&self) -> f32 {
        self.safe_temperature_c
    }
}

impl Default for SafetyPolicy {
    fn default() -> Self {
        Self::from_config(&SystemConfig::default())
    }
}
