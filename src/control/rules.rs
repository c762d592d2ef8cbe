//! Deterministic rule-based decider.
//!
//! The fallback the engine reaches for while the predictor has nothing
//! to learn from.  A pure function of the observation and one threshold.

use crate::config::SystemConfig;

use super::context::Observation;
use super::{
    Decision, STATUS_COOLDOWN_REQUIRED, STATUS_HEATING_SAFE, STATUS_NO_OBJECT,
    STATUS_OVERHEAT_ALERT,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleBasedDecider {
    safe_temperature_c: f32,
}

impl RuleBasedDecider {
    pub const fn new(safe_temperature_c: f32) -> Self {
        Self { safe_temperature_c }
    }

    pub fn from_config(config: &SystemConfig) -> Self {
        Self::new(config.safe_temperature_c)
    }

    pub fn decide(&self, obs: &Observation) -> Decision {
        if !obs.object_present {
            // An empty soleplate does not excuse an overheat already under way.
            if obs.temperature_c > self.safe_temperature_c {
                return Decision {
                    alarm: true,
                    ..Decision::off(STATUS_COOLDOWN_REQUIRED)
                };
            }
            return Decision::off(STATUS_NO_OBJECT);
        }

        if obs.temperature_c < self.safe_temperature_c {
            Decision {
                relay: true,
                alarm: false,
                indicator: true,
                status: STATUS_HEATING_SAFE,
            }
        } else {
            Decision {
                alarm: true,
                ..Decision::off(STATUS_OVERHEAT_ALERT)
            }
        }
    }
}

impl Default for RuleBasedDecider {
    fn default() -> Self {
        Self::from_config(&SystemConfig::default())
    }
}
