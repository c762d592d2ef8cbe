//! System configuration parameters
//!
//! All tunable parameters for the SmartIron controller.
//! Values can be overridden via NVS (non-volatile storage); every stored
//! config passes [`SystemConfig::validate`] before it is used or persisted.

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

/// Number of training examples the predictor remembers.
pub const SAMPLE_CAPACITY: usize = 20;

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Safety ---
    /// Temperature (Celsius) above which the heater is forced off and the
    /// alarm raised, regardless of who is in control.
    pub safe_temperature_c: f32,

    // --- Learning ---
    /// Neighbors consulted per prediction (k).
    pub neighbor_count: u8,
    /// Weight of the humidity difference relative to temperature.
    pub humidity_weight: f32,
    /// Distance assigned to examples whose object-presence flag differs.
    pub mismatch_distance: f32,
    /// Neighbors further than this are excluded from the vote.
    pub rejection_distance: f32,

    // --- Object detection ---
    /// IR ADC reading below which an object is considered present.
    pub ir_presence_threshold: u16,

    // --- Timing ---
    /// Control loop interval (milliseconds)
    pub control_loop_interval_ms: u32,
    /// Minimum interval between telemetry publishes (milliseconds)
    pub telemetry_interval_ms: u32,
    /// Minimum interval between WiFi reconnect attempts (milliseconds)
    pub reconnect_interval_ms: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Safety
            safe_temperature_c: 170.0,

            // Learning
            neighbor_count: 3,
            humidity_weight: 0.5,
            mismatch_distance: 99_999.0,
            rejection_distance: 5_000.0,

            // Object detection
            ir_presence_threshold: 3500,

            // Timing
            control_loop_interval_ms: 500,  // 2 Hz
            telemetry_interval_ms: 2000,    // 0.5 Hz
            reconnect_interval_ms: 5000,
        }
    }
}

impl SystemConfig {
    /// Range-check every field.  Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.safe_temperature_c.is_finite() || self.safe_temperature_c <= 0.0 {
            return Err(ConfigError::ValidationFailed(
                "safe_temperature_c must be finite and positive",
            ));
        }
        if self.neighbor_count == 0 || self.neighbor_count as usize > SAMPLE_CAPACITY {
            return Err(ConfigError::ValidationFailed(
                "neighbor_count must be within 1..=SAMPLE_CAPACITY",
            ));
        }
        if !self.humidity_weight.is_finite() || self.humidity_weight < 0.0 {
            return Err(ConfigError::ValidationFailed(
                "humidity_weight must be finite and non-negative",
            ));
        }
        if !(self.rejection_distance.is_finite() && self.mismatch_distance.is_finite()) {
            return Err(ConfigError::ValidationFailed("distances must be finite"));
        }
        if self.mismatch_distance <= self.rejection_distance {
            return Err(ConfigError::ValidationFailed(
                "mismatch_distance must exceed rejection_distance",
            ));
        }
        if self.ir_presence_threshold == 0 || self.ir_presence_threshold > 4095 {
            return Err(ConfigError::ValidationFailed(
                "ir_presence_threshold must be a 12-bit ADC value",
            ));
        }
        if self.control_loop_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "control_loop_interval_ms must be non-zero",
            ));
        }
        if self.telemetry_interval_ms < self.control_loop_interval_ms {
            return Err(ConfigError::ValidationFailed(
                "telemetry_interval_ms must not be shorter than the control loop",
            ));
        }
        Ok(())
    }

    /// Whole control cycles that make up one telemetry interval (at least 1).
    pub fn telemetry_interval_cycles(&self) -> u32 {
        self.telemetry_interval_ms
            .div_ceil(self.control_loop_interval_ms.max(1))
            .max(1)
    }
}

/// Credentials and endpoints for the cloud link.
///
/// Defaults come from build-time environment variables so secrets never
/// live in the source tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub wifi_ssid: heapless::String<32>,
    pub wifi_password: heapless::String<64>,
    /// MQTT broker URL, e.g. `mqtt://demo.thingsboard.io:1883`.
    pub broker_url: heapless::String<64>,
    /// Device access token (used as the MQTT username).
    pub access_token: heapless::String<32>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            wifi_ssid: bounded(option_env!("SMARTIRON_WIFI_SSID").unwrap_or("")),
            wifi_password: bounded(option_env!("SMARTIRON_WIFI_PASSWORD").unwrap_or("")),
            broker_url: bounded(
                option_env!("SMARTIRON_BROKER_URL").unwrap_or("mqtt://demo.thingsboard.io:1883"),
            ),
            access_token: bounded(option_env!("SMARTIRON_ACCESS_TOKEN").unwrap_or("")),
        }
    }
}

impl NetworkConfig {
    /// True when there is enough to attempt a WiFi join.
    pub fn has_credentials(&self) -> bool {
        !self.wifi_ssid.is_empty()
    }
}

/// Copy `s` into a fixed-capacity string, truncating on a char boundary.
fn bounded<const N: usize>(s: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}
