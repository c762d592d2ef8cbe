//! Per-cycle context handed to the control engine.
//!
//! `CycleContext` is built fresh by the application layer at the start of
//! every cycle and passed by reference to each component call.  Nothing
//! in the engine reads sensors or connectivity any other way, so a cycle
//! can be replayed in a test from a single value.

use serde::{Deserialize, Serialize};

use crate::app::commands::RemoteCommand;

/// Sentinel for a reading the sensor could not produce.
pub const UNREADABLE: f32 = -1.0;

// ---------------------------------------------------------------------------
// Observation
// ---------------------------------------------------------------------------

/// A point-in-time snapshot of the sensors the engine cares about.
///
/// Unreadable values carry [`UNREADABLE`] and flow through the arithmetic
/// like any other number.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Observation {
    /// Soleplate temperature (°C).
    pub temperature_c: f32,
    /// Relative humidity (%).
    pub humidity_pct: f32,
    /// Something is under the iron.
    pub object_present: bool,
}

impl Observation {
    pub const fn new(temperature_c: f32, humidity_pct: f32, object_present: bool) -> Self {
        Self {
            temperature_c,
            humidity_pct,
            object_present,
        }
    }

    /// True if either climate reading is the unreadable sentinel.
    #[allow(clippy::float_cmp)]
    pub fn is_degraded(&self) -> bool {
        self.temperature_c == UNREADABLE || self.humidity_pct == UNREADABLE
    }
}

// ---------------------------------------------------------------------------
// Connectivity
// ---------------------------------------------------------------------------

/// The two independent signals that make up "online".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConnectivityState {
    /// WiFi associated and has an IP.
    pub link_up: bool,
    /// MQTT session established.
    pub session_up: bool,
}

impl ConnectivityState {
    pub const fn new(link_up: bool, session_up: bool) -> Self {
        Self { link_up, session_up }
    }

    /// Online iff both the link and the session are up.
    pub const fn is_online(&self) -> bool {
        self.link_up && self.session_up
    }
}

// ---------------------------------------------------------------------------
// CycleContext
// ---------------------------------------------------------------------------

/// Everything one control cycle is allowed to see.
#[derive(Debug, Clone, Default)]
pub struct CycleContext {
    pub observation: Observation,
    pub connectivity: ConnectivityState,
    /// Remote command deposited since the previous cycle, if any.
    pub command: Option<RemoteCommand>,
}

impl CycleContext {
    pub fn new(observation: Observation, connectivity: ConnectivityState) -> Self {
        Self {
            observation,
            connectivity,
            command: None,
        }
    }

    /// Attach the pending remote command.
    #[must_use]
    pub fn with_command(mut self, command: Option<RemoteCommand>) -> Self {
        self.command = command;
        self
    }
}
