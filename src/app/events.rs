//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) and the
//! [`ModeArbiter`](crate::control::arbiter::ModeArbiter) emit these through
//! the [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log to serial, append to the black-box
//! log, etc.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::control::arbiter::Mode;
use crate::sensors::fabric::FabricKind;

/// Coarse event class, used as the black-box log tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventCategory {
    Boot,
    Net,
    Alert,
    Auto,
    Sys,
}

impl EventCategory {
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Boot => "BOOT",
            Self::Net => "NET",
            Self::Alert => "ALRT",
            Self::Auto => "AUTO",
            Self::Sys => "SYS",
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppEvent {
    /// The service has started.
    Boot,

    /// Online/offline edge.  Emitted exactly once per edge.
    ConnectivityChanged { online: bool },

    /// The safety policy began overriding the decision.
    SafetyTrip { mode: Mode, temperature_c: f32 },

    /// A remote relay command was applied and recorded as a training example.
    RemoteRelay { on: bool, samples: usize },

    /// Someone asked for the black-box log to be dumped.
    LogDumpRequested,

    /// Someone asked for the black-box log to be erased.
    LogClearRequested,
}

impl AppEvent {
    pub const fn category(&self) -> EventCategory {
        match self {
            Self::Boot => EventCategory::Boot,
            Self::ConnectivityChanged { .. } => EventCategory::Net,
            Self::SafetyTrip { .. } => EventCategory::Alert,
            Self::RemoteRelay { .. } => EventCategory::Auto,
            Self::LogDumpRequested | Self::LogClearRequested => EventCategory::Sys,
        }
    }
}

/// Human-readable message body (without the category tag).
impl fmt::Display for AppEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boot => f.write_str("system start"),
            Self::ConnectivityChanged { online: true } => f.write_str("online, cloud in control"),
            Self::ConnectivityChanged { online: false } => f.write_str("offline, local AI"),
            Self::SafetyTrip {
                mode,
                temperature_c,
            } => write!(f, "overheat {:.1}C, heater cut ({})", temperature_c, mode),
            Self::RemoteRelay { on, samples } => write!(
                f,
                "cloud relay {}, learned ({} samples)",
                if *on { "ON" } else { "OFF" },
                samples
            ),
            Self::LogDumpRequested => f.write_str("log dump requested"),
            Self::LogClearRequested => f.write_str("log clear requested"),
        }
    }
}

/// A point-in-time telemetry snapshot, serialised as flat JSON.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TelemetryData {
    pub temperature: f32,
    pub humidity: f32,
    pub fabric_detected: bool,
    pub fabric_type: FabricKind,
    pub status: &'static str,
}
