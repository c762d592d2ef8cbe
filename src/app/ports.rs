//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (sensors, actuators, connectivity, event sinks, storage)
//! implement these traits.  The [`AppService`](super::service::AppService)
//! consumes them via generics, so the domain core never touches hardware
//! directly.
//!
//! None of these calls may block for long: the control loop is
//! single-threaded and cooperative.

use crate::config::SystemConfig;
use crate::control::Decision;
use crate::control::context::Observation;
use crate::error::CommsError;
use crate::sensors::fabric::FabricKind;

use super::commands::RemoteCommand;
use super::events::{AppEvent, TelemetryData};

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port.  Failed climate reads return the `-1.0` sentinel
/// ([`UNREADABLE`](crate::control::context::UNREADABLE)) rather than an error.
pub trait SensorPort {
    /// Soleplate temperature (°C).
    fn read_temperature(&mut self) -> f32;

    /// Relative humidity (%).
    fn read_humidity(&mut self) -> f32;

    /// Whether something is under the iron.
    fn is_object_present(&mut self) -> bool;

    /// Fabric class from the last reflectance reading.
    fn fabric_kind(&mut self) -> FabricKind;

    /// One snapshot for the control cycle.
    fn read_observation(&mut self) -> Observation {
        Observation::new(
            self.read_temperature(),
            self.read_humidity(),
            self.is_object_present(),
        )
    }
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port.
pub trait ActuatorPort {
    /// Drive relay, buzzer and indicator to the full decision.
    /// Outputs are never driven individually.
    fn apply(&mut self, decision: &Decision);

    /// Render a two-line status frame.
    fn show_status(&mut self, top: &str, bottom: &str);

    /// Relay, buzzer and indicator off.
    fn all_off(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Connectivity port (driven adapter: domain ↔ WiFi + MQTT)
// ───────────────────────────────────────────────────────────────

/// The network link as the control loop sees it.
pub trait ConnectivityPort {
    /// Drive reconnects and the session's housekeeping.  Called once per
    /// cycle; must return promptly whether or not anything is up.
    fn poll(&mut self);

    /// WiFi associated.
    fn link_up(&self) -> bool;

    /// MQTT session established.
    fn session_up(&self) -> bool;

    /// Take the latest remote command, if one arrived since the last call.
    fn take_command(&mut self) -> Option<RemoteCommand>;

    /// Publish one telemetry record.
    fn publish_telemetry(&mut self, data: &TelemetryData) -> Result<(), CommsError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`]s through this port.
pub trait EventSink {
    fn emit(&mut self, event: &AppEvent);
}

/// Fan-out: both sinks see every event, left first.
impl<A: EventSink, B: EventSink> EventSink for (A, B) {
    fn emit(&mut self, event: &AppEvent) {
        self.0.emit(event);
        self.1.emit(event);
    }
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate config values before persisting.
/// Invalid ranges are rejected with [`ConfigError::ValidationFailed`],
/// not silently clamped; a safe temperature of `f32::MAX` would disable
/// the overheat trip.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`SystemConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage for config and the black-box log.
///
/// Write operations MUST be atomic.  The ESP-IDF NVS API guarantees this
/// natively; the in-memory simulation achieves it trivially.
pub trait StoragePort {
    /// Read a value.  Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key.  Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Underlying storage is full.
    StorageFull,
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage partition is full.
    Full,
    /// Caller's buffer is smaller than the stored value.
    BufferTooSmall,
    /// Generic I/O error.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::StorageFull => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::BufferTooSmall => write!(f, "buffer too small"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl From<StorageError> for ConfigError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound => Self::NotFound,
            StorageError::Full => Self::StorageFull,
            StorageError::BufferTooSmall => Self::Corrupted,
            StorageError::IoError => Self::IoError,
        }
    }
}
