//! Unified error types for the SmartIron firmware.
//!
//! The adaptive control core itself has no failure paths (sentinels stand
//! in for failed reads).  Everything around it (sensor drivers, the
//! network link, remote command decoding) funnels
//! into this single `Error` enum so the outer loop handles errors
//! uniformly.  All variants are `Copy`.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation outside the core funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sensor could not be read.
    Sensor(SensorError),
    /// A communication subsystem failed.
    Comms(CommsError),
    /// A remote command payload could not be decoded.
    Command(CommandError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Comms(e) => write!(f, "comms: {e}"),
            Self::Command(e) => write!(f, "command: {e}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The DHT line never answered the start pulse.
    NoResponse,
    /// A bit window timed out mid-frame.
    Timeout,
    /// Frame checksum did not match.
    Checksum,
    /// ADC read returned an error.
    AdcReadFailed,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoResponse => write!(f, "no response"),
            Self::Timeout => write!(f, "bit timeout"),
            Self::Checksum => write!(f, "checksum mismatch"),
            Self::AdcReadFailed => write!(f, "ADC read failed"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Communications errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommsError {
    WifiConnectFailed,
    NotConnected,
    MqttPublishFailed,
    PayloadTooLarge,
}

impl fmt::Display for CommsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WifiConnectFailed => write!(f, "WiFi connect failed"),
            Self::NotConnected => write!(f, "session not connected"),
            Self::MqttPublishFailed => write!(f, "MQTT publish failed"),
            Self::PayloadTooLarge => write!(f, "payload too large"),
        }
    }
}

impl From<CommsError> for Error {
    fn from(e: CommsError) -> Self {
        Self::Comms(e)
    }
}

// ---------------------------------------------------------------------------
// Remote command errors
// ---------------------------------------------------------------------------

/// Decoding failures for remote command payloads.  An unknown method name
/// is *not* an error; it decodes to `RemoteCommand::Unrecognized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// Payload is not a JSON object with a `method` string.
    Malformed,
    /// Method is known but `params` has the wrong shape.
    InvalidParams,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => write!(f, "malformed payload"),
            Self::InvalidParams => write!(f, "invalid params"),
        }
    }
}

impl From<CommandError> for Error {
    fn from(e: CommandError) -> Self {
        Self::Command(e)
    }
}
