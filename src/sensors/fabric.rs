//! Fabric classification from the reflective IR reading.
//!
//! Darker, denser weaves reflect less.  The bands were fitted by hand on
//! the bench.  The last band runs up to the configured presence
//! threshold; anything at or above it means nothing is under the sensor.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Upper bounds (exclusive) of each band, in 12-bit ADC counts.
const COTTON_MAX: u16 = 1000;
const NYLON_MAX: u16 = 1800;
const SILK_MAX: u16 = 2500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FabricKind {
    Cotton,
    Nylon,
    Silk,
    Wool,
    #[default]
    Unknown,
}

impl FabricKind {
    /// Wool covers everything from the silk band up to
    /// `presence_threshold`, so a reading with no object is never a fabric.
    pub const fn classify(raw: u16, presence_threshold: u16) -> Self {
        match raw {
            r if r >= presence_threshold => Self::Unknown,
            r if r < COTTON_MAX => Self::Cotton,
            r if r < NYLON_MAX => Self::Nylon,
            r if r < SILK_MAX => Self::Silk,
            _ => Self::Wool,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Cotton => "Cotton",
            Self::Nylon => "Nylon",
            Self::Silk => "Silk",
            Self::Wool => "Wool",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for FabricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
