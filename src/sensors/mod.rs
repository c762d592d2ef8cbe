//! Sensor subsystem — individual drivers and the aggregating [`SensorHub`].
//!
//! The hub owns every sensor driver.  The climate sensor delivers
//! temperature and humidity in one frame, so the hub samples it once on
//! the temperature read and serves humidity from the same frame.

pub mod climate;
pub mod fabric;
pub mod reflectance;

use climate::{ClimateReading, ClimateSensor};
use fabric::FabricKind;
use reflectance::ReflectanceSensor;

/// Aggregates all sensor drivers.
pub struct SensorHub {
    pub climate: ClimateSensor,
    pub reflectance: ReflectanceSensor,
    frame: Option<ClimateReading>,
}

impl SensorHub {
    /// Construct a new hub.  Pass in pre-built drivers (built in main
    /// where peripheral ownership is established).
    pub fn new(climate: ClimateSensor, reflectance: ReflectanceSensor) -> Self {
        Self {
            climate,
            reflectance,
            frame: None,
        }
    }

    /// Start a new climate frame and return its temperature.
    pub fn temperature(&mut self) -> f32 {
        let reading = self.climate.sample();
        self.frame = Some(reading);
        reading.temperature_c
    }

    /// Humidity from the current frame, sampling one if none is open.
    pub fn humidity(&mut self) -> f32 {
        match self.frame.take() {
            Some(reading) => reading.humidity_pct,
            None => self.climate.sample().humidity_pct,
        }
    }

    pub fn object_present(&mut self) -> bool {
        self.reflectance.read().object_present
    }

    /// Fabric from the latest reflectance reading.
    pub fn fabric(&mut self) -> FabricKind {
        match self.reflectance.last() {
            Some(reading) => reading.fabric,
            None => self.reflectance.read().fabric,
        }
    }
}
