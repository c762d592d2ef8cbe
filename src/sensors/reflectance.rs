//! Reflective IR object sensor.
//!
//! A single analog reading answers two questions: is something under the
//! soleplate (`raw < threshold`), and what is it ([`FabricKind`]).
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads ADC1_CH6 via the oneshot API (initialised by hw_init).
//! On host/test: reads from a static `AtomicU16` for injection.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU16, Ordering};

use log::warn;

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;
#[cfg(target_os = "espidf")]
use crate::pins;

use super::fabric::FabricKind;
use crate::error::SensorError;

/// Full scale: what an empty soleplate reads, and what a failed
/// conversion is taken as.
pub const NO_OBJECT_RAW: u16 = 4095;

/// Nothing in front of the sensor reads near full scale.
#[cfg(not(target_os = "espidf"))]
static SIM_IR_ADC: AtomicU16 = AtomicU16::new(NO_OBJECT_RAW);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_ir_adc(raw: u16) {
    SIM_IR_ADC.store(raw, Ordering::Relaxed);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReflectanceReading {
    pub raw: u16,
    pub object_present: bool,
    pub fabric: FabricKind,
}

pub struct ReflectanceSensor {
    presence_threshold: u16,
    last: Option<ReflectanceReading>,
    failures: u32,
}

impl ReflectanceSensor {
    pub fn new(presence_threshold: u16) -> Self {
        Self {
            presence_threshold,
            last: None,
            failures: 0,
        }
    }

    pub fn read(&mut self) -> ReflectanceReading {
        let result = self.read_adc();
        let raw = self.settle(result);
        let reading = self.interpret(raw);
        self.last = Some(reading);
        reading
    }

    /// Last reading taken, without touching the ADC.
    pub fn last(&self) -> Option<ReflectanceReading> {
        self.last
    }

    /// Consecutive failed conversions.
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// A failed conversion reads as "nothing present" so it can never
    /// enable the heater.
    fn settle(&mut self, result: Result<u16, SensorError>) -> u16 {
        match result {
            Ok(raw) => {
                self.failures = 0;
                raw
            }
            Err(e) => {
                self.failures = self.failures.saturating_add(1);
                warn!("IR ADC read failed ({}), {} in a row", e, self.failures);
                NO_OBJECT_RAW
            }
        }
    }

    fn interpret(&self, raw: u16) -> ReflectanceReading {
        ReflectanceReading {
            raw,
            object_present: raw < self.presence_threshold,
            fabric: FabricKind::classify(raw, self.presence_threshold),
        }
    }

    #[cfg(target_os = "espidf")]
    fn read_adc(&self) -> Result<u16, SensorError> {
        hw_init::adc1_read(pins::IR_ADC_CHANNEL)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_adc(&self) -> Result<u16, SensorError> {
        Ok(SIM_IR_ADC.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presence_is_strictly_below_threshold() {
        let s = ReflectanceSensor::new(3500);
        assert!(s.interpret(3499).object_present);
        assert!(!s.interpret(3500).object_present);
    }

    #[test]
    fn fabric_follows_raw() {
        let s = ReflectanceSensor::new(3500);
        assert_eq!(s.interpret(500).fabric, FabricKind::Cotton);
        assert_eq!(s.interpret(4000).fabric, FabricKind::Unknown);
    }

    #[test]
    fn fabric_and_presence_share_the_threshold() {
        let low = ReflectanceSensor::new(3000);
        let r = low.interpret(3200);
        assert!(!r.object_present);
        assert_eq!(r.fabric, FabricKind::Unknown);

        let high = ReflectanceSensor::new(4000);
        let r = high.interpret(3800);
        assert!(r.object_present);
        assert_eq!(r.fabric, FabricKind::Wool);
    }

    #[test]
    fn failed_conversion_reads_as_absent() {
        let mut s = ReflectanceSensor::new(3500);
        let raw = s.settle(Err(SensorError::AdcReadFailed));
        assert_eq!(raw, NO_OBJECT_RAW);
        assert!(!s.interpret(raw).object_present);
        assert_eq!(s.failures(), 1);

        s.settle(Err(SensorError::AdcReadFailed));
        assert_eq!(s.failures(), 2);
        assert_eq!(s.settle(Ok(1200)), 1200);
        assert_eq!(s.failures(), 0);
    }

    #[test]
    fn fresh_sensor_has_no_last_reading() {
        assert!(ReflectanceSensor::new(3500).last().is_none());
    }
}
