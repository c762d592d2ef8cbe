//! Hardware adapter — bridges real peripherals to domain port traits.
//!
//! Owns the [`SensorHub`], the heater outputs and the status display,
//! exposing them through [`SensorPort`] and [`ActuatorPort`].  This is the
//! only module in the system that touches actual hardware.  On non-espidf
//! targets, the underlying drivers use cfg-gated simulation stubs.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::warn;

use crate::app::ports::{ActuatorPort, SensorPort};
use crate::control::Decision;
use crate::drivers::display::Lcd1602;
use crate::drivers::outputs::HeaterOutputs;
use crate::sensors::SensorHub;
use crate::sensors::fabric::FabricKind;

/// Concrete adapter that combines all hardware behind port traits.
///
/// The display is optional: a missing or failed LCD never stops the
/// heater control loop.
pub struct HardwareAdapter<I2C, D> {
    sensor_hub: SensorHub,
    outputs: HeaterOutputs,
    display: Option<Lcd1602<I2C, D>>,
    display_faults: u32,
}

impl<I2C: I2c, D: DelayNs> HardwareAdapter<I2C, D> {
    pub fn new(
        sensor_hub: SensorHub,
        outputs: HeaterOutputs,
        display: Option<Lcd1602<I2C, D>>,
    ) -> Self {
        Self {
            sensor_hub,
            outputs,
            display,
            display_faults: 0,
        }
    }

    /// Splash shown while the rest of the system comes up.
    pub fn show_boot_screen(&mut self) {
        self.show_status("System Init...", "Pls Wait");
    }

    /// Relay, buzzer and indicator levels.
    pub fn output_state(&self) -> (bool, bool, bool) {
        self.outputs.state()
    }

    pub fn display(&self) -> Option<&Lcd1602<I2C, D>> {
        self.display.as_ref()
    }

    pub fn display_faults(&self) -> u32 {
        self.display_faults
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<I2C: I2c, D: DelayNs> SensorPort for HardwareAdapter<I2C, D> {
    fn read_temperature(&mut self) -> f32 {
        self.sensor_hub.temperature()
    }

    fn read_humidity(&mut self) -> f32 {
        self.sensor_hub.humidity()
    }

    fn is_object_present(&mut self) -> bool {
        self.sensor_hub.object_present()
    }

    fn fabric_kind(&mut self) -> FabricKind {
        self.sensor_hub.fabric()
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<I2C: I2c, D: DelayNs> ActuatorPort for HardwareAdapter<I2C, D> {
    fn apply(&mut self, decision: &Decision) {
        self.outputs.apply(decision);
    }

    fn show_status(&mut self, top: &str, bottom: &str) {
        if let Some(lcd) = self.display.as_mut() {
            if let Err(e) = lcd.show(top, bottom) {
                // Only the first failure of a streak is worth a line.
                if self.display_faults == 0 {
                    warn!("Display write failed: {:?}", e);
                }
                self.display_faults = self.display_faults.saturating_add(1);
            } else {
                self.display_faults = 0;
            }
        }
    }

    fn all_off(&mut self) {
        self.outputs.all_off();
    }
}

#[cfg(test)]
mod tests {
    use core::convert::Infallible;

    use embedded_hal::i2c::{ErrorType, Operation};

    use super::*;
    use crate::control::STATUS_HEATING_SAFE;
    use crate::sensors::climate::{ClimateSensor, MIN_READ_INTERVAL_US};
    use crate::sensors::reflectance::ReflectanceSensor;

    struct NullBus;

    impl ErrorType for NullBus {
        type Error = Infallible;
    }

    impl I2c for NullBus {
        fn transaction(&mut self, _: u8, _: &mut [Operation<'_>]) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    fn hub() -> SensorHub {
        SensorHub::new(
            ClimateSensor::new(crate::pins::DHT_GPIO, MIN_READ_INTERVAL_US),
            ReflectanceSensor::new(3500),
        )
    }

    fn adapter(with_lcd: bool) -> HardwareAdapter<NullBus, NoDelay> {
        let lcd = with_lcd.then(|| Lcd1602::new(NullBus, NoDelay, 0x27).unwrap());
        HardwareAdapter::new(hub(), HeaterOutputs::new(), lcd)
    }

    #[test]
    fn decision_drives_all_outputs() {
        let mut hw = adapter(false);
        let d = Decision {
            relay: true,
            alarm: false,
            indicator: true,
            status: STATUS_HEATING_SAFE,
        };
        hw.apply(&d);
        assert_eq!(hw.output_state(), (true, false, true));
        hw.all_off();
        assert_eq!(hw.output_state(), (false, false, false));
    }

    #[test]
    fn boot_screen_reaches_display() {
        let mut hw = adapter(true);
        hw.show_boot_screen();
        let shown = hw.display().unwrap().shown();
        assert_eq!(shown[0].trim_end(), "System Init...");
        assert_eq!(shown[1].trim_end(), "Pls Wait");
    }

    #[test]
    fn runs_without_display() {
        let mut hw = adapter(false);
        hw.show_status("anything", "at all");
        assert!(hw.display().is_none());
        assert_eq!(hw.display_faults(), 0);
    }
}
