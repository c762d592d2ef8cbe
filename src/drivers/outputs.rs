//! Relay, buzzer and indicator LED.
//!
//! All three are plain push-pull GPIO outputs, active HIGH.  They are only
//! ever driven together from a complete [`Decision`], so the actuator
//! state can never be a mix of two cycles.  Every apply re-drives every
//! pin, so a glitched level is corrected on the next cycle.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: writes GPIO levels via hw_init.
//! On host/test: tracks state in-memory only.

use crate::control::Decision;
use crate::drivers::hw_init;
use crate::pins;

/// One digital output with its last commanded level.
pub struct DigitalOutput {
    gpio: i32,
    on: bool,
    writes: u32,
}

impl DigitalOutput {
    pub fn new(gpio: i32) -> Self {
        Self {
            gpio,
            on: false,
            writes: 0,
        }
    }

    /// Drive the pin, even if it is already at `on`.
    pub fn set(&mut self, on: bool) {
        hw_init::gpio_write(self.gpio, on);
        self.on = on;
        self.writes = self.writes.wrapping_add(1);
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Pin writes issued so far.
    pub fn writes(&self) -> u32 {
        self.writes
    }
}

/// The three outputs a [`Decision`] controls.
pub struct HeaterOutputs {
    relay: DigitalOutput,
    buzzer: DigitalOutput,
    indicator: DigitalOutput,
}

impl HeaterOutputs {
    pub fn new() -> Self {
        Self {
            relay: DigitalOutput::new(pins::RELAY_GPIO),
            buzzer: DigitalOutput::new(pins::BUZZER_GPIO),
            indicator: DigitalOutput::new(pins::INDICATOR_LED_GPIO),
        }
    }

    pub fn apply(&mut self, decision: &Decision) {
        // Relay first: if it is going off, cut it before anything else.
        self.relay.set(decision.relay);
        self.buzzer.set(decision.alarm);
        self.indicator.set(decision.indicator);
    }

    pub fn all_off(&mut self) {
        self.relay.set(false);
        self.buzzer.set(false);
        self.indicator.set(false);
    }

    /// (relay, buzzer, indicator)
    pub fn state(&self) -> (bool, bool, bool) {
        (self.relay.is_on(), self.buzzer.is_on(), self.indicator.is_on())
    }

    pub fn relay(&self) -> &DigitalOutput {
        &self.relay
    }
}

impl Default for HeaterOutputs {
    fn default() -> Self {
        Self::new()
    }
}
