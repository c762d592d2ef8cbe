//! DHT11 temperature / humidity sensor.
//!
//! Single-wire protocol: the host pulls the line low for ≥18 ms, the
//! sensor answers with an 80 µs low / 80 µs high preamble, then 40 bits.
//! Each bit is a ~50 µs low followed by a high pulse whose width encodes
//! the value (~27 µs = 0, ~70 µs = 1).
//!
//! ```text
//!  byte 0    byte 1    byte 2    byte 3    byte 4
//!  RH int    RH dec    T int     T dec     checksum = (b0+b1+b2+b3) & 0xFF
//!                                bit 7 of byte 3 = negative temperature
//! ```
//!
//! The sensor cannot be polled faster than once a second; reads inside
//! that window return the previous result.  Failed reads yield the
//! [`UNREADABLE`] sentinel for both values.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: bit-bangs the open-drain data pin via hw_init helpers.
//! On host/test: reads injected values from static atomics.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use log::warn;

use crate::control::context::UNREADABLE;
use crate::drivers::hw_init;
use crate::error::SensorError;

#[cfg(not(target_os = "espidf"))]
static SIM_TEMP_BITS: AtomicU32 = AtomicU32::new(0x41C8_0000); // 25.0
#[cfg(not(target_os = "espidf"))]
static SIM_HUMIDITY_BITS: AtomicU32 = AtomicU32::new(0x4220_0000); // 40.0
#[cfg(not(target_os = "espidf"))]
static SIM_FAIL: AtomicBool = AtomicBool::new(false);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_climate(temperature_c: f32, humidity_pct: f32) {
    SIM_TEMP_BITS.store(temperature_c.to_bits(), Ordering::Relaxed);
    SIM_HUMIDITY_BITS.store(humidity_pct.to_bits(), Ordering::Relaxed);
}

/// Make the next host-side reads fail (`true`) or succeed again.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_climate_failure(fail: bool) {
    SIM_FAIL.store(fail, Ordering::Relaxed);
}

/// Minimum spacing between two frames on real hardware.
pub const MIN_READ_INTERVAL_US: u64 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimateReading {
    pub temperature_c: f32,
    pub humidity_pct: f32,
}

impl ClimateReading {
    pub const UNREADABLE: Self = Self {
        temperature_c: UNREADABLE,
        humidity_pct: UNREADABLE,
    };
}

pub struct ClimateSensor {
    _gpio: i32,
    min_interval_us: u64,
    last: ClimateReading,
    last_at_us: Option<u64>,
    failures: u32,
}

impl ClimateSensor {
    pub fn new(gpio: i32, min_interval_us: u64) -> Self {
        Self {
            _gpio: gpio,
            min_interval_us,
            last: ClimateReading::UNREADABLE,
            last_at_us: None,
            failures: 0,
        }
    }

    /// Fresh reading, the cached one if the sensor is still resting, or
    /// the sentinel pair on failure.
    pub fn sample(&mut self) -> ClimateReading {
        let now = hw_init::micros();
        if let Some(at) = self.last_at_us {
            if now.saturating_sub(at) < self.min_interval_us {
                return self.last;
            }
        }

        self.last = match self.read_frame().and_then(|f| decode_frame(&f)) {
            Ok(reading) => {
                self.failures = 0;
                reading
            }
            Err(e) => {
                self.failures = self.failures.saturating_add(1);
                warn!("DHT11 read failed ({}), {} in a row", e, self.failures);
                ClimateReading::UNREADABLE
            }
        };
        self.last_at_us = Some(now);
        self.last
    }

    /// Consecutive failed reads.
    pub fn failures(&self) -> u32 {
        self.failures
    }

    #[cfg(target_os = "espidf")]
    fn read_frame(&self) -> Result<[u8; 5], SensorError> {
        read_frame_hw(self._gpio)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_frame(&self) -> Result<[u8; 5], SensorError> {
        if SIM_FAIL.load(Ordering::Relaxed) {
            return Err(SensorError::NoResponse);
        }
        Ok(encode_frame(
            f32::from_bits(SIM_TEMP_BITS.load(Ordering::Relaxed)),
            f32::from_bits(SIM_HUMIDITY_BITS.load(Ordering::Relaxed)),
        ))
    }
}

/// Validate the checksum and unpack a 5-byte frame.
pub fn decode_frame(frame: &[u8; 5]) -> Result<ClimateReading, SensorError> {
    let sum = frame[..4].iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    if sum != frame[4] {
        return Err(SensorError::Checksum);
    }

    let humidity_pct = frame[0] as f32 + frame[1] as f32 / 10.0;
    let magnitude = frame[2] as f32 + (frame[3] & 0x7F) as f32 / 10.0;
    let temperature_c = if frame[3] & 0x80 != 0 {
        -magnitude
    } else {
        magnitude
    };

    Ok(ClimateReading {
        temperature_c,
        humidity_pct,
    })
}

/// Build the frame a sensor would send for these values (one decimal).
#[cfg(not(target_os = "espidf"))]
fn encode_frame(temperature_c: f32, humidity_pct: f32) -> [u8; 5] {
    let split = |v: f32| {
        let tenths = (v.abs() * 10.0).round() as u32;
        ((tenths / 10).min(255) as u8, (tenths % 10) as u8)
    };
    let (h_int, h_dec) = split(humidity_pct);
    let (t_int, mut t_dec) = split(temperature_c);
    if temperature_c < 0.0 {
        t_dec |= 0x80;
    }
    let sum = h_int
        .wrapping_add(h_dec)
        .wrapping_add(t_int)
        .wrapping_add(t_dec);
    [h_int, h_dec, t_int, t_dec, sum]
}

// ── Bit-bang transfer (target only) ───────────────────────────

#[cfg(target_os = "espidf")]
fn read_frame_hw(gpio: i32) -> Result<[u8; 5], SensorError> {
    // Start signal.
    hw_init::gpio_write(gpio, false);
    hw_init::delay_us(18_000);
    hw_init::gpio_write(gpio, true);
    hw_init::delay_us(30);

    // Preamble: low, high, then the first bit's low.
    wait_for_level(gpio, false, 100).map_err(|_| SensorError::NoResponse)?;
    wait_for_level(gpio, true, 100).map_err(|_| SensorError::NoResponse)?;
    wait_for_level(gpio, false, 100).map_err(|_| SensorError::NoResponse)?;

    let mut frame = [0u8; 5];
    for bit in 0..40 {
        wait_for_level(gpio, true, 80)?;
        let high_us = wait_for_level(gpio, false, 100)?;
        if high_us > 40 {
            frame[bit / 8] |= 0x80 >> (bit % 8);
        }
    }
    Ok(frame)
}

/// Spin until the line reads `level`; returns the time waited.
#[cfg(target_os = "espidf")]
fn wait_for_level(gpio: i32, level: bool, timeout_us: u64) -> Result<u64, SensorError> {
    let start = hw_init::micros();
    loop {
        let waited = hw_init::micros().saturating_sub(start);
        if hw_init::gpio_read(gpio) == level {
            return Ok(waited);
        }
        if waited > timeout_us {
            return Err(SensorError::Timeout);
        }
    }
}
