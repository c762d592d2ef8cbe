//! GPIO / peripheral pin assignments for the SmartIron controller board
//! (classic ESP32 DevKit).
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Sensors
// ---------------------------------------------------------------------------

/// DHT11 single-wire data line (open-drain, external pull-up).
pub const DHT_GPIO: i32 = 4;

/// Reflective IR object sensor, analog output.
/// GPIO 34 is ADC1 channel 6 on the ESP32.
pub const IR_ADC_GPIO: i32 = 34;
pub const IR_ADC_CHANNEL: u32 = 6;

// ---------------------------------------------------------------------------
// Actuators
// ---------------------------------------------------------------------------

/// Heating element relay.  HIGH = energised.
pub const RELAY_GPIO: i32 = 26;
/// Piezo buzzer.  HIGH = sounding.
pub const BUZZER_GPIO: i32 = 15;
/// Heating indicator LED (on-board LED).
pub const INDICATOR_LED_GPIO: i32 = 2;

// ---------------------------------------------------------------------------
// I²C bus (16x2 LCD behind a PCF8574 backpack)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 21;
pub const I2C_SCL_GPIO: i32 = 22;
pub const I2C_FREQ_HZ: u32 = 100_000;
pub const LCD_I2C_ADDR: u8 = 0x27;
