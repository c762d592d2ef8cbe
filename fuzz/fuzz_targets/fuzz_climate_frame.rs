//! Fuzz target: `decode_frame`
//!
//! Any 5-byte DHT frame either fails the checksum or yields finite
//! readings.
//!
//! cargo fuzz run fuzz_climate_frame

#![no_main]

use libfuzzer_sys::fuzz_target;
use smartiron::sensors::climate::decode_frame;

fuzz_target!(|data: [u8; 5]| {
    if let Ok(reading) = decode_frame(&data) {
        assert!(reading.temperature_c.is_finite());
        assert!(reading.humidity_pct.is_finite());
    }
});
