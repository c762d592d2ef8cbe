//! 16x2 character LCD (HD44780) behind a PCF8574 I²C backpack.
//!
//! The expander drives the controller in 4-bit mode:
//!
//! ```text
//!  PCF8574 bit   7   6   5   4   3    2   1   0
//!  LCD signal    D7  D6  D5  D4  BL   EN  RW  RS
//! ```
//!
//! Each nibble is latched by pulsing EN.  RW is always low (write-only).
//!
//! Generic over [`embedded_hal::i2c::I2c`] and [`DelayNs`] so the same
//! driver runs on the ESP-IDF HAL and against a recording mock in tests.
//! Lines are only rewritten when their text changes.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use heapless::String;

pub const COLS: usize = 16;
pub const ROWS: usize = 2;

const RS: u8 = 0x01;
const EN: u8 = 0x04;
const BACKLIGHT: u8 = 0x08;

const CMD_CLEAR: u8 = 0x01;
const CMD_ENTRY_LEFT: u8 = 0x06;
const CMD_DISPLAY_ON: u8 = 0x0C;
const CMD_FUNCTION_4BIT_2LINE: u8 = 0x28;
const CMD_SET_DDRAM: u8 = 0x80;

const ROW_OFFSETS: [u8; ROWS] = [0x00, 0x40];

/// One padded display line.
pub type Line = String<COLS>;

pub struct Lcd1602<I2C, D> {
    i2c: I2C,
    delay: D,
    addr: u8,
    shown: [Line; ROWS],
}

impl<I2C: I2c, D: DelayNs> Lcd1602<I2C, D> {
    /// Run the power-on initialisation sequence and clear the screen.
    pub fn new(i2c: I2C, delay: D, addr: u8) -> Result<Self, I2C::Error> {
        let mut lcd = Self {
            i2c,
            delay,
            addr,
            shown: [Line::new(), Line::new()],
        };
        lcd.init()?;
        Ok(lcd)
    }

    fn init(&mut self) -> Result<(), I2C::Error> {
        self.delay.delay_ms(50);
        // Force 8-bit mode three times, then drop to 4-bit.
        for wait_us in [4_500, 4_500, 150] {
            self.write_nibble(0x30, 0)?;
            self.delay.delay_us(wait_us);
        }
        self.write_nibble(0x20, 0)?;

        self.command(CMD_FUNCTION_4BIT_2LINE)?;
        self.command(CMD_DISPLAY_ON)?;
        self.command(CMD_CLEAR)?;
        self.delay.delay_ms(2);
        self.command(CMD_ENTRY_LEFT)
    }

    /// Show two lines.  Text beyond 16 columns is cut; non-ASCII is
    /// replaced with `?`.
    pub fn show(&mut self, top: &str, bottom: &str) -> Result<(), I2C::Error> {
        for (row, text) in [top, bottom].into_iter().enumerate() {
            let line = pad(text);
            if line != self.shown[row] {
                self.write_line(row, &line)?;
                self.shown[row] = line;
            }
        }
        Ok(())
    }

    /// Lines currently on the glass.
    pub fn shown(&self) -> &[Line; ROWS] {
        &self.shown
    }

    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    fn write_line(&mut self, row: usize, line: &str) -> Result<(), I2C::Error> {
        self.command(CMD_SET_DDRAM | ROW_OFFSETS[row])?;
        for b in line.bytes() {
            self.write_byte(b, RS)?;
        }
        Ok(())
    }

    fn command(&mut self, cmd: u8) -> Result<(), I2C::Error> {
        self.write_byte(cmd, 0)?;
        self.delay.delay_us(40);
        Ok(())
    }

    fn write_byte(&mut self, value: u8, mode: u8) -> Result<(), I2C::Error> {
        self.write_nibble(value & 0xF0, mode)?;
        self.write_nibble((value << 4) & 0xF0, mode)
    }

    fn write_nibble(&mut self, high_nibble: u8, mode: u8) -> Result<(), I2C::Error> {
        let bits = high_nibble | mode | BACKLIGHT;
        self.i2c.write(self.addr, &[bits | EN])?;
        self.delay.delay_us(1);
        self.i2c.write(self.addr, &[bits])?;
        self.delay.delay_us(50);
        Ok(())
    }
}

/// Exactly [`COLS`] printable ASCII characters.
pub fn pad(text: &str) -> Line {
    let mut line = Line::new();
    for c in text.chars().take(COLS) {
        let c = if c.is_ascii() && !c.is_ascii_control() { c } else { '?' };
        // Capacity is COLS and at most COLS chars are taken.
        let _ = line.push(c);
    }
    while line.len() < COLS {
        let _ = line.push(' ');
    }
    line
}
