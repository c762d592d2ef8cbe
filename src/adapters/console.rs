//! Serial console input.
//!
//! Accumulates bytes from UART0 into a line and turns complete lines into
//! [`ConsoleCommand`]s.  Reads never block; a partial line simply waits
//! for the next poll.  Unknown lines are ignored.
//!
//! Several lines can land in one drain (a pasted batch, or two commands
//! typed within one control period).  Completed commands queue up and
//! come out one per [`poll`](ConsoleReader::poll), in arrival order.

use heapless::{Deque, String};
use log::{debug, warn};

use crate::app::commands::ConsoleCommand;

const LINE_CAPACITY: usize = 32;
const PENDING_CAPACITY: usize = 4;

#[cfg(target_os = "espidf")]
const CONSOLE_UART: i32 = 0;

pub struct ConsoleReader {
    line: String<LINE_CAPACITY>,
    /// Set when the current line outgrew the buffer; cleared at newline.
    overflowed: bool,
    pending: Deque<ConsoleCommand, PENDING_CAPACITY>,
}

impl ConsoleReader {
    #[cfg(target_os = "espidf")]
    pub fn new() -> Self {
        use esp_idf_svc::sys::{uart_driver_install, ESP_OK};
        // SAFETY: installs the RX driver for the console UART once at boot.
        let ret = unsafe {
            uart_driver_install(CONSOLE_UART as _, 256, 0, 0, core::ptr::null_mut(), 0)
        };
        if ret != ESP_OK as i32 {
            log::warn!("Console: UART driver install failed ({})", ret);
        }
        Self::empty()
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self::empty()
    }

    fn empty() -> Self {
        Self {
            line: String::new(),
            overflowed: false,
            pending: Deque::new(),
        }
    }

    /// Drain whatever the UART has buffered and hand out the oldest
    /// pending command.
    #[cfg(target_os = "espidf")]
    pub fn poll(&mut self) -> Option<ConsoleCommand> {
        use esp_idf_svc::sys::uart_read_bytes;
        let mut buf = [0u8; 16];
        loop {
            // SAFETY: buf outlives the call; zero ticks means no wait.
            let n = unsafe {
                uart_read_bytes(CONSOLE_UART as _, buf.as_mut_ptr().cast(), buf.len() as u32, 0)
            };
            if n <= 0 {
                break;
            }
            for &b in &buf[..n as usize] {
                self.accept(b);
            }
        }
        self.pending.pop_front()
    }

    /// No UART on host; hands out whatever `feed` queued.
    #[cfg(not(target_os = "espidf"))]
    pub fn poll(&mut self) -> Option<ConsoleCommand> {
        self.pending.pop_front()
    }

    /// Feed a whole string, then hand out the oldest pending command.
    /// Later commands completed by `text` stay queued for `poll`.
    pub fn feed_str(&mut self, text: &str) -> Option<ConsoleCommand> {
        for b in text.bytes() {
            self.accept(b);
        }
        self.pending.pop_front()
    }

    /// Commands completed but not yet handed out.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    fn accept(&mut self, byte: u8) {
        if let Some(cmd) = self.feed(byte) {
            if self.pending.push_back(cmd).is_err() {
                warn!("Console: command queue full, dropped {:?}", cmd);
            }
        }
    }

    /// Push one byte.  Returns a command when `byte` ends a recognised line.
    /// Bypasses the pending queue.
    pub fn feed(&mut self, byte: u8) -> Option<ConsoleCommand> {
        match byte {
            b'\r' | b'\n' => self.finish_line(),
            b if b.is_ascii() && !b.is_ascii_control() => {
                if self.line.push(b as char).is_err() {
                    self.overflowed = true;
                }
                None
            }
            _ => None,
        }
    }

    fn finish_line(&mut self) -> Option<ConsoleCommand> {
        let cmd = if self.overflowed {
            None
        } else {
            ConsoleCommand::parse(&self.line)
        };
        if cmd.is_none() && !self.line.is_empty() {
            debug!("Console: ignored '{}'", self.line);
        }
        self.line.clear();
        self.overflowed = false;
        cmd
    }
}

impl Default for ConsoleReader {
    fn default() -> Self {
        Self::new()
    }
}
