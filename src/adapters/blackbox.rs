//! Black-box event log.
//!
//! Keeps the last [`BLACKBOX_SLOTS`] application events in flash so they
//! survive a reset.  Entries live in a ring of NVS keys under the
//! `blackbox` namespace:
//!
//! ```text
//!   head  → u32 LE, total entries ever written
//!   e00   → postcard LogEntry   (slot = seq % BLACKBOX_SLOTS)
//!   e01   → ...
//! ```
//!
//! Each entry renders as `[uptime] TAG: message`.  The log is an
//! [`EventSink`]: every event is recorded, and the log-dump / log-clear
//! requests are acted on here.

use core::fmt::{self, Write};

use heapless::{String, Vec};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::app::events::{AppEvent, EventCategory};
use crate::app::ports::{EventSink, StoragePort};

use super::time::UptimeClock;

pub const BLACKBOX_SLOTS: usize = 32;
pub const MESSAGE_LEN: usize = 48;

const NAMESPACE: &str = "blackbox";
const HEAD_KEY: &str = "head";
const ENTRY_BUF: usize = 80;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub uptime_secs: u64,
    pub category: EventCategory,
    pub message: String<MESSAGE_LEN>,
}

impl LogEntry {
    /// Build an entry from anything displayable, cutting it to
    /// [`MESSAGE_LEN`] bytes.
    pub fn new(uptime_secs: u64, category: EventCategory, message: impl fmt::Display) -> Self {
        let mut text = String::new();
        let _ = write!(Truncating(&mut text), "{}", message);
        Self {
            uptime_secs,
            category,
            message: text,
        }
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.uptime_secs, self.category, self.message)
    }
}

/// `fmt::Write` that silently drops whatever does not fit.
struct Truncating<'a, const N: usize>(&'a mut String<N>);

impl<const N: usize> Write for Truncating<'_, N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.chars() {
            if self.0.push(c).is_err() {
                break;
            }
        }
        Ok(())
    }
}

/// Flash-backed ring of [`LogEntry`]s.
pub struct BlackBox<S: StoragePort> {
    storage: S,
    clock: UptimeClock,
    /// Sequence number of the next entry.
    head: u32,
}

impl<S: StoragePort> BlackBox<S> {
    /// Attach to `storage`, resuming after whatever is already there.
    pub fn new(storage: S, clock: UptimeClock) -> Self {
        let mut buf = [0u8; 4];
        let head = match storage.read(NAMESPACE, HEAD_KEY, &mut buf) {
            Ok(4) => u32::from_le_bytes(buf),
            _ => 0,
        };
        info!("BlackBox: {} entries on record", head.min(BLACKBOX_SLOTS as u32));
        Self {
            storage,
            clock,
            head,
        }
    }

    /// Append an entry, overwriting the oldest when full.
    pub fn record(&mut self, category: EventCategory, message: impl fmt::Display) {
        let entry = LogEntry::new(self.clock.uptime_secs(), category, message);
        info!("LOG: {}", entry);

        let mut buf = [0u8; ENTRY_BUF];
        let bytes = match postcard::to_slice(&entry, &mut buf) {
            Ok(bytes) => bytes,
            Err(_) => {
                warn!("BlackBox: entry too large, dropped");
                return;
            }
        };
        let slot = Self::slot_key(self.head as usize % BLACKBOX_SLOTS);
        if let Err(e) = self.storage.write(NAMESPACE, &slot, bytes) {
            warn!("BlackBox: write failed ({})", e);
            return;
        }

        self.head = self.head.wrapping_add(1);
        if let Err(e) = self.storage.write(NAMESPACE, HEAD_KEY, &self.head.to_le_bytes()) {
            warn!("BlackBox: head update failed ({})", e);
        }
    }

    /// Entries currently held.
    pub fn len(&self) -> usize {
        (self.head as usize).min(BLACKBOX_SLOTS)
    }

    pub fn is_empty(&self) -> bool {
        self.head == 0
    }

    /// Stored entries, oldest first.  Unreadable slots are skipped.
    pub fn entries(&self) -> Vec<LogEntry, BLACKBOX_SLOTS> {
        let mut out = Vec::new();
        let first = self.head.saturating_sub(BLACKBOX_SLOTS as u32);
        for seq in first..self.head {
            let slot = Self::slot_key(seq as usize % BLACKBOX_SLOTS);
            let mut buf = [0u8; ENTRY_BUF];
            if let Ok(len) = self.storage.read(NAMESPACE, &slot, &mut buf) {
                if let Ok(entry) = postcard::from_bytes::<LogEntry>(&buf[..len]) {
                    let _ = out.push(entry);
                }
            }
        }
        out
    }

    /// Print every stored entry to the console.  Returns how many.
    pub fn dump(&self) -> usize {
        let entries = self.entries();
        info!("--- BLACK BOX DUMP START ---");
        for entry in &entries {
            info!("{}", entry);
        }
        info!("--- BLACK BOX DUMP END ---");
        entries.len()
    }

    /// Erase the log, then note that it was erased.
    pub fn clear(&mut self) {
        for i in 0..BLACKBOX_SLOTS {
            let _ = self.storage.delete(NAMESPACE, &Self::slot_key(i));
        }
        let _ = self.storage.delete(NAMESPACE, HEAD_KEY);
        self.head = 0;
        info!("BlackBox: logs cleared");
        self.record(EventCategory::Sys, "logs cleared by user command");
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn slot_key(index: usize) -> String<8> {
        let mut s = String::new();
        let _ = write!(s, "e{:02}", index);
        s
    }
}

impl<S: StoragePort> EventSink for BlackBox<S> {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::LogClearRequested => self.clear(),
            AppEvent::LogDumpRequested => {
                self.record(event.category(), event);
                self.dump();
            }
            _ => self.record(event.category(), event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::nvs::NvsAdapter;
    use crate::control::arbiter::Mode;

    fn blackbox() -> BlackBox<NvsAdapter> {
        BlackBox::new(NvsAdapter::new().unwrap(), UptimeClock::new())
    }

    #[test]
    fn entry_renders_like_a_log_line() {
        let e = LogEntry::new(42, EventCategory::Net, "online");
        assert_eq!(e.to_string(), "[42] NET: online");
    }

    #[test]
    fn long_messages_are_cut() {
        let long = "x".repeat(200);
        let e = LogEntry::new(0, EventCategory::Sys, long.as_str());
        assert_eq!(e.message.len(), MESSAGE_LEN);
    }

    #[test]
    fn records_events_in_order() {
        let mut bb = blackbox();
        bb.emit(&AppEvent::Boot);
        bb.emit(&AppEvent::ConnectivityChanged { online: true });
        bb.emit(&AppEvent::SafetyTrip {
            mode: Mode::Online,
            temperature_c: 175.0,
        });

        let tags: std::vec::Vec<&str> = bb.entries().iter().map(|e| e.category.tag()).collect();
        assert_eq!(tags, ["BOOT", "NET", "ALRT"]);
    }

    #[test]
    fn ring_keeps_newest_entries() {
        let mut bb = blackbox();
        for i in 0..(BLACKBOX_SLOTS + 5) {
            bb.record(EventCategory::Auto, i);
        }
        let entries = bb.entries();
        assert_eq!(entries.len(), BLACKBOX_SLOTS);
        assert_eq!(entries[0].message.as_str(), "5");
        assert_eq!(
            entries[BLACKBOX_SLOTS - 1].message.as_str(),
            (BLACKBOX_SLOTS + 4).to_string()
        );
    }

    #[test]
    fn clear_leaves_only_the_clear_note() {
        let mut bb = blackbox();
        bb.emit(&AppEvent::Boot);
        bb.emit(&AppEvent::RemoteRelay { on: true, samples: 1 });
        bb.emit(&AppEvent::LogClearRequested);

        let entries = bb.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].category, EventCategory::Sys);
    }

    #[test]
    fn dump_request_is_recorded_and_counted() {
        let mut bb = blackbox();
        bb.emit(&AppEvent::Boot);
        bb.emit(&AppEvent::LogDumpRequested);
        assert_eq!(bb.len(), 2);
        assert_eq!(bb.dump(), 2);
    }

    #[test]
    fn resumes_from_stored_head() {
        let mut bb = blackbox();
        bb.record(EventCategory::Boot, "first");
        bb.record(EventCategory::Boot, "second");

        let mut storage = NvsAdapter::new().unwrap();
        let mut buf = [0u8; ENTRY_BUF];
        for key in ["head", "e00", "e01"] {
            let len = bb.storage().read(NAMESPACE, key, &mut buf).unwrap();
            storage.write(NAMESPACE, key, &buf[..len]).unwrap();
        }

        let reopened = BlackBox::new(storage, UptimeClock::new());
        assert_eq!(reopened.len(), 2);
        assert_eq!(reopened.entries()[1].message.as_str(), "second");
    }
}
