//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing application events to the ESP-IDF
//! logger (UART / USB-CDC in production) as `CATEGORY | message` lines.

use log::{error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        let tag = event.category().tag();
        match event {
            AppEvent::SafetyTrip { .. } => error!("{} | {}", tag, event),
            AppEvent::ConnectivityChanged { online: false } => warn!("{} | {}", tag, event),
            _ => info!("{} | {}", tag, event),
        }
    }
}
