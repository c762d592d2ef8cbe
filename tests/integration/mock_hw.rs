//! Mock adapters for integration tests.
//!
//! Records every actuator call, frame and published record so tests can
//! assert on the full history without touching GPIO, I²C or the network.

use std::collections::{HashMap, VecDeque};

use smartiron::app::commands::RemoteCommand;
use smartiron::app::events::{AppEvent, TelemetryData};
use smartiron::app::ports::{
    ActuatorPort, ConnectivityPort, EventSink, SensorPort, StorageError, StoragePort,
};
use smartiron::control::Decision;
use smartiron::error::CommsError;
use smartiron::sensors::fabric::FabricKind;

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    pub temperature_c: f32,
    pub humidity_pct: f32,
    pub object_present: bool,
    pub fabric: FabricKind,
    pub applied: Vec<Decision>,
    pub frames: Vec<(String, String)>,
    pub all_off_calls: usize,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            temperature_c: 25.0,
            humidity_pct: 40.0,
            object_present: true,
            fabric: FabricKind::Cotton,
            applied: Vec::new(),
            frames: Vec::new(),
            all_off_calls: 0,
        }
    }

    pub fn set_conditions(&mut self, temperature_c: f32, humidity_pct: f32, object_present: bool) {
        self.temperature_c = temperature_c;
        self.humidity_pct = humidity_pct;
        self.object_present = object_present;
    }

    pub fn last_decision(&self) -> Option<&Decision> {
        self.applied.last()
    }

    pub fn last_frame(&self) -> Option<(&str, &str)> {
        self.frames.last().map(|(t, b)| (t.as_str(), b.as_str()))
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for MockHardware {
    fn read_temperature(&mut self) -> f32 {
        self.temperature_c
    }

    fn read_humidity(&mut self) -> f32 {
        self.humidity_pct
    }

    fn is_object_present(&mut self) -> bool {
        self.object_present
    }

    fn fabric_kind(&mut self) -> FabricKind {
        if self.object_present {
            self.fabric
        } else {
            FabricKind::Unknown
        }
    }
}

impl ActuatorPort for MockHardware {
    fn apply(&mut self, decision: &Decision) {
        self.applied.push(*decision);
    }

    fn show_status(&mut self, top: &str, bottom: &str) {
        self.frames.push((top.to_owned(), bottom.to_owned()));
    }

    fn all_off(&mut self) {
        self.all_off_calls += 1;
    }
}

// ── MockNetwork ───────────────────────────────────────────────

#[derive(Default)]
pub struct MockNetwork {
    pub link: bool,
    pub session: bool,
    pub pending: VecDeque<RemoteCommand>,
    pub published: Vec<TelemetryData>,
    pub polls: usize,
    pub fail_publish: bool,
}

#[allow(dead_code)]
impl MockNetwork {
    pub fn offline() -> Self {
        Self::default()
    }

    pub fn online() -> Self {
        Self {
            link: true,
            session: true,
            ..Self::default()
        }
    }

    pub fn set(&mut self, link: bool, session: bool) {
        self.link = link;
        self.session = session;
    }

    pub fn send(&mut self, cmd: RemoteCommand) {
        self.pending.push_back(cmd);
    }
}

impl ConnectivityPort for MockNetwork {
    fn poll(&mut self) {
        self.polls += 1;
    }

    fn link_up(&self) -> bool {
        self.link
    }

    fn session_up(&self) -> bool {
        self.session
    }

    fn take_command(&mut self) -> Option<RemoteCommand> {
        self.pending.pop_front()
    }

    fn publish_telemetry(&mut self, data: &TelemetryData) -> Result<(), CommsError> {
        if self.fail_publish {
            return Err(CommsError::MqttPublishFailed);
        }
        self.published.push(*data);
        Ok(())
    }
}

// ── MockNvs ───────────────────────────────────────────────────

#[derive(Default)]
pub struct MockNvs {
    store: HashMap<String, Vec<u8>>,
}

#[allow(dead_code)]
impl MockNvs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> usize {
        self.store.len()
    }
}

impl StoragePort for MockNvs {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let k = format!("{}::{}", namespace, key);
        match self.store.get(&k) {
            Some(v) if v.len() > buf.len() => Err(StorageError::BufferTooSmall),
            Some(v) => {
                buf[..v.len()].copy_from_slice(v);
                Ok(v.len())
            }
            None => Err(StorageError::NotFound),
        }
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        let k = format!("{}::{}", namespace, key);
        self.store.insert(k, data.to_vec());
        Ok(())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        self.store.remove(&format!("{}::{}", namespace, key));
        Ok(())
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.store.contains_key(&format!("{}::{}", namespace, key))
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(*event);
    }
}
