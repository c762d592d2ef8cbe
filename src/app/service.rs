//! Application service — the hexagonal core.
//!
//! [`AppService`] owns the adaptive control engine and the safety policy.
//! It exposes a clean, hardware-agnostic API.  All I/O flows through
//! port traits injected at call sites, making the entire service
//! testable with mock adapters.
//!
//! ```text
//!      SensorPort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                     │          AppService          │
//!    ActuatorPort ◀── │ ModeArbiter · Predictor      │
//!                     │ Rules · SafetyPolicy         │
//! ConnectivityPort ◀▶ └──────────────────────────────┘
//! ```
//!
//! One [`tick`](AppService::tick) is one control cycle.  The caller paces
//! ticks at `control_loop_interval_ms`; telemetry is rate-limited here by
//! counting cycles, never by the engine.

use core::fmt::Write;

use heapless::String;
use log::{debug, info, warn};

use crate::config::{SAMPLE_CAPACITY, SystemConfig};
use crate::control::arbiter::{CycleOutcome, Mode, ModeArbiter};
use crate::control::context::{ConnectivityState, CycleContext, Observation};
use crate::control::predictor::{PredictorParams, Predictor};
use crate::control::rules::RuleBasedDecider;
use crate::drivers::display::COLS;
use crate::safety::SafetyPolicy;
use crate::sensors::fabric::FabricKind;

use super::commands::ConsoleCommand;
use super::events::{AppEvent, TelemetryData};
use super::ports::{ActuatorPort, ConnectivityPort, EventSink, SensorPort};

/// Everything one tick saw and did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleReport {
    pub observation: Observation,
    pub fabric: FabricKind,
    pub connectivity: ConnectivityState,
    pub outcome: CycleOutcome,
    pub telemetry_sent: bool,
}

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService {
    config: SystemConfig,
    arbiter: ModeArbiter,
    predictor: Predictor<SAMPLE_CAPACITY>,
    rules: RuleBasedDecider,
    safety: SafetyPolicy,
    /// Cycles between telemetry publishes (derived from config).
    telemetry_every: u32,
    cycles_since_telemetry: u32,
    tick_count: u64,
}

impl AppService {
    /// Construct the service from a validated configuration.
    pub fn new(config: SystemConfig) -> Self {
        let telemetry_every = config.telemetry_interval_cycles();
        Self {
            arbiter: ModeArbiter::new(),
            predictor: Predictor::new(PredictorParams::from_config(&config)),
            rules: RuleBasedDecider::from_config(&config),
            safety: SafetyPolicy::from_config(&config),
            telemetry_every,
            // First online cycle publishes immediately.
            cycles_since_telemetry: telemetry_every,
            tick_count: 0,
            config,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Announce the boot.  Call once before the first tick.
    pub fn start(&mut self, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::Boot);
        info!(
            "AppService started (safe temp {:.1}C, k={}, {} sample slots)",
            self.config.safe_temperature_c, self.config.neighbor_count, SAMPLE_CAPACITY
        );
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one full control cycle: connectivity → sensors → arbiter →
    /// safety → actuators → display → telemetry.
    ///
    /// The `hw` parameter satisfies **both** [`SensorPort`] and
    /// [`ActuatorPort`], which avoids a double mutable borrow while
    /// keeping the port boundary explicit.
    pub fn tick(
        &mut self,
        hw: &mut (impl SensorPort + ActuatorPort),
        net: &mut impl ConnectivityPort,
        sink: &mut impl EventSink,
    ) -> CycleReport {
        self.tick_count += 1;

        // 1. Connectivity housekeeping
        net.poll();
        let connectivity = ConnectivityState::new(net.link_up(), net.session_up());

        // 2. Sensors
        let observation = hw.read_observation();
        let fabric = hw.fabric_kind();

        // 3. Decide
        let ctx = CycleContext::new(observation, connectivity).with_command(net.take_command());
        let outcome = self.arbiter.cycle(
            &ctx,
            &mut self.predictor,
            &self.rules,
            &self.safety,
            sink,
        );

        debug!(
            "Cycle {}: {} -> relay={} alarm={} ({})",
            self.tick_count,
            outcome.source.label(),
            outcome.decision.relay,
            outcome.decision.alarm,
            outcome.decision.status
        );

        // 4. Actuate
        hw.apply(&outcome.decision);
        let (top, bottom) = self.status_frame(&observation, &outcome);
        hw.show_status(&top, &bottom);

        // 5. Telemetry
        let telemetry_sent = self.maybe_publish(net, &observation, fabric, &outcome);

        CycleReport {
            observation,
            fabric,
            connectivity,
            outcome,
            telemetry_sent,
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Process a serial console command.
    pub fn handle_console(&mut self, cmd: ConsoleCommand, sink: &mut impl EventSink) {
        debug!("Console command {:?}", cmd);
        match cmd {
            ConsoleCommand::DumpLogs => sink.emit(&AppEvent::LogDumpRequested),
            ConsoleCommand::ClearLogs => sink.emit(&AppEvent::LogClearRequested),
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn mode(&self) -> Mode {
        self.arbiter.mode()
    }

    /// Training examples currently held.
    pub fn sample_count(&self) -> usize {
        self.predictor.sample_count()
    }

    pub fn predictor(&self) -> &Predictor<SAMPLE_CAPACITY> {
        &self.predictor
    }

    /// Total control ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    /// Build a telemetry record for this cycle.
    pub fn build_telemetry(
        observation: &Observation,
        fabric: FabricKind,
        outcome: &CycleOutcome,
    ) -> TelemetryData {
        TelemetryData {
            temperature: observation.temperature_c,
            humidity: observation.humidity_pct,
            fabric_detected: observation.object_present,
            fabric_type: fabric,
            status: outcome.decision.status,
        }
    }

    // ── Internal ──────────────────────────────────────────────

    fn maybe_publish(
        &mut self,
        net: &mut impl ConnectivityPort,
        observation: &Observation,
        fabric: FabricKind,
        outcome: &CycleOutcome,
    ) -> bool {
        self.cycles_since_telemetry = self.cycles_since_telemetry.saturating_add(1);
        if self.arbiter.mode() != Mode::Online || self.cycles_since_telemetry < self.telemetry_every
        {
            return false;
        }
        self.cycles_since_telemetry = 0;

        let data = Self::build_telemetry(observation, fabric, outcome);
        match net.publish_telemetry(&data) {
            Ok(()) => true,
            Err(e) => {
                warn!("Telemetry publish failed: {}", e);
                false
            }
        }
    }

    /// Two display lines for this cycle.
    fn status_frame(
        &self,
        observation: &Observation,
        outcome: &CycleOutcome,
    ) -> (String<COLS>, String<COLS>) {
        let mut top = String::new();
        let mut bottom = String::new();
        match self.arbiter.mode() {
            Mode::Online => {
                let _ = write!(top, "T:{:.1}C NET:ON", observation.temperature_c);
                if observation.object_present {
                    let _ = write!(bottom, "Obj:YES H:{:.0}%", observation.humidity_pct);
                } else {
                    push_truncated(&mut bottom, "No object");
                }
            }
            Mode::Offline => {
                let _ = write!(top, "OFFLINE AI L:{}", self.predictor.sample_count());
                push_truncated(&mut bottom, outcome.decision.status);
            }
        }
        (top, bottom)
    }
}

/// Append as much of `text` as fits.
fn push_truncated<const N: usize>(line: &mut String<N>, text: &str) {
    for c in text.chars() {
        if line.push(c).is_err() {
            break;
        }
    }
}
