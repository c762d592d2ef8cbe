//! Mode arbiter.
//!
//! Tracks connectivity and picks the decision source for each cycle.
//!
//! ```text
//!                 link_up && session_up
//!   ┌─────────┐ ─────────────────────────▶ ┌────────┐
//!   │ Offline │                            │ Online │
//!   └─────────┘ ◀───────────────────────── └────────┘
//!                     either drops
//! ```
//!
//! The mode is a pure function of the current [`ConnectivityState`]; there
//! is no hysteresis.  Each edge emits exactly one
//! [`AppEvent::ConnectivityChanged`].  The arbiter starts Offline, so the
//! first online cycle reports an edge.
//!
//! Online, the remote operator is in control and every `setRelay` becomes a
//! training example.  Offline, the predictor stands in for the operator once
//! it has anything to go on.  The [`SafetyPolicy`] is applied after either
//! branch, every cycle.

use core::fmt;

use log::{debug, error, info, warn};

use crate::app::commands::RemoteCommand;
use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::safety::SafetyPolicy;

use super::context::CycleContext;
use super::predictor::Predictor;
use super::rules::RuleBasedDecider;
use super::sample_store::TrainingExample;
use super::{
    Decision, DecisionSource, STATUS_LEARNED_OFF, STATUS_LEARNED_ON, STATUS_NO_TRAINING,
    STATUS_ONLINE,
};

/// Who is in control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Offline,
    Online,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Offline => "offline",
            Self::Online => "online",
        })
    }
}

/// Result of one arbitration cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleOutcome {
    /// Source selected before safety post-processing.
    pub source: DecisionSource,
    /// Final decision, safety policy applied.
    pub decision: Decision,
}

/// Online/offline state machine plus the latched remote outputs.
#[derive(Debug, Default)]
pub struct ModeArbiter {
    mode: Mode,
    remote_relay: bool,
    remote_alarm: bool,
    trip_latched: bool,
}

impl ModeArbiter {
    pub const fn new() -> Self {
        Self {
            mode: Mode::Offline,
            remote_relay: false,
            remote_alarm: false,
            trip_latched: false,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Whether the safety policy overrode the previous cycle.
    pub fn is_tripped(&self) -> bool {
        self.trip_latched
    }

    /// Run one cycle.
    pub fn cycle<const N: usize>(
        &mut self,
        ctx: &CycleContext,
        predictor: &mut Predictor<N>,
        rules: &RuleBasedDecider,
        safety: &SafetyPolicy,
        sink: &mut impl EventSink,
    ) -> CycleOutcome {
        self.track_connectivity(ctx, sink);

        let source = match self.mode {
            Mode::Online => self.online(ctx, predictor, sink),
            Mode::Offline => {
                if let Some(cmd) = ctx.command {
                    debug!("Dropping {:?} received while offline", cmd);
                }
                if predictor.sample_count() == 0 {
                    DecisionSource::RuleBased
                } else {
                    DecisionSource::Learned
                }
            }
        };

        let proposed = self.resolve(source, ctx, predictor, rules);
        let decision = safety.apply(proposed, &ctx.observation);

        let tripped = safety.is_tripped(&ctx.observation);
        if tripped && !self.trip_latched {
            error!(
                "Overheat {:.1}C > {:.1}C: heater cut ({} mode)",
                ctx.observation.temperature_c,
                safety.safe_temperature_c(),
                self.mode
            );
            sink.emit(&AppEvent::SafetyTrip {
                mode: self.mode,
                temperature_c: ctx.observation.temperature_c,
            });
        } else if !tripped && self.trip_latched {
            info!("Temperature back under threshold");
        }
        self.trip_latched = tripped;

        CycleOutcome { source, decision }
    }

    // ── Internal ──────────────────────────────────────────────

    fn track_connectivity(&mut self, ctx: &CycleContext, sink: &mut impl EventSink) {
        let next = if ctx.connectivity.is_online() {
            Mode::Online
        } else {
            Mode::Offline
        };
        if next == self.mode {
            return;
        }

        match next {
            Mode::Online => {
                // The cloud re-asserts its state after reconnecting.
                self.remote_relay = false;
                self.remote_alarm = false;
                info!("Connectivity up: remote control");
            }
            Mode::Offline => warn!("Connectivity lost: local control"),
        }
        self.mode = next;
        sink.emit(&AppEvent::ConnectivityChanged {
            online: next == Mode::Online,
        });
    }

    fn online<const N: usize>(
        &mut self,
        ctx: &CycleContext,
        predictor: &mut Predictor<N>,
        sink: &mut impl EventSink,
    ) -> DecisionSource {
        match ctx.command {
            Some(RemoteCommand::SetRelay(on)) => {
                self.remote_relay = on;
                predictor.train(TrainingExample::labelled(&ctx.observation, on));
                info!(
                    "Remote relay {} (samples: {})",
                    if on { "ON" } else { "OFF" },
                    predictor.sample_count()
                );
                sink.emit(&AppEvent::RemoteRelay {
                    on,
                    samples: predictor.sample_count(),
                });
            }
            Some(RemoteCommand::SetAlarm(on)) => {
                self.remote_alarm = on;
            }
            Some(RemoteCommand::RequestLogDump) => {
                sink.emit(&AppEvent::LogDumpRequested);
            }
            Some(RemoteCommand::Unrecognized) => {
                debug!("Ignoring unrecognized remote command");
            }
            None => {}
        }

        DecisionSource::Remote(Decision {
            relay: self.remote_relay,
            alarm: self.remote_alarm,
            indicator: self.remote_relay,
            status: STATUS_ONLINE,
        })
    }

    fn resolve<const N: usize>(
        &self,
        source: DecisionSource,
        ctx: &CycleContext,
        predictor: &Predictor<N>,
        rules: &RuleBasedDecider,
    ) -> Decision {
        match source {
            DecisionSource::Remote(decision) => decision,
            DecisionSource::RuleBased => Decision {
                relay: false,
                indicator: false,
                status: STATUS_NO_TRAINING,
                ..rules.decide(&ctx.observation)
            },
            DecisionSource::Learned => {
                let on = predictor.predict(&ctx.observation);
                Decision {
                    relay: on,
                    alarm: false,
                    indicator: on,
                    status: if on { STATUS_LEARNED_ON } else { STATUS_LEARNED_OFF },
                }
            }
        }
    }
}
