//! Adaptive control engine.
//!
//! Everything that decides what the heater does lives here; nothing in
//! this module touches hardware or the network.
//!
//! ```text
//!  CycleContext ──▶ ModeArbiter ──┬─ Online  ─▶ Remote(Decision)
//!                                 └─ Offline ─┬▶ RuleBased   (untrained)
//!                                             └▶ Learned     (Predictor)
//!                                       │
//!                                       ▼
//!                                 SafetyPolicy ──▶ Decision
//! ```

pub mod arbiter;
pub mod context;
pub mod predictor;
pub mod rules;
pub mod sample_store;

// ---------------------------------------------------------------------------
// Status strings shown on the display and reported in telemetry
// ---------------------------------------------------------------------------

pub const STATUS_NO_OBJECT: &str = "no object";
pub const STATUS_HEATING_SAFE: &str = "heating (safe)";
pub const STATUS_OVERHEAT_ALERT: &str = "overheat alert";
pub const STATUS_COOLDOWN_REQUIRED: &str = "cooldown required";
pub const STATUS_NO_TRAINING: &str = "no training data";
pub const STATUS_LEARNED_ON: &str = "learned: ON";
pub const STATUS_LEARNED_OFF: &str = "learned: OFF";
pub const STATUS_ONLINE: &str = "online (learning)";
pub const STATUS_SAFETY_TRIP: &str = "safety trip: overheat";

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// Complete actuator state for one cycle.
///
/// A new value is produced every cycle and replaces the previous one
/// wholesale; actuators never see a partially updated decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    /// Heating relay energised.
    pub relay: bool,
    /// Buzzer sounding.
    pub alarm: bool,
    /// Heating indicator LED lit.
    pub indicator: bool,
    /// Short human-readable status.
    pub status: &'static str,
}

impl Decision {
    /// Everything off.
    pub const fn off(status: &'static str) -> Self {
        Self {
            relay: false,
            alarm: false,
            indicator: false,
            status,
        }
    }
}

/// Where a cycle's decision came from, before safety post-processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionSource {
    /// Online pass-through of the remotely commanded state.
    Remote(Decision),
    /// Deterministic rules; used offline while the predictor is untrained.
    RuleBased,
    /// Nearest-neighbor prediction from remote-labelled examples.
    Learned,
}

impl DecisionSource {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Remote(_) => "remote",
            Self::RuleBased => "rules",
            Self::Learned => "learned",
        }
    }
}
