//! End-to-end behaviour scenarios for the control engine.
//!
//! Each test drives [`AppService`] through mock ports exactly as the
//! firmware loop does and asserts on what reached the actuators.

use smartiron::app::commands::RemoteCommand;
use smartiron::app::events::AppEvent;
use smartiron::app::service::AppService;
use smartiron::config::SystemConfig;
use smartiron::control::arbiter::Mode;
use smartiron::control::context::Observation;
use smartiron::control::predictor::{Predictor, PredictorParams};
use smartiron::control::sample_store::TrainingExample;
use smartiron::control::{
    DecisionSource, STATUS_LEARNED_ON, STATUS_NO_TRAINING, STATUS_SAFETY_TRIP,
};

use crate::mock_hw::{MockHardware, MockNetwork, RecordingSink};

fn make_app() -> (AppService, MockHardware, RecordingSink) {
    let mut app = AppService::new(SystemConfig::default());
    let mut sink = RecordingSink::new();
    app.start(&mut sink);
    (app, MockHardware::new(), sink)
}

// ── A: majority of close, ON-labelled neighbors ──────────────

#[test]
fn scenario_a_close_on_neighbors_predict_on() {
    let mut p: Predictor<20> = Predictor::new(PredictorParams::default());
    for t in [20.0, 21.0, 22.0] {
        p.train(TrainingExample::new(t, 40.0, true, true));
    }
    assert!(p.predict(&Observation::new(21.0, 40.5, true)));
}

// ── B: untrained and offline ─────────────────────────────────

#[test]
fn scenario_b_untrained_offline_reports_no_training() {
    let (mut app, mut hw, mut sink) = make_app();
    let mut net = MockNetwork::offline();

    let report = app.tick(&mut hw, &mut net, &mut sink);

    assert_eq!(report.outcome.source, DecisionSource::RuleBased);
    let d = hw.last_decision().unwrap();
    assert_eq!(d.status, STATUS_NO_TRAINING);
    assert!(!d.relay);
}

// ── C: remote set-relay trains with the cycle's snapshot ─────

#[test]
fn scenario_c_remote_relay_records_one_example() {
    let (mut app, mut hw, mut sink) = make_app();
    let mut net = MockNetwork::online();
    hw.set_conditions(25.0, 40.0, true);

    app.tick(&mut hw, &mut net, &mut sink);
    let before = app.sample_count();

    net.send(RemoteCommand::SetRelay(true));
    app.tick(&mut hw, &mut net, &mut sink);

    assert_eq!(app.sample_count(), before + 1);
    assert_eq!(
        app.predictor().samples().newest(),
        Some(&TrainingExample::new(25.0, 40.0, true, true))
    );
    assert!(hw.last_decision().unwrap().relay);
}

// ── D: safety beats remote authority ─────────────────────────

#[test]
fn scenario_d_overheat_overrides_remote_relay() {
    let (mut app, mut hw, mut sink) = make_app();
    let mut net = MockNetwork::online();
    hw.set_conditions(171.0, 40.0, true);
    net.send(RemoteCommand::SetRelay(true));

    let report = app.tick(&mut hw, &mut net, &mut sink);

    let d = hw.last_decision().unwrap();
    assert!(!d.relay);
    assert!(d.alarm);
    assert!(!d.indicator);
    assert_eq!(d.status, STATUS_SAFETY_TRIP);
    assert!(matches!(report.outcome.source, DecisionSource::Remote(r) if r.relay));
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::SafetyTrip { mode: Mode::Online, .. })),
        1
    );
}

#[test]
fn overheat_trip_is_reported_once_per_excursion() {
    let (mut app, mut hw, mut sink) = make_app();
    let mut net = MockNetwork::offline();

    hw.set_conditions(180.0, 30.0, true);
    for _ in 0..5 {
        app.tick(&mut hw, &mut net, &mut sink);
    }
    hw.set_conditions(100.0, 30.0, true);
    app.tick(&mut hw, &mut net, &mut sink);
    hw.set_conditions(175.0, 30.0, true);
    app.tick(&mut hw, &mut net, &mut sink);

    assert_eq!(sink.count(|e| matches!(e, AppEvent::SafetyTrip { .. })), 2);
}

// ── Connectivity edges ───────────────────────────────────────

#[test]
fn link_without_session_then_both_is_one_edge() {
    let (mut app, mut hw, mut sink) = make_app();
    let mut net = MockNetwork::offline();

    net.set(true, false);
    app.tick(&mut hw, &mut net, &mut sink);
    assert_eq!(app.mode(), Mode::Offline);

    net.set(true, true);
    app.tick(&mut hw, &mut net, &mut sink);
    app.tick(&mut hw, &mut net, &mut sink);

    assert_eq!(app.mode(), Mode::Online);
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::ConnectivityChanged { online: true })),
        1
    );
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::ConnectivityChanged { online: false })),
        0
    );
}

#[test]
fn flapping_emits_one_event_per_edge() {
    let (mut app, mut hw, mut sink) = make_app();
    let mut net = MockNetwork::offline();

    for up in [true, true, false, false, true, false] {
        net.set(up, up);
        app.tick(&mut hw, &mut net, &mut sink);
    }

    let edges: Vec<bool> = sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::ConnectivityChanged { online } => Some(*online),
            _ => None,
        })
        .collect();
    assert_eq!(edges, [true, false, true, false]);
}

// ── Learning carries over to offline operation ───────────────

#[test]
fn offline_follows_what_the_cloud_taught() {
    let (mut app, mut hw, mut sink) = make_app();
    let mut net = MockNetwork::online();
    hw.set_conditions(120.0, 45.0, true);
    net.send(RemoteCommand::SetRelay(true));
    app.tick(&mut hw, &mut net, &mut sink);

    net.set(false, false);
    let report = app.tick(&mut hw, &mut net, &mut sink);

    assert_eq!(report.outcome.source, DecisionSource::Learned);
    let d = hw.last_decision().unwrap();
    assert!(d.relay && d.indicator && !d.alarm);
    assert_eq!(d.status, STATUS_LEARNED_ON);
}

#[test]
fn commands_are_dropped_while_offline() {
    let (mut app, mut hw, mut sink) = make_app();
    let mut net = MockNetwork::offline();
    net.send(RemoteCommand::SetRelay(true));

    app.tick(&mut hw, &mut net, &mut sink);

    assert_eq!(app.sample_count(), 0);
    assert!(net.pending.is_empty());
    assert!(!hw.last_decision().unwrap().relay);
}

#[test]
fn unreadable_sensor_untrained_stays_off() {
    let (mut app, mut hw, mut sink) = make_app();
    let mut net = MockNetwork::offline();
    hw.set_conditions(-1.0, -1.0, true);

    let report = app.tick(&mut hw, &mut net, &mut sink);

    assert_eq!(report.outcome.source, DecisionSource::RuleBased);
    assert!(!hw.last_decision().unwrap().relay);
}

/// Once trained, the sentinel pair is just another point in feature
/// space: a near-enough ON neighbor carries the vote.
#[test]
fn unreadable_sensor_follows_nearest_neighbor_once_trained() {
    let (mut app, mut hw, mut sink) = make_app();
    let mut net = MockNetwork::online();
    hw.set_conditions(25.0, 40.0, true);
    net.send(RemoteCommand::SetRelay(true));
    app.tick(&mut hw, &mut net, &mut sink);

    net.set(false, false);
    hw.set_conditions(-1.0, -1.0, true);
    let report = app.tick(&mut hw, &mut net, &mut sink);

    assert_eq!(report.outcome.source, DecisionSource::Learned);
    let d = hw.last_decision().unwrap();
    assert!(d.relay && !d.alarm);
    assert_eq!(d.status, STATUS_LEARNED_ON);
}
