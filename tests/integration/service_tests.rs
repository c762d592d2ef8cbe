//! AppService orchestration: telemetry pacing, display frames, console.

use smartiron::app::commands::{ConsoleCommand, RemoteCommand};
use smartiron::app::events::AppEvent;
use smartiron::app::service::AppService;
use smartiron::config::SystemConfig;
use smartiron::control::STATUS_ONLINE;
use smartiron::sensors::fabric::FabricKind;

use crate::mock_hw::{MockHardware, MockNetwork, RecordingSink};

fn make_app() -> (AppService, MockHardware, RecordingSink) {
    let mut app = AppService::new(SystemConfig::default());
    let mut sink = RecordingSink::new();
    app.start(&mut sink);
    (app, MockHardware::new(), sink)
}

#[test]
fn start_emits_a_single_boot_event() {
    let (_app, _hw, sink) = make_app();
    assert_eq!(sink.events, [AppEvent::Boot]);
}

#[test]
fn every_tick_polls_and_actuates() {
    let (mut app, mut hw, mut sink) = make_app();
    let mut net = MockNetwork::offline();
    for _ in 0..3 {
        app.tick(&mut hw, &mut net, &mut sink);
    }
    assert_eq!(net.polls, 3);
    assert_eq!(hw.applied.len(), 3);
    assert_eq!(hw.frames.len(), 3);
    assert_eq!(app.tick_count(), 3);
}

#[test]
fn telemetry_is_paced_by_interval() {
    let (mut app, mut hw, mut sink) = make_app();
    let mut net = MockNetwork::online();
    // 2000 ms / 500 ms = one publish every 4 cycles, first one immediately.
    let sent: Vec<bool> = (0..9)
        .map(|_| app.tick(&mut hw, &mut net, &mut sink).telemetry_sent)
        .collect();
    assert_eq!(
        sent,
        [true, false, false, false, true, false, false, false, true]
    );
    assert_eq!(net.published.len(), 3);
}

#[test]
fn no_telemetry_while_offline() {
    let (mut app, mut hw, mut sink) = make_app();
    let mut net = MockNetwork::offline();
    for _ in 0..10 {
        app.tick(&mut hw, &mut net, &mut sink);
    }
    assert!(net.published.is_empty());
}

#[test]
fn telemetry_carries_cycle_state() {
    let (mut app, mut hw, mut sink) = make_app();
    let mut net = MockNetwork::online();
    hw.set_conditions(88.5, 51.0, true);
    hw.fabric = FabricKind::Wool;

    app.tick(&mut hw, &mut net, &mut sink);

    let t = net.published[0];
    assert_eq!(t.temperature, 88.5);
    assert_eq!(t.humidity, 51.0);
    assert!(t.fabric_detected);
    assert_eq!(t.fabric_type, FabricKind::Wool);
    assert_eq!(t.status, STATUS_ONLINE);
}

#[test]
fn failed_publish_does_not_disturb_control() {
    let (mut app, mut hw, mut sink) = make_app();
    let mut net = MockNetwork::online();
    net.fail_publish = true;
    net.send(RemoteCommand::SetRelay(true));

    let report = app.tick(&mut hw, &mut net, &mut sink);

    assert!(!report.telemetry_sent);
    assert!(hw.last_decision().unwrap().relay);
}

#[test]
fn online_frame_shows_temperature_and_object() {
    let (mut app, mut hw, mut sink) = make_app();
    let mut net = MockNetwork::online();
    hw.set_conditions(45.0, 62.0, true);
    app.tick(&mut hw, &mut net, &mut sink);
    assert_eq!(hw.last_frame(), Some(("T:45.0C NET:ON", "Obj:YES H:62%")));

    hw.set_conditions(45.0, 62.0, false);
    app.tick(&mut hw, &mut net, &mut sink);
    assert_eq!(hw.last_frame().unwrap().1, "No object");
}

#[test]
fn offline_frame_counts_samples() {
    let (mut app, mut hw, mut sink) = make_app();
    let mut net = MockNetwork::online();
    net.send(RemoteCommand::SetRelay(false));
    app.tick(&mut hw, &mut net, &mut sink);
    net.set(false, false);
    app.tick(&mut hw, &mut net, &mut sink);
    assert_eq!(hw.last_frame(), Some(("OFFLINE AI L:1", "learned: OFF")));
}

#[test]
fn remote_dump_and_console_commands_become_events() {
    let (mut app, mut hw, mut sink) = make_app();
    let mut net = MockNetwork::online();
    net.send(RemoteCommand::RequestLogDump);
    app.tick(&mut hw, &mut net, &mut sink);
    app.handle_console(ConsoleCommand::ClearLogs, &mut sink);
    app.handle_console(ConsoleCommand::DumpLogs, &mut sink);

    assert_eq!(sink.count(|e| *e == AppEvent::LogDumpRequested), 2);
    assert_eq!(sink.count(|e| *e == AppEvent::LogClearRequested), 1);
}

#[test]
fn reconnect_forgets_stale_remote_relay() {
    let (mut app, mut hw, mut sink) = make_app();
    let mut net = MockNetwork::online();
    hw.set_conditions(60.0, 40.0, true);
    net.send(RemoteCommand::SetRelay(true));
    app.tick(&mut hw, &mut net, &mut sink);
    assert!(hw.last_decision().unwrap().relay);

    net.set(false, false);
    app.tick(&mut hw, &mut net, &mut sink);
    net.set(true, true);
    app.tick(&mut hw, &mut net, &mut sink);

    assert!(!hw.last_decision().unwrap().relay);
}
