//! Black-box log wired behind the service, the way the firmware runs it.

use smartiron::adapters::blackbox::{BLACKBOX_SLOTS, BlackBox};
use smartiron::adapters::time::UptimeClock;
use smartiron::app::commands::{ConsoleCommand, RemoteCommand};
use smartiron::app::events::EventCategory;
use smartiron::app::service::AppService;
use smartiron::config::SystemConfig;

use crate::mock_hw::{MockHardware, MockNetwork, MockNvs, RecordingSink};

type Sink = (RecordingSink, BlackBox<MockNvs>);

fn make_app() -> (AppService, MockHardware, Sink) {
    let mut app = AppService::new(SystemConfig::default());
    let mut sink = (
        RecordingSink::new(),
        BlackBox::new(MockNvs::new(), UptimeClock::new()),
    );
    app.start(&mut sink);
    (app, MockHardware::new(), sink)
}

fn categories(bb: &BlackBox<MockNvs>) -> Vec<EventCategory> {
    bb.entries().iter().map(|e| e.category).collect()
}

#[test]
fn session_history_is_recorded() {
    let (mut app, mut hw, mut sink) = make_app();
    let mut net = MockNetwork::online();
    net.send(RemoteCommand::SetRelay(true));
    app.tick(&mut hw, &mut net, &mut sink);

    hw.set_conditions(190.0, 20.0, true);
    net.set(false, false);
    app.tick(&mut hw, &mut net, &mut sink);

    assert_eq!(
        categories(&sink.1),
        [
            EventCategory::Boot,
            EventCategory::Net,
            EventCategory::Auto,
            EventCategory::Net,
            EventCategory::Alert,
        ]
    );
    // Both sinks saw the same stream.
    assert_eq!(sink.0.events.len(), 5);
}

#[test]
fn console_clear_leaves_only_the_note() {
    let (mut app, mut hw, mut sink) = make_app();
    let mut net = MockNetwork::online();
    app.tick(&mut hw, &mut net, &mut sink);
    assert_eq!(sink.1.len(), 2);

    app.handle_console(ConsoleCommand::ClearLogs, &mut sink);

    assert_eq!(categories(&sink.1), [EventCategory::Sys]);
}

#[test]
fn dump_request_is_itself_logged() {
    let (mut app, _hw, mut sink) = make_app();
    app.handle_console(ConsoleCommand::DumpLogs, &mut sink);
    assert_eq!(categories(&sink.1), [EventCategory::Boot, EventCategory::Sys]);
    assert_eq!(sink.1.dump(), 2);
}

#[test]
fn log_is_bounded() {
    let (mut app, mut hw, mut sink) = make_app();
    let mut net = MockNetwork::offline();
    for i in 0..(BLACKBOX_SLOTS * 2) {
        let up = i % 2 == 0;
        net.set(up, up);
        app.tick(&mut hw, &mut net, &mut sink);
    }
    assert_eq!(sink.1.len(), BLACKBOX_SLOTS);
    assert_eq!(sink.1.entries().len(), BLACKBOX_SLOTS);
    // slots plus the head index
    assert_eq!(sink.1.storage().keys(), BLACKBOX_SLOTS + 1);
}
