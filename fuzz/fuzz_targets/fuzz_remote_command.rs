//! Fuzz target: `RemoteCommand::from_json`
//!
//! Arbitrary MQTT RPC payloads must decode to a command or a typed error,
//! never panic, and decode identically when seen twice.
//!
//! cargo fuzz run fuzz_remote_command

#![no_main]

use libfuzzer_sys::fuzz_target;
use smartiron::app::commands::RemoteCommand;

fuzz_target!(|data: &[u8]| {
    let first = RemoteCommand::from_json(data);
    assert_eq!(first, RemoteCommand::from_json(data));
});
