//! Application core — pure domain logic, zero I/O.
//!
//! Wires the adaptive control engine ([`crate::control`]) and the safety
//! policy to the outside world.  All interaction with hardware and the
//! network happens through **port traits** defined in [`ports`], keeping
//! this layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
