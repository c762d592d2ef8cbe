//! Actuator drivers, the status display, and hardware initialisation.

pub mod display;
pub mod hw_init;
pub mod outputs;
