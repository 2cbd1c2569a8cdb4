//! Common test utilities and the FPGA controller simulator
#![allow(dead_code)]

pub mod test_utils;

pub use simulator::{SimClock, Simulator, NACK_CODE};
pub use test_utils::{create_bus, create_bus_with, RecordingLogger, SimBus};
