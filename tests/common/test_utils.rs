//! Test utilities and helper functions

use crate::common::simulator::{SimClock, Simulator};
use fpga_i2c::common::Logger;
use fpga_i2c::i2c::{FpgaI2cBus, FpgaI2cConfig};
use std::fmt::Arguments;
use std::sync::{Arc, Mutex};

pub type SimBus<L = RecordingLogger> = FpgaI2cBus<Simulator, SimClock, L>;

/// Logger that keeps every line for later inspection
#[derive(Clone, Default)]
pub struct RecordingLogger {
    lines: Arc<Mutex<Vec<String>>>,
}

impl RecordingLogger {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|line| line.contains(needle))
    }

    fn push(&self, level: &str, args: Arguments<'_>) {
        self.lines.lock().unwrap().push(format!("{level}: {args}"));
    }
}

impl Logger for RecordingLogger {
    fn debug(&mut self, args: Arguments<'_>) {
        self.push("debug", args);
    }

    fn warn(&mut self, args: Arguments<'_>) {
        self.push("warn", args);
    }

    fn error(&mut self, args: Arguments<'_>) {
        self.push("error", args);
    }
}

/// Create a bus over a fresh simulator with default timing
///
/// Returns (bus, simulator, logger) where the simulator and logger are clones
/// sharing state with the ones the bus owns. The clock advances 10 us per
/// reading, so a 100 ms busy-wait gives up after 10k polls.
pub fn create_bus(channels: usize) -> (SimBus, Simulator, RecordingLogger) {
    create_bus_with(channels, FpgaI2cConfig::default(), SimClock::new(10))
}

pub fn create_bus_with(
    channels: usize,
    config: FpgaI2cConfig,
    clock: SimClock,
) -> (SimBus, Simulator, RecordingLogger) {
    let sim = Simulator::with_clock(&clock);
    let logger = RecordingLogger::default();
    let bus = FpgaI2cBus::new(sim.clone(), clock, config, channels, logger.clone())
        .expect("failed to attach simulated bus");
    (bus, sim, logger)
}
