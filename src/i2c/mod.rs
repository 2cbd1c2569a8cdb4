// Licensed under the Apache-2.0 license

//! FPGA-mediated I2C/SMBus bus controller.
//!
//! The FPGA exposes one register block per physical controller: Config,
//! Control, Status, a TX and an RX FIFO of 32-bit words, and a
//! channel-select register that routes the controller to one of several
//! downstream buses. This module drives that block as an I2C master and
//! SMBus transaction engine for the sensor, PMBus and PSU drivers above it.

pub mod common;
pub mod fpga_i2c;
pub mod hardware_instantiation;
pub mod i2c_controller;
pub mod mmio;
pub mod registers;
pub mod smbus;
pub mod traits;

pub use common::{
    ArgumentError, Block, ConfigurationError, Direction, Error, FpgaI2cConfig,
    FpgaI2cConfigBuilder, Functionality, IoFault, Message, SmbusData, SmbusSize,
};
pub use fpga_i2c::{ChannelLock, FpgaI2cBus, FpgaI2cChannel};
pub use hardware_instantiation::{attach_mmio, instantiate_channels};
pub use i2c_controller::I2cController;
pub use mmio::MmioRegisters;
pub use traits::{Clock, I2cAlgorithm, Instant, RegisterIo};

#[cfg(feature = "std")]
pub use traits::StdClock;
