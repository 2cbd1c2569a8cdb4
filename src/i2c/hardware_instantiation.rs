// Licensed under the Apache-2.0 license

//! # Attaching FPGA I2C Controllers
//!
//! Platform enumeration (PCI BAR mapping or a device tree) hands the driver
//! a base address, a window length and the number of logical channels wired
//! behind the controller. This module turns that into a [`FpgaI2cBus`] and a
//! flat array of channel handles that can be indexed by bus number:
//!
//! ```rust,ignore
//! let bus = unsafe { attach_mmio(base, len, 8, clock, FpgaI2cConfig::default(), NoOpLogger)? };
//! let channels = instantiate_channels(&bus);
//!
//! let temp = channels[2].read_word_data(0x48, 0x00)?;
//! channels[5].write_byte_data(0x70, 0x00, 0x04)?;
//! ```
//!
//! All handles borrow the same bus, so the channel-select register is
//! shared through one lock no matter which handle is used.

use core::ptr::NonNull;

use heapless::Vec;

use crate::common::Logger;
use crate::i2c::common::{ConfigurationError, FpgaI2cConfig, MAX_CHANNELS};
use crate::i2c::fpga_i2c::{FpgaI2cBus, FpgaI2cChannel};
use crate::i2c::mmio::MmioRegisters;
use crate::i2c::registers::FPGA_I2C_WINDOW_SIZE;
use crate::i2c::traits::{Clock, RegisterIo};

/// Bus driving a memory-mapped controller.
pub type MmioBus<C, L> = FpgaI2cBus<MmioRegisters, C, L>;

/// Attach to a memory-mapped controller.
///
/// # Safety
///
/// `base` must stay mapped for `window_len` bytes for the life of the
/// returned bus, and no other code may access the window meanwhile.
///
/// # Errors
///
/// - [`ConfigurationError::BadWindow`] for a null or misaligned base.
/// - [`ConfigurationError::WindowTooSmall`] if the window does not cover the
///   register map.
/// - [`ConfigurationError::ChannelCount`] for 0 or more than
///   [`MAX_CHANNELS`] channels.
pub unsafe fn attach_mmio<C: Clock, L: Logger>(
    base: *mut u32,
    window_len: usize,
    channel_count: usize,
    clock: C,
    config: FpgaI2cConfig,
    logger: L,
) -> Result<MmioBus<C, L>, ConfigurationError> {
    if window_len < FPGA_I2C_WINDOW_SIZE {
        return Err(ConfigurationError::WindowTooSmall);
    }
    let base = NonNull::new(base).ok_or(ConfigurationError::BadWindow)?;
    if !base.as_ptr().is_aligned() {
        return Err(ConfigurationError::BadWindow);
    }
    // SAFETY: the caller guarantees the window outlives the bus and is ours
    // alone; size and alignment were checked above.
    let regs = unsafe { MmioRegisters::new(base) };
    FpgaI2cBus::new(regs, clock, config, channel_count, logger)
}

/// One handle per logical channel, indexed by channel number.
#[must_use]
pub fn instantiate_channels<R: RegisterIo, C: Clock, L: Logger>(
    bus: &FpgaI2cBus<R, C, L>,
) -> Vec<FpgaI2cChannel<'_, R, C, L>, MAX_CHANNELS> {
    let mut channels = Vec::new();
    for index in 0..bus.channel_count() {
        if let Ok(channel) = bus.channel(index) {
            if channels.push(channel).is_err() {
                break;
            }
        }
    }
    channels
}
