// Licensed under the Apache-2.0 license

//! # FPGA I2C Abstraction Traits
//!
//! The engine is written against three small seams so it can drive real
//! memory-mapped hardware or run against a simulator in host tests:
//!
//! ```text
//! RegisterIo   (32-bit register window: real MMIO or a simulator)
//! Clock        (monotonic microsecond time for busy-wait deadlines)
//! I2cAlgorithm (what a bus client sees: raw transfers + SMBus)
//! ```

use fugit::TimerInstantU64;

use crate::i2c::common::{Direction, Functionality, Message, SmbusData, SmbusSize};

/// Microsecond-resolution instant used for busy-wait deadlines.
pub type Instant = TimerInstantU64<1_000_000>;

/// Access to one controller's register window.
///
/// Offsets are byte offsets from the window base and always 4-byte aligned.
/// Implementations must not cache values: the hardware changes Status and
/// the RX FIFO on its own once a transfer is started.
pub trait RegisterIo {
    fn read32(&mut self, offset: u32) -> u32;
    fn write32(&mut self, offset: u32, value: u32);
}

/// Monotonic time source.
///
/// The busy-wait loop reads it on every iteration without yielding, so it
/// must be cheap. Tests inject a clock that advances per call.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Bus-level operations offered to device drivers.
///
/// # Examples
///
/// ```rust,ignore
/// use fpga_i2c::i2c::{I2cAlgorithm, Message};
///
/// fn read_eeprom<T: I2cAlgorithm>(bus: &T) -> Result<[u8; 4], T::Error> {
///     let mut data = [0u8; 4];
///     bus.transfer(&mut [Message::write(0x50, &[0x00]), Message::read(0x50, &mut data)])?;
///     Ok(data)
/// }
/// ```
pub trait I2cAlgorithm {
    type Error: embedded_hal::i2c::Error + core::fmt::Debug;

    /// Execute `messages` in order as one locked sequence.
    ///
    /// # Errors
    ///
    /// Fails as a whole; a mid-list failure carries no partial count.
    fn transfer(&self, messages: &mut [Message<'_>]) -> Result<usize, Self::Error>;

    /// Execute one SMBus transaction.
    ///
    /// # Errors
    ///
    /// Returns an error for unsupported sizes, mismatched payloads, or any
    /// controller failure.
    fn smbus_xfer(
        &self,
        address: u8,
        direction: Direction,
        command: u8,
        size: SmbusSize,
        payload: SmbusData,
    ) -> Result<SmbusData, Self::Error>;

    fn functionality(&self) -> Functionality;
}

#[cfg(feature = "std")]
mod std_clock {
    use super::{Clock, Instant};

    /// [`Clock`] backed by `std::time::Instant`.
    pub struct StdClock {
        origin: std::time::Instant,
    }

    impl Default for StdClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl StdClock {
        #[must_use]
        pub fn new() -> Self {
            Self {
                origin: std::time::Instant::now(),
            }
        }
    }

    impl Clock for StdClock {
        fn now(&self) -> Instant {
            let micros = u64::try_from(self.origin.elapsed().as_micros()).unwrap_or(u64::MAX);
            Instant::from_ticks(micros)
        }
    }
}

#[cfg(feature = "std")]
pub use std_clock::StdClock;
