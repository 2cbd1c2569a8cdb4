// Licensed under the Apache-2.0 license

//! embedded-hal adapter for FPGA I2C channels.
//!
//! Lets generic device drivers written against `embedded_hal::i2c::I2c` run
//! on a channel of the FPGA controller. Each operation becomes one hardware
//! transfer with its own start and stop; a whole `transaction` runs under a
//! single bus lock so no other channel can interleave.

use embedded_hal::i2c::{Operation, SevenBitAddress};
use heapless::Vec;

use crate::common::{Logger, NoOpLogger};
use crate::i2c::common::{ArgumentError, Error, Message, MAX_MESSAGES};
use crate::i2c::traits::I2cAlgorithm;

pub struct I2cController<H: I2cAlgorithm<Error = Error>, L: Logger = NoOpLogger> {
    pub hardware: H,
    pub logger: L,
}

impl<H: I2cAlgorithm<Error = Error>> I2cController<H, NoOpLogger> {
    #[must_use]
    pub fn new(hardware: H) -> Self {
        Self {
            hardware,
            logger: NoOpLogger,
        }
    }
}

impl<H: I2cAlgorithm<Error = Error>, L: Logger> I2cController<H, L> {
    #[must_use]
    pub fn with_logger(hardware: H, logger: L) -> Self {
        Self { hardware, logger }
    }

    pub fn into_inner(self) -> H {
        self.hardware
    }

    fn run(&mut self, messages: &mut [Message<'_>]) -> Result<(), Error> {
        let address = messages.first().map_or(0, Message::address);
        self.hardware.transfer(messages).map(|_| ()).map_err(|err| {
            self.logger
                .debug(format_args!("i2c {:#04x}: {}", address, err));
            err
        })
    }
}

impl<H: I2cAlgorithm<Error = Error>, L: Logger> embedded_hal::i2c::ErrorType
    for I2cController<H, L>
{
    type Error = Error;
}

impl<H: I2cAlgorithm<Error = Error>, L: Logger> embedded_hal::i2c::I2c for I2cController<H, L> {
    fn read(&mut self, addr: SevenBitAddress, buffer: &mut [u8]) -> Result<(), Self::Error> {
        self.run(&mut [Message::read(addr, buffer)])
    }

    fn write(&mut self, addr: SevenBitAddress, bytes: &[u8]) -> Result<(), Self::Error> {
        self.run(&mut [Message::write(addr, bytes)])
    }

    fn write_read(
        &mut self,
        addr: SevenBitAddress,
        bytes: &[u8],
        buffer: &mut [u8],
    ) -> Result<(), Self::Error> {
        self.run(&mut [Message::write(addr, bytes), Message::read(addr, buffer)])
    }

    fn transaction(
        &mut self,
        addr: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if operations.is_empty() {
            return Ok(());
        }
        let mut messages: Vec<Message<'_>, MAX_MESSAGES> = Vec::new();
        for operation in operations.iter_mut() {
            let message = match operation {
                Operation::Read(buffer) => Message::read(addr, &mut **buffer),
                Operation::Write(bytes) => Message::write(addr, *bytes),
            };
            messages
                .push(message)
                .map_err(|_| ArgumentError::TooManyMessages)?;
        }
        self.run(&mut messages)
    }
}
