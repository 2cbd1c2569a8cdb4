// Licensed under the Apache-2.0 license

//! SMBus transactions on top of the single-transfer executor.
//!
//! | size       | read: tx / rx       | write: tx                   |
//! |------------|---------------------|-----------------------------|
//! | byte       | 0 / 1               | `[command]`                 |
//! | byte-data  | 1 / 1               | `[command, data]`           |
//! | word-data  | 1 / 2               | `[command, low, high]`      |
//! | block-data | 1 / 33 (fixed)      | `[command, count, data..]`  |
//!
//! Words travel low byte first in both directions.

use crate::common::Logger;
use crate::i2c::common::{
    ArgumentError, Block, Direction, Error, Functionality, IoFault, Message, SmbusData,
    SmbusSize, BLOCK_READ_WINDOW, MAX_MESSAGE_LEN, SMBUS_BLOCK_MAX,
};
use crate::i2c::fpga_i2c::{check_address, ChannelLock, FpgaI2cChannel};
use crate::i2c::traits::{Clock, I2cAlgorithm, RegisterIo};

/// What this controller can do: plain I2C plus emulated byte, byte-data,
/// word-data and block-data SMBus transactions. No quick command.
pub const FUNCTIONALITY: Functionality = Functionality::I2C
    .union(Functionality::SMBUS_BYTE)
    .union(Functionality::SMBUS_BYTE_DATA)
    .union(Functionality::SMBUS_WORD_DATA)
    .union(Functionality::SMBUS_BLOCK_DATA);

/// Find the block inside a fixed-size block-read window.
///
/// The controller may return zero padding ahead of the count byte, so the
/// first byte in `1..=SMBUS_BLOCK_MAX` is taken as the count. If that count
/// runs past the end of the window the read has no usable block.
#[must_use]
pub fn scan_block(window: &[u8]) -> Option<Block> {
    let (index, len) = window.iter().enumerate().find_map(|(index, &count)| {
        let len = usize::from(count);
        (1..=SMBUS_BLOCK_MAX)
            .contains(&len)
            .then_some((index, len))
    })?;
    let payload = window.get(index + 1..index + 1 + len)?;
    Block::from_slice(payload).ok()
}

fn expect_none(payload: &SmbusData) -> Result<(), Error> {
    match payload {
        SmbusData::None => Ok(()),
        _ => Err(ArgumentError::PayloadMismatch.into()),
    }
}

impl<R: RegisterIo, C: Clock, L: Logger> ChannelLock<'_, R, C, L> {
    /// Execute one SMBus transaction on the locked channel.
    ///
    /// # Errors
    ///
    /// - [`ArgumentError::UnsupportedSize`] for any size other than byte,
    ///   byte-data, word-data or block-data, before any register access.
    /// - [`ArgumentError::PayloadMismatch`] / [`ArgumentError::BlockLength`]
    ///   for write payloads that do not fit `size`.
    /// - [`IoFault::NoBlockLength`] when a block read returns no usable
    ///   count byte.
    /// - Controller errors as for [`ChannelLock::transfer`].
    pub fn smbus_xfer(
        &mut self,
        address: u8,
        direction: Direction,
        command: u8,
        size: SmbusSize,
        payload: SmbusData,
    ) -> Result<SmbusData, Error> {
        check_address(address)?;
        match (size, direction) {
            (SmbusSize::Byte, Direction::Read) => {
                let mut rx = [0u8; 1];
                self.execute(address, &[], &mut rx)?;
                let [value] = rx;
                Ok(SmbusData::Byte(value))
            }
            (SmbusSize::Byte, Direction::Write) => {
                expect_none(&payload)?;
                self.execute(address, &[command], &mut [])?;
                Ok(SmbusData::None)
            }
            (SmbusSize::ByteData, Direction::Read) => {
                let mut rx = [0u8; 1];
                self.execute(address, &[command], &mut rx)?;
                let [value] = rx;
                Ok(SmbusData::Byte(value))
            }
            (SmbusSize::ByteData, Direction::Write) => {
                let SmbusData::Byte(value) = payload else {
                    return Err(ArgumentError::PayloadMismatch.into());
                };
                self.execute(address, &[command, value], &mut [])?;
                Ok(SmbusData::None)
            }
            (SmbusSize::WordData, Direction::Read) => {
                let mut rx = [0u8; 2];
                self.execute(address, &[command], &mut rx)?;
                Ok(SmbusData::Word(u16::from_le_bytes(rx)))
            }
            (SmbusSize::WordData, Direction::Write) => {
                let SmbusData::Word(word) = payload else {
                    return Err(ArgumentError::PayloadMismatch.into());
                };
                let [low, high] = word.to_le_bytes();
                self.execute(address, &[command, low, high], &mut [])?;
                Ok(SmbusData::None)
            }
            (SmbusSize::BlockData, Direction::Read) => {
                let mut window = [0u8; BLOCK_READ_WINDOW];
                self.execute(address, &[command], &mut window)?;
                match scan_block(&window) {
                    Some(block) => Ok(SmbusData::Block(block)),
                    None => {
                        let channel = self.channel();
                        self.log_error(format_args!(
                            "fpga i2c: ch {} addr {:#04x}: no block length in reply to {:#04x}",
                            channel, address, command
                        ));
                        Err(IoFault::NoBlockLength.into())
                    }
                }
            }
            (SmbusSize::BlockData, Direction::Write) => {
                let SmbusData::Block(block) = payload else {
                    return Err(ArgumentError::PayloadMismatch.into());
                };
                let count = u8::try_from(block.len()).map_err(|_| ArgumentError::BlockLength)?;
                if count == 0 {
                    return Err(ArgumentError::BlockLength.into());
                }
                let mut tx: heapless::Vec<u8, MAX_MESSAGE_LEN> = heapless::Vec::new();
                tx.extend_from_slice(&[command, count])
                    .and_then(|()| tx.extend_from_slice(&block))
                    .map_err(|()| ArgumentError::BlockLength)?;
                self.execute(address, &tx, &mut [])?;
                Ok(SmbusData::None)
            }
            _ => Err(ArgumentError::UnsupportedSize.into()),
        }
    }
}

impl<'a, R: RegisterIo, C: Clock, L: Logger> FpgaI2cChannel<'a, R, C, L> {
    /// Execute one SMBus transaction, holding the bus only for its duration.
    ///
    /// # Errors
    ///
    /// See [`ChannelLock::smbus_xfer`].
    pub fn smbus_xfer(
        &self,
        address: u8,
        direction: Direction,
        command: u8,
        size: SmbusSize,
        payload: SmbusData,
    ) -> Result<SmbusData, Error> {
        self.lock()
            .smbus_xfer(address, direction, command, size, payload)
    }

    /// # Errors
    ///
    /// See [`ChannelLock::smbus_xfer`].
    pub fn read_byte(&self, address: u8) -> Result<u8, Error> {
        match self.smbus_xfer(address, Direction::Read, 0, SmbusSize::Byte, SmbusData::None)? {
            SmbusData::Byte(value) => Ok(value),
            _ => Err(ArgumentError::PayloadMismatch.into()),
        }
    }

    /// # Errors
    ///
    /// See [`ChannelLock::smbus_xfer`].
    pub fn write_byte(&self, address: u8, value: u8) -> Result<(), Error> {
        self.smbus_xfer(address, Direction::Write, value, SmbusSize::Byte, SmbusData::None)
            .map(|_| ())
    }

    /// # Errors
    ///
    /// See [`ChannelLock::smbus_xfer`].
    pub fn read_byte_data(&self, address: u8, command: u8) -> Result<u8, Error> {
        match self.smbus_xfer(
            address,
            Direction::Read,
            command,
            SmbusSize::ByteData,
            SmbusData::None,
        )? {
            SmbusData::Byte(value) => Ok(value),
            _ => Err(ArgumentError::PayloadMismatch.into()),
        }
    }

    /// # Errors
    ///
    /// See [`ChannelLock::smbus_xfer`].
    pub fn write_byte_data(&self, address: u8, command: u8, value: u8) -> Result<(), Error> {
        self.smbus_xfer(
            address,
            Direction::Write,
            command,
            SmbusSize::ByteData,
            SmbusData::Byte(value),
        )
        .map(|_| ())
    }

    /// # Errors
    ///
    /// See [`ChannelLock::smbus_xfer`].
    pub fn read_word_data(&self, address: u8, command: u8) -> Result<u16, Error> {
        match self.smbus_xfer(
            address,
            Direction::Read,
            command,
            SmbusSize::WordData,
            SmbusData::None,
        )? {
            SmbusData::Word(value) => Ok(value),
            _ => Err(ArgumentError::PayloadMismatch.into()),
        }
    }

    /// # Errors
    ///
    /// See [`ChannelLock::smbus_xfer`].
    pub fn write_word_data(&self, address: u8, command: u8, value: u16) -> Result<(), Error> {
        self.smbus_xfer(
            address,
            Direction::Write,
            command,
            SmbusSize::WordData,
            SmbusData::Word(value),
        )
        .map(|_| ())
    }

    /// # Errors
    ///
    /// See [`ChannelLock::smbus_xfer`].
    pub fn read_block_data(&self, address: u8, command: u8) -> Result<Block, Error> {
        match self.smbus_xfer(
            address,
            Direction::Read,
            command,
            SmbusSize::BlockData,
            SmbusData::None,
        )? {
            SmbusData::Block(block) => Ok(block),
            _ => Err(ArgumentError::PayloadMismatch.into()),
        }
    }

    /// # Errors
    ///
    /// [`ArgumentError::BlockLength`] unless `1 <= data.len() <= 32`; see
    /// also [`ChannelLock::smbus_xfer`].
    pub fn write_block_data(&self, address: u8, command: u8, data: &[u8]) -> Result<(), Error> {
        let block = Block::from_slice(data).map_err(|()| ArgumentError::BlockLength)?;
        self.smbus_xfer(
            address,
            Direction::Write,
            command,
            SmbusSize::BlockData,
            SmbusData::Block(block),
        )
        .map(|_| ())
    }
}

impl<R: RegisterIo, C: Clock, L: Logger> I2cAlgorithm for FpgaI2cChannel<'_, R, C, L> {
    type Error = Error;

    fn transfer(&self, messages: &mut [Message<'_>]) -> Result<usize, Self::Error> {
        FpgaI2cChannel::transfer(self, messages)
    }

    fn smbus_xfer(
        &self,
        address: u8,
        direction: Direction,
        command: u8,
        size: SmbusSize,
        payload: SmbusData,
    ) -> Result<SmbusData, Self::Error> {
        FpgaI2cChannel::smbus_xfer(self, address, direction, command, size, payload)
    }

    fn functionality(&self) -> Functionality {
        FUNCTIONALITY
    }
}
