// Licensed under the Apache-2.0 license

//! Common types and constants for the FPGA I2C driver modules.
//!
//! This module provides shared definitions for error handling, transfer
//! descriptions, SMBus protocol classes and controller configuration.

use core::fmt;

use bitflags::bitflags;
use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};
use fugit::MicrosDurationU64;

/// Largest SMBus block payload.
pub const SMBUS_BLOCK_MAX: usize = 32;

/// Largest single message: a full block plus command and count bytes.
pub const MAX_MESSAGE_LEN: usize = SMBUS_BLOCK_MAX + 2;

/// 32-bit FIFO slots needed to stage the largest message.
pub const FIFO_WORDS: usize = MAX_MESSAGE_LEN.div_ceil(4);

/// Most messages accepted in one multi-message transfer.
pub const MAX_MESSAGES: usize = 8;

/// Most logical channels multiplexed through one register block.
pub const MAX_CHANNELS: usize = 16;

/// Largest 7-bit target address.
pub const MAX_ADDRESS: u8 = 0x7f;

/// Bytes returned by a block read: count byte plus a full block.
pub const BLOCK_READ_WINDOW: usize = SMBUS_BLOCK_MAX + 1;

pub const DEFAULT_TIMEOUT: MicrosDurationU64 = MicrosDurationU64::millis(100);
pub const DEFAULT_RESET_SETTLE: MicrosDurationU64 = MicrosDurationU64::micros(15);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    Read,
    Write,
}

/// SMBus protocol classes, numbered as the Linux SMBus layer numbers them.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum SmbusSize {
    Quick = 0,
    Byte = 1,
    ByteData = 2,
    WordData = 3,
    ProcCall = 4,
    BlockData = 5,
    I2cBlockBroken = 6,
    BlockProcCall = 7,
    I2cBlockData = 8,
}

impl TryFrom<u32> for SmbusSize {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::Quick,
            1 => Self::Byte,
            2 => Self::ByteData,
            3 => Self::WordData,
            4 => Self::ProcCall,
            5 => Self::BlockData,
            6 => Self::I2cBlockBroken,
            7 => Self::BlockProcCall,
            8 => Self::I2cBlockData,
            _ => return Err(Error::InvalidArgument(ArgumentError::UnsupportedSize)),
        })
    }
}

pub type Block = heapless::Vec<u8, SMBUS_BLOCK_MAX>;

/// Payload of an SMBus transaction.
///
/// Writes carry the data to send; reads return the data received. A byte
/// write sends the command code itself, so it takes [`SmbusData::None`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SmbusData {
    None,
    Byte(u8),
    Word(u16),
    Block(Block),
}

/// One leg of a raw multi-message transfer.
#[derive(Debug, PartialEq, Eq)]
pub enum Message<'a> {
    Read { address: u8, buffer: &'a mut [u8] },
    Write { address: u8, bytes: &'a [u8] },
}

impl<'a> Message<'a> {
    #[must_use]
    pub fn read(address: u8, buffer: &'a mut [u8]) -> Self {
        Self::Read { address, buffer }
    }

    #[must_use]
    pub fn write(address: u8, bytes: &'a [u8]) -> Self {
        Self::Write { address, bytes }
    }

    #[must_use]
    pub fn address(&self) -> u8 {
        match self {
            Self::Read { address, .. } | Self::Write { address, .. } => *address,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Read { buffer, .. } => buffer.len(),
            Self::Write { bytes, .. } => bytes.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn direction(&self) -> Direction {
        match self {
            Self::Read { .. } => Direction::Read,
            Self::Write { .. } => Direction::Write,
        }
    }
}

bitflags! {
    /// Capabilities advertised to bus clients.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct Functionality: u32 {
        const I2C = 0x0000_0001;
        const SMBUS_QUICK = 0x0001_0000;
        const SMBUS_READ_BYTE = 0x0002_0000;
        const SMBUS_WRITE_BYTE = 0x0004_0000;
        const SMBUS_READ_BYTE_DATA = 0x0008_0000;
        const SMBUS_WRITE_BYTE_DATA = 0x0010_0000;
        const SMBUS_READ_WORD_DATA = 0x0020_0000;
        const SMBUS_WRITE_WORD_DATA = 0x0040_0000;
        const SMBUS_READ_BLOCK_DATA = 0x0100_0000;
        const SMBUS_WRITE_BLOCK_DATA = 0x0200_0000;

        const SMBUS_BYTE = Self::SMBUS_READ_BYTE.bits() | Self::SMBUS_WRITE_BYTE.bits();
        const SMBUS_BYTE_DATA =
            Self::SMBUS_READ_BYTE_DATA.bits() | Self::SMBUS_WRITE_BYTE_DATA.bits();
        const SMBUS_WORD_DATA =
            Self::SMBUS_READ_WORD_DATA.bits() | Self::SMBUS_WRITE_WORD_DATA.bits();
        const SMBUS_BLOCK_DATA =
            Self::SMBUS_READ_BLOCK_DATA.bits() | Self::SMBUS_WRITE_BLOCK_DATA.bits();
    }
}

/// Why a caller-supplied argument was refused.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ArgumentError {
    UnsupportedSize,
    MessageTooLong,
    TooManyMessages,
    NoMessages,
    BadAddress,
    BadChannel,
    /// The payload variant does not fit the requested size class.
    PayloadMismatch,
    /// Block writes carry 1..=32 bytes.
    BlockLength,
}

/// Why a started transfer produced no usable result.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IoFault {
    /// Busy never cleared after Start.
    Timeout,
    /// The controller flagged an abort or bus error.
    Aborted { code: u8 },
    /// A block read window held no plausible count byte.
    NoBlockLength,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// The controller was still busy before Start; it has been soft reset.
    Busy,
    Io(IoFault),
    InvalidArgument(ArgumentError),
    /// Non-blocking bus acquisition is not offered.
    Unsupported,
}

impl From<ArgumentError> for Error {
    fn from(err: ArgumentError) -> Self {
        Self::InvalidArgument(err)
    }
}

impl From<IoFault> for Error {
    fn from(fault: IoFault) -> Self {
        Self::Io(fault)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy => write!(f, "controller busy, soft reset issued"),
            Self::Io(IoFault::Timeout) => write!(f, "transfer did not complete"),
            Self::Io(IoFault::Aborted { code }) => {
                write!(f, "transfer aborted by controller (code {code:#04x})")
            }
            Self::Io(IoFault::NoBlockLength) => write!(f, "no block length in read window"),
            Self::InvalidArgument(arg) => write!(f, "invalid argument: {arg:?}"),
            Self::Unsupported => write!(f, "operation not supported"),
        }
    }
}

impl embedded_hal::i2c::Error for Error {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(IoFault::Aborted { .. }) => {
                ErrorKind::NoAcknowledge(NoAcknowledgeSource::Unknown)
            }
            Self::Busy => ErrorKind::Bus,
            _ => ErrorKind::Other,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ConfigurationError {
    ZeroTimeout,
    ClockDividerRange,
    ChannelCount,
    /// The register window is shorter than the register map.
    WindowTooSmall,
    /// The register window base is null or not 4-byte aligned.
    BadWindow,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FpgaI2cConfig {
    /// Busy-wait budget for one poll of the Status register.
    pub timeout: MicrosDurationU64,
    /// How long Reset is held during a soft reset.
    pub reset_settle: MicrosDurationU64,
    /// Clock divider programmed with every Config write.
    pub clock_divider: u16,
}

impl Default for FpgaI2cConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            reset_settle: DEFAULT_RESET_SETTLE,
            clock_divider: 0,
        }
    }
}

pub struct FpgaI2cConfigBuilder {
    timeout: MicrosDurationU64,
    reset_settle: MicrosDurationU64,
    clock_divider: u16,
}

impl Default for FpgaI2cConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FpgaI2cConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            reset_settle: DEFAULT_RESET_SETTLE,
            clock_divider: 0,
        }
    }
    #[must_use]
    pub fn timeout(mut self, timeout: MicrosDurationU64) -> Self {
        self.timeout = timeout;
        self
    }
    #[must_use]
    pub fn reset_settle(mut self, settle: MicrosDurationU64) -> Self {
        self.reset_settle = settle;
        self
    }
    #[must_use]
    pub fn clock_divider(mut self, divider: u16) -> Self {
        self.clock_divider = divider;
        self
    }

    /// # Errors
    ///
    /// Returns [`ConfigurationError::ZeroTimeout`] for an empty busy-wait
    /// budget and [`ConfigurationError::ClockDividerRange`] for a divider
    /// that does not fit the 11-bit field.
    pub fn build(self) -> Result<FpgaI2cConfig, ConfigurationError> {
        if self.timeout.ticks() == 0 {
            return Err(ConfigurationError::ZeroTimeout);
        }
        if u32::from(self.clock_divider) > crate::i2c::registers::cfg::CLOCK_DIVIDER_MASK {
            return Err(ConfigurationError::ClockDividerRange);
        }
        Ok(FpgaI2cConfig {
            timeout: self.timeout,
            reset_settle: self.reset_settle,
            clock_divider: self.clock_divider,
        })
    }
}
