// Licensed under the Apache-2.0 license

//! Register layout of the FPGA I2C manager block.
//!
//! Offsets are relative to the base of one controller window. All registers
//! are 32 bits wide and must be accessed with single volatile reads/writes.
//!
//! The TX and RX FIFOs are single 32-bit ports: every write to
//! [`FPGA_I2C_TX`] pushes one word and every read of [`FPGA_I2C_RX`] pops
//! one. Outgoing bytes are packed most-significant-lane first (`byte[0]`
//! lands in bits 31:24 of word 0) and pushed highest word first. Incoming
//! words arrive tail first: the least-significant lane of the first word
//! popped holds the *last* byte of the message.

use crate::i2c::common::FIFO_WORDS;

pub const FPGA_I2C_CFG: u32 = 0x00;
pub const FPGA_I2C_CTRL: u32 = 0x04;
pub const FPGA_I2C_STAT: u32 = 0x08;
pub const FPGA_I2C_TX: u32 = 0x10;
pub const FPGA_I2C_RX: u32 = 0x40;
pub const FPGA_I2C_MUX: u32 = 0x70;

/// Smallest register window that covers every register above.
pub const FPGA_I2C_WINDOW_SIZE: usize = 0x74;

/// Config register bits.
pub mod cfg {
    pub const RESET: u32 = 1 << 31;
    pub const ENABLE: u32 = 1 << 30;
    pub const ABORT: u32 = 1 << 29;
    pub const STATUS_CLEAR: u32 = 1 << 28;
    pub const START: u32 = 1 << 24;
    /// Byte-lane order select (bits 15:14); always written as zero (MSB first).
    pub const LSB_FIRST_MASK: u32 = 0b11 << 14;
    pub const ACK_POLARITY: u32 = 1 << 13;
    pub const CLOCK_DIVIDER_MASK: u32 = 0x7ff;
}

/// Status register bits.
pub mod stat {
    pub const BUSY: u32 = 1 << 31;
    pub const ABORT: u32 = 1 << 30;
    pub const ERROR_SHIFT: u32 = 16;
    pub const ERROR_MASK: u32 = 0xff << ERROR_SHIFT;
}

/// Control register fields.
pub mod ctrl {
    pub const RX_COUNT_SHIFT: u32 = 0;
    pub const RX_COUNT_MASK: u32 = 0xff;
    pub const TX_COUNT_SHIFT: u32 = 8;
    pub const TX_COUNT_MASK: u32 = 0x1ff << TX_COUNT_SHIFT;
    pub const ADDRESS_SHIFT: u32 = 17;
    pub const ADDRESS_MASK: u32 = 0x7f << ADDRESS_SHIFT;
}

/// Number of 32-bit FIFO words needed to hold `len` bytes.
#[must_use]
pub const fn words_for(len: usize) -> usize {
    len.div_ceil(4)
}

/// Value written to the Control register to launch one transfer.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ControlWord(u32);

impl ControlWord {
    #[must_use]
    pub const fn new(address: u8) -> Self {
        Self(((address as u32) << ctrl::ADDRESS_SHIFT) & ctrl::ADDRESS_MASK)
    }

    #[must_use]
    pub const fn tx_count(self, count: usize) -> Self {
        Self(self.0 | (((count as u32) << ctrl::TX_COUNT_SHIFT) & ctrl::TX_COUNT_MASK))
    }

    #[must_use]
    pub const fn rx_count(self, count: usize) -> Self {
        Self(self.0 | (((count as u32) << ctrl::RX_COUNT_SHIFT) & ctrl::RX_COUNT_MASK))
    }

    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }
}

/// Snapshot of the Status register.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StatusWord(pub u32);

impl StatusWord {
    #[must_use]
    pub const fn busy(self) -> bool {
        self.0 & stat::BUSY != 0
    }

    #[must_use]
    pub const fn aborted(self) -> bool {
        self.0 & stat::ABORT != 0
    }

    #[must_use]
    pub const fn error_code(self) -> u8 {
        ((self.0 & stat::ERROR_MASK) >> stat::ERROR_SHIFT) as u8
    }

    /// True when the finished transfer must not be trusted.
    #[must_use]
    pub const fn failed(self) -> bool {
        self.aborted() || self.error_code() != 0
    }
}

/// Config word with `flags` set and the divider in its field.
///
/// The byte-lane field is cleared: the packing helpers below assume MSB-first
/// lanes.
#[must_use]
pub const fn config_word(flags: u32, clock_divider: u16) -> u32 {
    (flags & !(cfg::LSB_FIRST_MASK | cfg::CLOCK_DIVIDER_MASK))
        | (clock_divider as u32 & cfg::CLOCK_DIVIDER_MASK)
}

/// Pack outgoing bytes into TX FIFO words, four per word, first byte in the
/// top lane of word 0. Unused lanes are zero.
///
/// Returns the number of words used. Bytes beyond the FIFO capacity are not
/// packed; callers validate lengths first.
pub fn pack_tx_words(bytes: &[u8], words: &mut [u32; FIFO_WORDS]) -> usize {
    *words = [0; FIFO_WORDS];
    let mut used = 0;
    for (word, chunk) in words.iter_mut().zip(bytes.chunks(4)) {
        let mut lanes = [0u8; 4];
        for (lane, byte) in lanes.iter_mut().zip(chunk) {
            *lane = *byte;
        }
        *word = u32::from_be_bytes(lanes);
        used += 1;
    }
    used
}

/// Inverse of [`pack_tx_words`]: recover `bytes.len()` bytes from TX words.
pub fn unpack_tx_words(words: &[u32], bytes: &mut [u8]) {
    for (chunk, word) in bytes.chunks_mut(4).zip(words) {
        for (byte, lane) in chunk.iter_mut().zip(word.to_be_bytes()) {
            *byte = lane;
        }
    }
}

/// Unpack RX FIFO words into `buffer`, filling from the tail toward the head:
/// lane 0 of word 0 is the last byte of the buffer.
pub fn unpack_rx_words(words: &[u32], buffer: &mut [u8]) {
    let lanes = words.iter().flat_map(|word| word.to_le_bytes());
    for (byte, lane) in buffer.iter_mut().rev().zip(lanes) {
        *byte = lane;
    }
}

/// Inverse of [`unpack_rx_words`]: lay `bytes` out the way the hardware
/// presents them in the RX FIFO. Returns the number of words used.
pub fn pack_rx_words(bytes: &[u8], words: &mut [u32; FIFO_WORDS]) -> usize {
    *words = [0; FIFO_WORDS];
    let used = words_for(bytes.len()).min(FIFO_WORDS);
    let mut tail = bytes.iter().rev();
    for word in words.iter_mut().take(used) {
        let mut lanes = [0u8; 4];
        for lane in &mut lanes {
            if let Some(byte) = tail.next() {
                *lane = *byte;
            }
        }
        *word = u32::from_le_bytes(lanes);
    }
    used
}
