// Licensed under the Apache-2.0 license

//! Bus engine for the FPGA I2C manager.
//!
//! One [`FpgaI2cBus`] owns the register window of one physical controller.
//! Every logical channel behind that window gets a [`FpgaI2cChannel`] handle
//! borrowing the bus. The channel-select register and the FIFOs are shared by
//! all channels, so every transfer runs under the bus lock; holding a
//! [`ChannelLock`] is the only way to touch the registers.
//!
//! A transfer is always:
//!
//! ```text
//! wait_ready -> select channel -> Control -> TX FIFO -> Start -> wait_ready -> RX FIFO
//! ```
//!
//! `wait_ready` spins on Status.busy without yielding. If the deadline
//! passes it soft resets the controller. Before Start that surfaces as
//! [`Error::Busy`]; after Start the data is lost and the caller sees
//! [`IoFault::Timeout`]. Nothing is retried here.

use spin::{Mutex, MutexGuard};

use crate::common::{Logger, NoOpLogger};
use crate::i2c::common::{
    ArgumentError, ConfigurationError, Error, FpgaI2cConfig, IoFault, Message, FIFO_WORDS,
    MAX_ADDRESS, MAX_CHANNELS, MAX_MESSAGES, MAX_MESSAGE_LEN,
};
use crate::i2c::registers::{
    cfg, config_word, pack_tx_words, unpack_rx_words, words_for, ControlWord, StatusWord,
    FPGA_I2C_CFG, FPGA_I2C_CTRL, FPGA_I2C_MUX, FPGA_I2C_RX, FPGA_I2C_STAT, FPGA_I2C_TX,
};
use crate::i2c::traits::{Clock, RegisterIo};

struct BusState<R, L> {
    regs: R,
    logger: L,
}

impl<R: RegisterIo, L: Logger> BusState<R, L> {
    fn write_config(&mut self, flags: u32, config: &FpgaI2cConfig) {
        self.regs
            .write32(FPGA_I2C_CFG, config_word(flags, config.clock_divider));
    }

    /// Pulse Reset while keeping the controller enabled.
    fn soft_reset<C: Clock>(&mut self, clock: &C, config: &FpgaI2cConfig) {
        self.write_config(cfg::RESET | cfg::ENABLE, config);
        let settled = clock.now() + config.reset_settle;
        while clock.now() < settled {
            core::hint::spin_loop();
        }
        self.write_config(cfg::ENABLE, config);
    }

    /// Spin until Status.busy clears, soft resetting on timeout.
    fn wait_ready<C: Clock>(
        &mut self,
        clock: &C,
        config: &FpgaI2cConfig,
    ) -> Result<StatusWord, Error> {
        let deadline = clock.now() + config.timeout;
        loop {
            let status = StatusWord(self.regs.read32(FPGA_I2C_STAT));
            if !status.busy() {
                return Ok(status);
            }
            if clock.now() >= deadline {
                self.logger.warn(format_args!(
                    "fpga i2c: busy for {} us, soft reset",
                    config.timeout.to_micros()
                ));
                self.soft_reset(clock, config);
                return Err(Error::Busy);
            }
            core::hint::spin_loop();
        }
    }
}

/// One physical FPGA I2C controller shared by up to [`MAX_CHANNELS`] logical
/// channels.
pub struct FpgaI2cBus<R, C, L = NoOpLogger> {
    state: Mutex<BusState<R, L>>,
    clock: C,
    config: FpgaI2cConfig,
    channel_count: usize,
}

impl<R: RegisterIo, C: Clock, L: Logger> FpgaI2cBus<R, C, L> {
    /// Attach to a controller and bring it to a known idle state.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::ChannelCount`] unless
    /// `1 <= channel_count <= MAX_CHANNELS`.
    pub fn new(
        regs: R,
        clock: C,
        config: FpgaI2cConfig,
        channel_count: usize,
        logger: L,
    ) -> Result<Self, ConfigurationError> {
        if channel_count == 0 || channel_count > MAX_CHANNELS {
            return Err(ConfigurationError::ChannelCount);
        }
        let bus = Self {
            state: Mutex::new(BusState { regs, logger }),
            clock,
            config,
            channel_count,
        };
        {
            let mut state = bus.state.lock();
            state.soft_reset(&bus.clock, &bus.config);
            state.logger.debug(format_args!(
                "fpga i2c: attached, {} channels",
                channel_count
            ));
        }
        Ok(bus)
    }

    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    #[must_use]
    pub fn config(&self) -> &FpgaI2cConfig {
        &self.config
    }

    /// Handle for logical channel `index`.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError::BadChannel`] for an index past the channel
    /// count given at attach time.
    pub fn channel(&self, index: usize) -> Result<FpgaI2cChannel<'_, R, C, L>, Error> {
        if index >= self.channel_count {
            return Err(ArgumentError::BadChannel.into());
        }
        let channel = u8::try_from(index).map_err(|_| ArgumentError::BadChannel)?;
        Ok(FpgaI2cChannel { bus: self, channel })
    }

    /// Detach, handing back the register window.
    pub fn release(self) -> R {
        self.state.into_inner().regs
    }
}

/// A logical channel on a shared [`FpgaI2cBus`].
pub struct FpgaI2cChannel<'a, R, C, L = NoOpLogger> {
    bus: &'a FpgaI2cBus<R, C, L>,
    channel: u8,
}

impl<R, C, L> Clone for FpgaI2cChannel<'_, R, C, L> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R, C, L> Copy for FpgaI2cChannel<'_, R, C, L> {}

impl<'a, R: RegisterIo, C: Clock, L: Logger> FpgaI2cChannel<'a, R, C, L> {
    #[must_use]
    pub fn index(&self) -> u8 {
        self.channel
    }

    /// Take the bus for this channel, blocking until every other channel on
    /// the same controller has finished.
    #[must_use]
    pub fn lock(&self) -> ChannelLock<'a, R, C, L> {
        ChannelLock {
            state: self.bus.state.lock(),
            clock: &self.bus.clock,
            config: &self.bus.config,
            channel: self.channel,
        }
    }

    /// Non-blocking acquisition is not offered; callers must block.
    ///
    /// # Errors
    ///
    /// Always returns [`Error::Unsupported`].
    pub fn try_lock(&self) -> Result<ChannelLock<'a, R, C, L>, Error> {
        Err(Error::Unsupported)
    }

    /// Run `messages` in order without letting another channel in between.
    ///
    /// # Errors
    ///
    /// See [`ChannelLock::transfer`].
    pub fn transfer(&self, messages: &mut [Message<'_>]) -> Result<usize, Error> {
        validate_messages(messages)?;
        self.lock().transfer(messages)
    }
}

/// Exclusive access to the controller on behalf of one channel.
pub struct ChannelLock<'a, R, C, L> {
    state: MutexGuard<'a, BusState<R, L>>,
    clock: &'a C,
    config: &'a FpgaI2cConfig,
    channel: u8,
}

impl<R: RegisterIo, C: Clock, L: Logger> ChannelLock<'_, R, C, L> {
    #[must_use]
    pub fn channel(&self) -> u8 {
        self.channel
    }

    /// Spin until the controller is idle.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Busy`] after soft resetting a controller that stayed
    /// busy past the configured timeout.
    pub fn wait_ready(&mut self) -> Result<(), Error> {
        self.state.wait_ready(self.clock, self.config).map(|_| ())
    }

    /// Pulse Reset and re-enable the controller.
    pub fn soft_reset(&mut self) {
        self.state.soft_reset(self.clock, self.config);
    }

    /// Execute a list of messages, one hardware transfer each.
    ///
    /// The channel stays selected for the whole list. Returns the number of
    /// messages executed.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] for an empty list, more than
    ///   [`MAX_MESSAGES`] messages, a message over [`MAX_MESSAGE_LEN`] bytes
    ///   or a non 7-bit address; nothing is written to the controller.
    /// - [`Error::Busy`] if the controller never went idle before a Start.
    /// - [`Error::Io`] if a started transfer timed out or was aborted.
    pub fn transfer(&mut self, messages: &mut [Message<'_>]) -> Result<usize, Error> {
        validate_messages(messages)?;
        for message in messages.iter_mut() {
            match message {
                Message::Write { address, bytes } => self.execute(*address, *bytes, &mut [])?,
                Message::Read { address, buffer } => self.execute(*address, &[], &mut **buffer)?,
            }
        }
        Ok(messages.len())
    }

    /// Run one hardware transfer: send `tx`, then receive `rx.len()` bytes.
    ///
    /// Lengths must already be validated against [`MAX_MESSAGE_LEN`].
    pub(crate) fn execute(&mut self, address: u8, tx: &[u8], rx: &mut [u8]) -> Result<(), Error> {
        self.state.wait_ready(self.clock, self.config)?;

        let regs = &mut self.state.regs;
        regs.write32(FPGA_I2C_MUX, u32::from(self.channel));
        regs.write32(
            FPGA_I2C_CTRL,
            ControlWord::new(address)
                .tx_count(tx.len())
                .rx_count(rx.len())
                .bits(),
        );

        if !tx.is_empty() {
            let mut words = [0u32; FIFO_WORDS];
            let used = pack_tx_words(tx, &mut words);
            // The port is a FIFO: push the last word first.
            for word in words.iter().take(used).rev() {
                regs.write32(FPGA_I2C_TX, *word);
            }
        }

        let mut flags = cfg::START | cfg::ENABLE;
        if !rx.is_empty() {
            flags |= cfg::ACK_POLARITY;
        }
        self.state.write_config(flags, self.config);

        let status = match self.state.wait_ready(self.clock, self.config) {
            Ok(status) => status,
            Err(_) => {
                self.state.logger.error(format_args!(
                    "fpga i2c: ch {} addr {:#04x}: transfer timed out",
                    self.channel, address
                ));
                return Err(IoFault::Timeout.into());
            }
        };

        if status.failed() {
            self.state
                .write_config(cfg::STATUS_CLEAR | cfg::ENABLE, self.config);
            self.state.logger.error(format_args!(
                "fpga i2c: ch {} addr {:#04x}: aborted, code {:#04x}",
                self.channel,
                address,
                status.error_code()
            ));
            return Err(IoFault::Aborted {
                code: status.error_code(),
            }
            .into());
        }

        if !rx.is_empty() {
            let mut words = [0u32; FIFO_WORDS];
            for word in words.iter_mut().take(words_for(rx.len())) {
                *word = self.state.regs.read32(FPGA_I2C_RX);
            }
            unpack_rx_words(&words, rx);
        }
        Ok(())
    }

    pub(crate) fn log_error(&mut self, args: core::fmt::Arguments<'_>) {
        self.state.logger.error(args);
    }
}

pub(crate) fn check_address(address: u8) -> Result<(), Error> {
    if address > MAX_ADDRESS {
        return Err(ArgumentError::BadAddress.into());
    }
    Ok(())
}

fn validate_messages(messages: &[Message<'_>]) -> Result<(), Error> {
    if messages.is_empty() {
        return Err(ArgumentError::NoMessages.into());
    }
    if messages.len() > MAX_MESSAGES {
        return Err(ArgumentError::TooManyMessages.into());
    }
    for message in messages {
        if message.len() > MAX_MESSAGE_LEN {
            return Err(ArgumentError::MessageTooLong.into());
        }
        check_address(message.address())?;
    }
    Ok(())
}
