// Licensed under the Apache-2.0 license

use core::ptr::{self, NonNull};

use crate::i2c::registers::FPGA_I2C_WINDOW_SIZE;
use crate::i2c::traits::RegisterIo;

/// [`RegisterIo`] over a mapped register window.
pub struct MmioRegisters {
    base: NonNull<u32>,
}

// The window is only touched through `&mut self`, and the bus keeps the
// handle behind its lock.
unsafe impl Send for MmioRegisters {}

impl MmioRegisters {
    /// # Safety
    ///
    /// `base` must point to a mapped, 4-byte aligned register window of at
    /// least [`FPGA_I2C_WINDOW_SIZE`] bytes that stays mapped for the life of
    /// the returned value, and nothing else may access it concurrently.
    #[must_use]
    pub const unsafe fn new(base: NonNull<u32>) -> Self {
        Self { base }
    }

    #[must_use]
    pub const fn window_size() -> usize {
        FPGA_I2C_WINDOW_SIZE
    }

    fn slot(&self, offset: u32) -> *mut u32 {
        self.base
            .as_ptr()
            .wrapping_byte_add(offset as usize & !0b11)
    }
}

impl RegisterIo for MmioRegisters {
    fn read32(&mut self, offset: u32) -> u32 {
        // SAFETY: `new` requires the whole window to be mapped and aligned.
        unsafe { ptr::read_volatile(self.slot(offset)) }
    }

    fn write32(&mut self, offset: u32, value: u32) {
        // SAFETY: as above.
        unsafe { ptr::write_volatile(self.slot(offset), value) }
    }
}
