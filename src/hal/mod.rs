//! Hardware Abstraction Layer
//!
//! The W5500 is reached over a single full-duplex serial bus with one
//! chip-select line. [`ChipBus`] is the seam between the framed
//! [`Transport`](crate::transport::Transport) and whatever actually moves the
//! bits.
//!
//! # Modules
//!
//! - [`bitbang`]: GPIO bit-banged SPI master (mode 0, MSB first)
//! - [`spi`]: Adapter over an `embedded_hal::spi::SpiBus` peripheral
//!
//! Both backends take their pins and peripherals from your HAL through the
//! `embedded-hal` 1.0 traits.

pub mod bitbang;
pub mod spi;

pub use bitbang::BitBangSpi;
pub use spi::SpiBusAdapter;

use crate::driver::error::BusResult;

// =============================================================================
// Chip Bus Trait
// =============================================================================

/// Byte-level access to the W5500 serial bus
///
/// Implementations only move bytes and toggle chip-select. Framing and
/// interrupt masking belong to the transport.
pub trait ChipBus {
    /// Assert chip-select (drive it low)
    fn select(&mut self) -> BusResult<()>;

    /// Release chip-select (drive it high)
    fn deselect(&mut self) -> BusResult<()>;

    /// Shift one byte out while shifting one byte in
    fn transfer(&mut self, byte: u8) -> BusResult<u8>;

    /// Shift out a run of bytes, discarding what comes back
    fn write_all(&mut self, data: &[u8]) -> BusResult<()> {
        for &byte in data {
            self.transfer(byte)?;
        }
        Ok(())
    }

    /// Fill `buf` with bytes clocked in against zero filler
    fn read_into(&mut self, buf: &mut [u8]) -> BusResult<()> {
        for slot in buf.iter_mut() {
            *slot = self.transfer(0)?;
        }
        Ok(())
    }
}

impl<T: ChipBus + ?Sized> ChipBus for &mut T {
    #[inline]
    fn select(&mut self) -> BusResult<()> {
        (**self).select()
    }

    #[inline]
    fn deselect(&mut self) -> BusResult<()> {
        (**self).deselect()
    }

    #[inline]
    fn transfer(&mut self, byte: u8) -> BusResult<u8> {
        (**self).transfer(byte)
    }

    #[inline]
    fn write_all(&mut self, data: &[u8]) -> BusResult<()> {
        (**self).write_all(data)
    }

    #[inline]
    fn read_into(&mut self, buf: &mut [u8]) -> BusResult<()> {
        (**self).read_into(buf)
    }
}
