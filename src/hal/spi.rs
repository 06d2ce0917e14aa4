//! Hardware SPI adapter
//!
//! Wraps an `embedded_hal::spi::SpiBus` together with a dedicated
//! chip-select pin. The bus must already be configured for mode 0 or mode 3;
//! the W5500 accepts both.

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

use super::ChipBus;
use crate::driver::error::{BusError, BusResult};

/// [`ChipBus`] over a hardware SPI peripheral
#[derive(Debug)]
pub struct SpiBusAdapter<SPI, CS> {
    spi: SPI,
    cs: CS,
}

impl<SPI, CS> SpiBusAdapter<SPI, CS>
where
    SPI: SpiBus<u8>,
    CS: OutputPin,
{
    /// Pair a bus with its chip-select pin
    pub fn new(spi: SPI, cs: CS) -> Self {
        Self { spi, cs }
    }

    /// Give the peripheral and pin back
    pub fn release(self) -> (SPI, CS) {
        (self.spi, self.cs)
    }
}

impl<SPI, CS> ChipBus for SpiBusAdapter<SPI, CS>
where
    SPI: SpiBus<u8>,
    CS: OutputPin,
{
    fn select(&mut self) -> BusResult<()> {
        self.cs.set_low().map_err(|_| BusError::Pin)
    }

    fn deselect(&mut self) -> BusResult<()> {
        // Chip-select must not rise before the last byte leaves the FIFO
        let flushed = self.spi.flush().map_err(|_| BusError::Spi);
        self.cs.set_high().map_err(|_| BusError::Pin)?;
        flushed
    }

    fn transfer(&mut self, byte: u8) -> BusResult<u8> {
        let mut word = [byte];
        self.spi
            .transfer_in_place(&mut word)
            .map_err(|_| BusError::Spi)?;
        Ok(word[0])
    }

    fn write_all(&mut self, data: &[u8]) -> BusResult<()> {
        self.spi.write(data).map_err(|_| BusError::Spi)
    }

    fn read_into(&mut self, buf: &mut [u8]) -> BusResult<()> {
        buf.fill(0);
        self.spi.transfer_in_place(buf).map_err(|_| BusError::Spi)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
