//! GPIO bit-banged SPI master
//!
//! Mode 0 timing: the clock idles low, MOSI is set while the clock is low and
//! MISO is sampled just before the rising edge. Bits go out most significant
//! first. There is no delay between half cycles; the GPIO toggle rate of the
//! host sets the bus speed, which is well inside the W5500's 80 MHz limit on
//! any microcontroller that would bit-bang it.

use embedded_hal::digital::{InputPin, OutputPin};

use super::ChipBus;
use crate::driver::error::{BusError, BusResult};

/// Bit-banged SPI bus built from four GPIO pins
#[derive(Debug)]
pub struct BitBangSpi<CLK, MOSI, MISO, CS> {
    clk: CLK,
    mosi: MOSI,
    miso: MISO,
    cs: CS,
}

impl<CLK, MOSI, MISO, CS> BitBangSpi<CLK, MOSI, MISO, CS>
where
    CLK: OutputPin,
    MOSI: OutputPin,
    MISO: InputPin,
    CS: OutputPin,
{
    /// Take ownership of the pins
    ///
    /// Pins are not touched until [`idle`](Self::idle) or the first
    /// transaction.
    pub fn new(clk: CLK, mosi: MOSI, miso: MISO, cs: CS) -> Self {
        Self {
            clk,
            mosi,
            miso,
            cs,
        }
    }

    /// Drive the bus to its idle levels: clock low, chip-select high
    pub fn idle(&mut self) -> BusResult<()> {
        self.clk.set_low().map_err(|_| BusError::Pin)?;
        self.cs.set_high().map_err(|_| BusError::Pin)
    }

    /// Give the pins back
    pub fn release(self) -> (CLK, MOSI, MISO, CS) {
        (self.clk, self.mosi, self.miso, self.cs)
    }

    fn shift_bit(&mut self, bit: bool) -> BusResult<bool> {
        self.clk.set_low().map_err(|_| BusError::Pin)?;
        if bit {
            self.mosi.set_high().map_err(|_| BusError::Pin)?;
        } else {
            self.mosi.set_low().map_err(|_| BusError::Pin)?;
        }
        let sampled = self.miso.is_high().map_err(|_| BusError::Pin)?;
        self.clk.set_high().map_err(|_| BusError::Pin)?;
        Ok(sampled)
    }
}

impl<CLK, MOSI, MISO, CS> ChipBus for BitBangSpi<CLK, MOSI, MISO, CS>
where
    CLK: OutputPin,
    MOSI: OutputPin,
    MISO: InputPin,
    CS: OutputPin,
{
    fn select(&mut self) -> BusResult<()> {
        self.clk.set_low().map_err(|_| BusError::Pin)?;
        self.cs.set_low().map_err(|_| BusError::Pin)
    }

    fn deselect(&mut self) -> BusResult<()> {
        self.clk.set_low().map_err(|_| BusError::Pin)?;
        self.cs.set_high().map_err(|_| BusError::Pin)
    }

    fn transfer(&mut self, byte: u8) -> BusResult<u8> {
        let mut incoming = 0u8;
        for bit in (0..8).rev() {
            let sampled = self.shift_bit(byte & (1 << bit) != 0)?;
            incoming = (incoming << 1) | sampled as u8;
        }
        Ok(incoming)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::test_utils::{Line, MockPin, PinLog};

    fn bus(log: &PinLog) -> BitBangSpi<MockPin<'_>, MockPin<'_>, MockPin<'_>, MockPin<'_>> {
        BitBangSpi::new(
            log.pin(Line::Clk),
            log.pin(Line::Mosi),
            log.pin(Line::Miso),
            log.pin(Line::Cs),
        )
    }

    #[test]
    fn shifts_msb_first_on_rising_edges() {
        let log = PinLog::new();
        let mut spi = bus(&log);

        spi.transfer(0xA5).unwrap();

        assert_eq!(log.mosi_at_rising_edges(), std::vec![1, 0, 1, 0, 0, 1, 0, 1]);
    }

    #[test]
    fn samples_miso_into_returned_byte() {
        let log = PinLog::new();
        log.queue_miso_byte(0x3C);
        let mut spi = bus(&log);

        assert_eq!(spi.transfer(0x00).unwrap(), 0x3C);
    }

    #[test]
    fn chip_select_brackets_the_frame() {
        let log = PinLog::new();
        let mut spi = bus(&log);

        spi.select().unwrap();
        spi.write_all(&[0x01, 0x02]).unwrap();
        spi.deselect().unwrap();

        assert_eq!(log.first_level(Line::Cs), Some(false));
        assert_eq!(log.last_level(Line::Cs), Some(true));
        assert_eq!(log.rising_edges(), 16);
        // clock parked low after release
        assert_eq!(log.last_level(Line::Clk), Some(false));
    }

    #[test]
    fn pin_failure_maps_to_bus_error() {
        let log = PinLog::new();
        log.fail_line(Line::Mosi);
        let mut spi = bus(&log);

        assert_eq!(spi.transfer(0xFF), Err(BusError::Pin));
    }

    #[test]
    fn idle_parks_clock_low_and_cs_high() {
        let log = PinLog::new();
        let mut spi = bus(&log);

        spi.idle().unwrap();

        assert_eq!(log.last_level(Line::Clk), Some(false));
        assert_eq!(log.last_level(Line::Cs), Some(true));
    }
}
