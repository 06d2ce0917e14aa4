//! Framed W5500 transactions
//!
//! Every access is one chip-select window: a three byte header from
//! [`RegisterAddress::header`] followed by the data phase. The whole window
//! runs inside `critical_section::with`, so the interrupt dispatcher can never
//! start a frame while another is half shifted. The bus has a single
//! chip-select and is not reentrant.
//!
//! Reads that ask for more than the caller's buffer holds are truncated to the
//! buffer and report the number of bytes actually transferred.

use crate::driver::error::BusResult;
use crate::hal::ChipBus;
use crate::register::RegisterAddress;

/// Transaction layer over a [`ChipBus`]
#[derive(Debug)]
pub struct Transport<B> {
    bus: B,
}

impl<B: ChipBus> Transport<B> {
    /// Wrap a bus
    pub const fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Give the bus back
    pub fn release(self) -> B {
        self.bus
    }

    /// Run one chip-select window with interrupts masked
    ///
    /// Chip-select is released even when the header or data phase fails; the
    /// first error wins.
    fn transaction<R, F>(&mut self, addr: RegisterAddress, write: bool, body: F) -> BusResult<R>
    where
        F: FnOnce(&mut B) -> BusResult<R>,
    {
        critical_section::with(|_| {
            self.bus.select()?;
            let result = self
                .bus
                .write_all(&addr.header(write))
                .and_then(|()| body(&mut self.bus));
            let released = self.bus.deselect();
            let value = result?;
            released?;
            Ok(value)
        })
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Read up to `len` bytes starting at `addr`
    ///
    /// Returns the number of bytes read, which is `len` clipped to `buf.len()`.
    pub fn read(&mut self, addr: RegisterAddress, buf: &mut [u8], len: usize) -> BusResult<usize> {
        let count = len.min(buf.len());
        let window = &mut buf[..count];
        self.transaction(addr, false, |bus| bus.read_into(window))?;
        Ok(count)
    }

    /// Like [`read`](Self::read), but with every byte's bit order reversed
    ///
    /// Serial FCS computation consumes bits least significant first; reversing
    /// here lets it walk each byte from the top.
    pub fn read_reversed(
        &mut self,
        addr: RegisterAddress,
        buf: &mut [u8],
        len: usize,
    ) -> BusResult<usize> {
        let count = self.read(addr, buf, len)?;
        for byte in &mut buf[..count] {
            *byte = byte.reverse_bits();
        }
        Ok(count)
    }

    /// Read a single register byte
    pub fn read_u8(&mut self, addr: RegisterAddress) -> BusResult<u8> {
        let mut byte = [0u8; 1];
        self.read(addr, &mut byte, 1)?;
        Ok(byte[0])
    }

    /// Read a big-endian 16-bit register in one transaction
    pub fn read_u16(&mut self, addr: RegisterAddress) -> BusResult<u16> {
        let mut bytes = [0u8; 2];
        self.read(addr, &mut bytes, 2)?;
        Ok(u16::from_be_bytes(bytes))
    }

    /// Read a 16-bit hardware counter until two consecutive reads agree
    ///
    /// The chip may update a pointer or size register between its two byte
    /// reads. Every pointer and size register must be read through here.
    pub fn read_stable_u16(&mut self, addr: RegisterAddress) -> BusResult<u16> {
        let mut previous = self.read_u16(addr)?;
        loop {
            let current = self.read_u16(addr)?;
            if current == previous {
                return Ok(current);
            }
            previous = current;
        }
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Write `data` starting at `addr`
    pub fn write(&mut self, addr: RegisterAddress, data: &[u8]) -> BusResult<()> {
        self.transaction(addr, true, |bus| bus.write_all(data))
    }

    /// Write a constant template (frame headers, option blocks)
    pub fn write_static(&mut self, addr: RegisterAddress, data: &'static [u8]) -> BusResult<()> {
        self.write(addr, data)
    }

    /// Write `byte` repeated `count` times without a source buffer
    pub fn write_repeat(&mut self, addr: RegisterAddress, byte: u8, count: usize) -> BusResult<()> {
        self.transaction(addr, true, |bus| {
            for _ in 0..count {
                bus.transfer(byte)?;
            }
            Ok(())
        })
    }

    /// Write a single register byte
    pub fn write_u8(&mut self, addr: RegisterAddress, value: u8) -> BusResult<()> {
        self.write(addr, &[value])
    }

    /// Write a big-endian 16-bit register
    pub fn write_u16(&mut self, addr: RegisterAddress, value: u16) -> BusResult<()> {
        self.write(addr, &value.to_be_bytes())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
