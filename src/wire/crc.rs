//! Serial Ethernet frame check sequence
//!
//! Bit-at-a-time shift register form of the IEEE 802.3 CRC-32. The register
//! takes message bits at the bottom, one per step, and XORs in the generator
//! whenever a one falls out of the top. The first 32 bits entering the
//! register are complemented, which is what a complemented seed amounts to in
//! this form. The frame is followed by 32 zero bits, then the register is
//! complemented and each of its bytes bit-reversed to give the trailer in
//! transmission order.
//!
//! Input bits are consumed most significant first from bytes that have
//! already been bit-reversed, i.e. in the order they appear on the wire. The
//! transport supplies bytes in that shape through
//! [`read_reversed`](crate::transport::Transport::read_reversed); host data
//! goes through [`Fcs::update`].

/// CRC-32 generator polynomial (x^32 term implied)
pub const POLYNOMIAL: u32 = 0x04C1_1DB7;

/// Trailer length in bytes
pub const FCS_LEN: usize = 4;

/// Value of the FCS computed over any frame followed by its own FCS
pub const RESIDUE: [u8; FCS_LEN] = [0x1C, 0xDF, 0x44, 0x21];

/// Streaming frame check sequence
#[derive(Debug, Clone, Copy, Default)]
pub struct Fcs {
    window: u32,
    primed: u8,
}

impl Fcs {
    /// Empty register
    pub const fn new() -> Self {
        Self {
            window: 0,
            primed: 0,
        }
    }

    #[inline]
    fn push_bit(&mut self, mut bit: bool) {
        if self.primed < 32 {
            bit = !bit;
            self.primed += 1;
        }
        let carry = self.window & 0x8000_0000 != 0;
        self.window = (self.window << 1) | bit as u32;
        if carry {
            self.window ^= POLYNOMIAL;
        }
    }

    /// Feed bytes that are already bit-reversed (wire order)
    pub fn update_wire_order(&mut self, reversed: &[u8]) {
        for &byte in reversed {
            for shift in (0..8).rev() {
                self.push_bit((byte >> shift) & 1 != 0);
            }
        }
    }

    /// Feed bytes as they sit in memory
    pub fn update(&mut self, data: &[u8]) {
        for &byte in data {
            self.update_wire_order(&[byte.reverse_bits()]);
        }
    }

    /// Flush the register and produce the trailer in transmission order
    pub fn finish(mut self) -> [u8; FCS_LEN] {
        for _ in 0..32 {
            self.push_bit(false);
        }
        let w = !self.window;
        [
            ((w >> 24) as u8).reverse_bits(),
            ((w >> 16) as u8).reverse_bits(),
            ((w >> 8) as u8).reverse_bits(),
            (w as u8).reverse_bits(),
        ]
    }
}

/// Frame check sequence of `frame`
pub fn fcs(frame: &[u8]) -> [u8; FCS_LEN] {
    let mut crc = Fcs::new();
    crc.update(frame);
    crc.finish()
}

// =============================================================================
// Unit Tests
// =============================================================================
