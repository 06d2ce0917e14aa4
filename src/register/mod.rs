//! W5500 register address model
//!
//! The W5500 exposes a 24-bit address space over SPI. Each transaction starts
//! with a three byte header: a 16-bit offset followed by a control byte.
//!
//! ```text
//!  control byte
//!  7   6   5   4   3   2   1   0
//! +-----------+-------+---+-------+
//! |  socket   | block |RWB|  OM   |
//! +-----------+-------+---+-------+
//! ```
//!
//! The five block-select bits are split into a socket index (bits 7:5) and
//! a block kind (bits 4:3). Rewriting the socket field of a socket-block
//! address retargets it at another socket without touching the block kind or
//! the offset.
//!
//! Everything here is pure arithmetic; [`Transport`](crate::transport::Transport)
//! is the only consumer of the produced headers.

pub mod common;
pub mod socket;

/// Number of hardware socket slots
pub const SOCKET_COUNT: usize = 8;

/// Size of each socket's TX and RX ring buffer (power-on default, 2 KiB)
pub const SOCKET_BUFFER_SIZE: u16 = 2048;

/// Read/write bit in the control byte (set for writes)
pub const CONTROL_RWB: u8 = 1 << 2;
/// Block kind field mask (bits 4:3)
pub const CONTROL_BLOCK_MASK: u8 = 0b0001_1000;
/// Socket index field shift
pub const CONTROL_SOCKET_SHIFT: u8 = 5;
/// Socket index field mask (bits 7:5)
pub const CONTROL_SOCKET_MASK: u8 = 0b1110_0000;

/// Register block kind selected by bits 4:3 of the control byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Block {
    /// Common register block (only valid with socket index 0)
    Common = 0x00,
    /// Per-socket register block
    SocketRegisters = 0x08,
    /// Per-socket TX ring buffer
    TxBuffer = 0x10,
    /// Per-socket RX ring buffer
    RxBuffer = 0x18,
}

impl Block {
    /// Decode the block kind from a control byte
    pub const fn from_control(control: u8) -> Self {
        match control & CONTROL_BLOCK_MASK {
            0x08 => Block::SocketRegisters,
            0x10 => Block::TxBuffer,
            0x18 => Block::RxBuffer,
            _ => Block::Common,
        }
    }
}

// =============================================================================
// Socket Index
// =============================================================================

/// Index of one of the chip's eight socket slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SocketId(u8);

impl SocketId {
    /// Socket 0, the only slot that supports MACRAW mode
    pub const S0: Self = Self(0);
    /// Socket 1
    pub const S1: Self = Self(1);

    /// Create a socket index, rejecting values outside `0..8`
    pub const fn new(index: u8) -> Option<Self> {
        if (index as usize) < SOCKET_COUNT {
            Some(Self(index))
        } else {
            None
        }
    }

    /// Raw slot number
    #[inline(always)]
    pub const fn index(self) -> u8 {
        self.0
    }

    /// Slot number for array indexing
    #[inline(always)]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }

    /// Bit for this socket in the common SIR/SIMR registers
    #[inline(always)]
    pub const fn bit(self) -> u8 {
        1 << self.0
    }
}

impl TryFrom<u8> for SocketId {
    type Error = crate::driver::error::SocketError;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        Self::new(index).ok_or(crate::driver::error::SocketError::InvalidSocket)
    }
}

// =============================================================================
// Register Address
// =============================================================================

/// A physical W5500 address: 16-bit offset plus control byte (without RWB)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterAddress {
    offset: u16,
    control: u8,
}

impl RegisterAddress {
    /// Address `offset` inside `block`, socket field zero
    pub const fn new(block: Block, offset: u16) -> Self {
        Self {
            offset,
            control: block as u8,
        }
    }

    /// Common block register
    pub const fn common(offset: u16) -> Self {
        Self::new(Block::Common, offset)
    }

    /// Socket register block entry for `socket`
    pub const fn socket(socket: SocketId, offset: u16) -> Self {
        Self::new(Block::SocketRegisters, offset).with_socket(socket)
    }

    /// Position `pointer` in the TX ring of `socket`
    pub const fn tx_buffer(socket: SocketId, pointer: u16) -> Self {
        Self::new(Block::TxBuffer, pointer).with_socket(socket)
    }

    /// Position `pointer` in the RX ring of `socket`
    pub const fn rx_buffer(socket: SocketId, pointer: u16) -> Self {
        Self::new(Block::RxBuffer, pointer).with_socket(socket)
    }

    /// Overwrite the socket field, keeping block kind and offset
    pub const fn with_socket(self, socket: SocketId) -> Self {
        Self {
            offset: self.offset,
            control: (self.control & !CONTROL_SOCKET_MASK)
                | (socket.index() << CONTROL_SOCKET_SHIFT),
        }
    }

    /// Advance the offset. Ring buffer offsets wrap in hardware.
    pub const fn add(self, delta: u16) -> Self {
        Self {
            offset: self.offset.wrapping_add(delta),
            control: self.control,
        }
    }

    /// 16-bit offset field
    #[inline(always)]
    pub const fn offset(self) -> u16 {
        self.offset
    }

    /// Control byte without the read/write bit
    #[inline(always)]
    pub const fn control(self) -> u8 {
        self.control
    }

    /// Block kind
    #[inline(always)]
    pub const fn block(self) -> Block {
        Block::from_control(self.control)
    }

    /// Socket field of the control byte
    #[inline(always)]
    pub const fn socket_index(self) -> u8 {
        (self.control & CONTROL_SOCKET_MASK) >> CONTROL_SOCKET_SHIFT
    }

    /// The 24-bit value shifted out as the frame header
    pub const fn to_raw(self) -> u32 {
        ((self.offset as u32) << 8) | self.control as u32
    }

    /// Three header bytes in wire order: offset high, offset low, control
    pub const fn header(self, write: bool) -> [u8; 3] {
        let control = if write {
            self.control | CONTROL_RWB
        } else {
            self.control
        };
        let offset = self.offset.to_be_bytes();
        [offset[0], offset[1], control]
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn all_sockets() -> impl Iterator<Item = SocketId> {
        (0..SOCKET_COUNT as u8).filter_map(SocketId::new)
    }

    #[test]
    fn socket_id_rejects_out_of_range() {
        assert!(SocketId::new(7).is_some());
        assert!(SocketId::new(8).is_none());
        assert_eq!(SocketId::S1.bit(), 0b10);
        assert_eq!(SocketId::try_from(3), Ok(SocketId::new(3).unwrap()));
        assert_eq!(
            SocketId::try_from(9),
            Err(crate::driver::error::SocketError::InvalidSocket)
        );
    }

    #[test]
    fn common_register_header_matches_memory_map() {
        let sipr = RegisterAddress::common(common::SIPR);
        assert_eq!(sipr.header(false), [0x00, 0x0F, 0x00]);
        assert_eq!(sipr.header(true), [0x00, 0x0F, 0x04]);
        assert_eq!(sipr.to_raw(), 0x00_0F_00);
    }

    #[test]
    fn socket_register_header_matches_memory_map() {
        // Socket 1 command register: BSB 00101
        let cr = RegisterAddress::socket(SocketId::S1, socket::SN_CR);
        assert_eq!(cr.header(true), [0x00, 0x01, 0x2C]);

        // Socket 0 TX buffer at 0x1234: BSB 00010
        let tx = RegisterAddress::tx_buffer(SocketId::S0, 0x1234);
        assert_eq!(tx.header(false), [0x12, 0x34, 0x10]);

        // Socket 7 RX buffer: BSB 11111
        let rx = RegisterAddress::rx_buffer(SocketId::new(7).unwrap(), 0);
        assert_eq!(rx.header(false), [0x00, 0x00, 0xF8]);
    }

    #[test]
    fn socket_field_equals_socket_index() {
        let blocks = [Block::SocketRegisters, Block::TxBuffer, Block::RxBuffer];
        for block in blocks {
            for id in all_sockets() {
                for offset in [0u16, 0x0001, 0x002C, 0x07FF, 0xFFFF] {
                    let addr = RegisterAddress::new(block, offset).with_socket(id);
                    assert_eq!(addr.socket_index(), id.index());
                    assert_eq!(addr.block(), block);
                    assert_eq!(addr.offset(), offset);
                }
            }
        }
    }

    #[test]
    fn retargeting_socket_leaves_block_and_offset() {
        let base = RegisterAddress::socket(SocketId::new(3).unwrap(), socket::SN_TX_WR);
        for id in all_sockets() {
            let moved = base.with_socket(id);
            assert_eq!(moved.block(), Block::SocketRegisters);
            assert_eq!(moved.offset(), socket::SN_TX_WR);
            assert_eq!(moved.socket_index(), id.index());
            assert_eq!(moved.header(false)[2] & CONTROL_BLOCK_MASK, 0x08);
        }
    }

    #[test]
    fn offset_addition_wraps_and_keeps_control() {
        let addr = RegisterAddress::tx_buffer(SocketId::S1, 0xFFFE).add(4);
        assert_eq!(addr.offset(), 0x0002);
        assert_eq!(addr.socket_index(), 1);
        assert_eq!(addr.block(), Block::TxBuffer);
    }

    #[test]
    fn read_write_bit_only_in_header() {
        let addr = RegisterAddress::socket(SocketId::S0, socket::SN_MR);
        assert_eq!(addr.control() & CONTROL_RWB, 0);
        assert_eq!(addr.header(true)[2] & CONTROL_RWB, CONTROL_RWB);
    }
}
