//! Socket interrupt handling
//!
//! [`SocketInterrupts`] is the Sn_IR / Sn_IMR bit set, [`Event`] the packed
//! record the dispatcher queues for the main loop, and
//! [`W5500::service_interrupt`] the dispatcher itself.

use super::config::SocketMode;
use super::device::W5500;
use super::error::Result;
use crate::hal::ChipBus;
use crate::register::socket::{
    SN_IR, SN_IR_ALL, SN_IR_CON, SN_IR_DISCON, SN_IR_RECV, SN_IR_SENDOK, SN_IR_TIMEOUT, SN_TX_WR,
};
use crate::register::{RegisterAddress, SOCKET_COUNT, SocketId, common};

// =============================================================================
// Socket Interrupt Set
// =============================================================================

/// Set of per-socket interrupt sources
///
/// # Example
///
/// ```ignore
/// let interest = SocketInterrupts::RECV.union(SocketInterrupts::DISCON);
/// if event.interrupts().contains(SocketInterrupts::RECV) {
///     // read the request
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SocketInterrupts(u8);

impl SocketInterrupts {
    /// No sources
    pub const NONE: Self = Self(0);
    /// Connection established
    pub const CON: Self = Self(SN_IR_CON);
    /// Peer disconnected
    pub const DISCON: Self = Self(SN_IR_DISCON);
    /// Data received
    pub const RECV: Self = Self(SN_IR_RECV);
    /// ARP or TCP timeout
    pub const TIMEOUT: Self = Self(SN_IR_TIMEOUT);
    /// Send completed
    pub const SEND_OK: Self = Self(SN_IR_SENDOK);
    /// Every source
    pub const ALL: Self = Self(SN_IR_ALL);

    /// Create from a raw Sn_IR value, dropping undefined bits
    #[inline]
    pub const fn from_raw(raw: u8) -> Self {
        Self(raw & SN_IR_ALL)
    }

    /// Raw register value
    #[inline]
    pub const fn to_raw(self) -> u8 {
        self.0
    }

    /// Sources in either set
    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Sources in both sets
    #[inline]
    pub const fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    /// True if every source in `other` is present
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    /// True if no source is present
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

// =============================================================================
// Event Record
// =============================================================================

/// Packed interrupt event: socket index in bits 7:5, sources in bits 4:0
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Event(u8);

impl Event {
    /// Pack a socket and its sources
    pub const fn new(socket: SocketId, interrupts: SocketInterrupts) -> Self {
        Self((socket.index() << 5) | interrupts.to_raw())
    }

    /// Unpack from the raw byte
    pub const fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    /// Raw packed byte
    pub const fn to_raw(self) -> u8 {
        self.0
    }

    /// Socket that raised the event
    pub const fn socket(self) -> SocketId {
        // three bits always name a valid slot
        match SocketId::new(self.0 >> 5) {
            Some(id) => id,
            None => SocketId::S0,
        }
    }

    /// Interrupt sources carried by the event
    pub const fn interrupts(self) -> SocketInterrupts {
        SocketInterrupts::from_raw(self.0)
    }
}

// =============================================================================
// Dispatcher
// =============================================================================

impl<B: ChipBus> W5500<B> {
    /// Drain the chip's interrupt registers into the event queue
    ///
    /// Call from the interrupt handler wired to the W5500 INTn line, or from
    /// the main loop when polling. For every pending socket the observed
    /// Sn_IR bits are written back to clear them. A TCP socket reporting a
    /// connection has its TX write pointer reloaded from the chip before
    /// anything else runs. Sources outside the socket's interest mask are
    /// cleared but not queued; a full queue drops the event and counts it.
    ///
    /// Returns the number of events queued.
    pub fn service_interrupt(&mut self) -> Result<usize> {
        let pending = self.transport.read_u8(RegisterAddress::common(common::SIR))?;
        let mut queued = 0;

        for index in 0..SOCKET_COUNT as u8 {
            let Some(id) = SocketId::new(index) else {
                continue;
            };
            if pending & id.bit() == 0 {
                continue;
            }

            let ir_addr = RegisterAddress::socket(id, SN_IR);
            let raw = self.transport.read_u8(ir_addr)?;
            let observed = SocketInterrupts::from_raw(raw);

            let socket = &mut self.sockets[id.as_usize()];
            if socket.mode() == SocketMode::Tcp && observed.contains(SocketInterrupts::CON) {
                let pointer = self
                    .transport
                    .read_stable_u16(RegisterAddress::socket(id, SN_TX_WR))?;
                socket.set_tx_pointer(pointer);
            }

            if raw != 0 {
                self.transport.write_u8(ir_addr, raw)?;
            }

            let wanted = observed.intersection(socket.interest());
            if wanted.is_empty() {
                continue;
            }
            if self.events.push(Event::new(id, wanted)) {
                queued += 1;
            } else {
                #[cfg(feature = "defmt")]
                defmt::warn!("event queue full, dropped {:#x}", Event::new(id, wanted).to_raw());
            }
        }

        Ok(queued)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
