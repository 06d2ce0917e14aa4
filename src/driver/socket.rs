//! Socket manager
//!
//! A [`Socket`] is the local record of one hardware slot. The W5500 keeps the
//! real connection state; the record holds what the driver needs between
//! register reads: the mode and port it was configured with, the caller's
//! interrupt interest, the last status read and the TX write pointer.
//!
//! The TX write pointer is authoritative in software between sync points.
//! It is reloaded from Sn_TX_WR on initialise, on open, and by the interrupt
//! dispatcher when a TCP connection comes up.

use super::config::{SocketMode, SocketStatus};
use super::device::W5500;
use super::error::Result;
use super::interrupt::SocketInterrupts;
use crate::hal::ChipBus;
use crate::register::socket::{
    SN_CR, SN_CR_CLOSE, SN_CR_OPEN, SN_CR_SEND, SN_CR_SEND_MAC, SN_IMR, SN_MR, SN_PORT, SN_SR,
    SN_TX_WR,
};
use crate::register::{RegisterAddress, SOCKET_COUNT, SocketId, common};

// =============================================================================
// Socket Record
// =============================================================================

/// Local record of one hardware socket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Socket {
    id: SocketId,
    status: SocketStatus,
    mode: SocketMode,
    port: u16,
    interest: SocketInterrupts,
    tx_pointer: u16,
}

impl Socket {
    /// Unconfigured record for slot `id`
    pub const fn new(id: SocketId) -> Self {
        Self {
            id,
            status: SocketStatus::Closed,
            mode: SocketMode::Closed,
            port: 0,
            interest: SocketInterrupts::NONE,
            tx_pointer: 0,
        }
    }

    /// One record per hardware slot, in slot order
    pub(crate) const fn table() -> [Socket; SOCKET_COUNT] {
        let mut table = [Socket::new(SocketId::S0); SOCKET_COUNT];
        let mut index = 0;
        while index < SOCKET_COUNT {
            if let Some(id) = SocketId::new(index as u8) {
                table[index] = Socket::new(id);
            }
            index += 1;
        }
        table
    }

    /// Hardware slot
    pub const fn id(&self) -> SocketId {
        self.id
    }

    /// Status as of the last [`W5500::refresh_status`]
    pub const fn status(&self) -> SocketStatus {
        self.status
    }

    /// Configured protocol mode
    pub const fn mode(&self) -> SocketMode {
        self.mode
    }

    /// Bound local port
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Interrupt sources the owner wants queued
    pub const fn interest(&self) -> SocketInterrupts {
        self.interest
    }

    /// Sources armed in Sn_IMR while interrupts are on
    ///
    /// TCP sockets always arm CON so the dispatcher can resync the TX
    /// pointer when a peer connects.
    pub const fn armed(&self) -> SocketInterrupts {
        match self.mode {
            SocketMode::Tcp => self.interest.union(SocketInterrupts::CON),
            _ => self.interest,
        }
    }

    /// Software TX write pointer
    pub const fn tx_pointer(&self) -> u16 {
        self.tx_pointer
    }

    pub(crate) fn set_tx_pointer(&mut self, pointer: u16) {
        self.tx_pointer = pointer;
    }

    pub(crate) fn advance_tx_pointer(&mut self, len: u16) {
        self.tx_pointer = self.tx_pointer.wrapping_add(len);
    }
}

// =============================================================================
// Socket Manager Operations
// =============================================================================

impl<B: ChipBus> W5500<B> {
    /// Configure a socket without opening it
    ///
    /// Writes port and mode, records the interest mask, leaves interrupts
    /// off and loads the TX write pointer from the chip.
    pub fn socket_initialise(
        &mut self,
        id: SocketId,
        mode: SocketMode,
        port: u16,
        interest: SocketInterrupts,
    ) -> Result<()> {
        self.transport
            .write_u16(RegisterAddress::socket(id, SN_PORT), port)?;
        self.transport
            .write_u8(RegisterAddress::socket(id, SN_MR), mode.to_reg_value())?;

        let socket = &mut self.sockets[id.as_usize()];
        socket.mode = mode;
        socket.port = port;
        socket.interest = interest;

        self.toggle_interrupts(id, false)?;
        self.reload_tx_pointer(id)?;

        #[cfg(feature = "defmt")]
        defmt::debug!("socket {} initialised as {} on port {}", id.index(), mode, port);

        Ok(())
    }

    /// Issue OPEN
    ///
    /// Non-TCP sockets have their interrupts armed straight away; TCP sockets
    /// wait until `tcp_listen` succeeds. Opening resets the chip's TX pointer,
    /// so it is read back.
    pub fn socket_open(&mut self, id: SocketId) -> Result<()> {
        self.command(id, SN_CR_OPEN)?;
        if self.sockets[id.as_usize()].mode != SocketMode::Tcp {
            self.toggle_interrupts(id, true)?;
        }
        self.reload_tx_pointer(id)
    }

    /// Issue CLOSE and disarm every interrupt source for the slot
    pub fn socket_close(&mut self, id: SocketId) -> Result<()> {
        self.command(id, SN_CR_CLOSE)?;
        self.set_global_mask(id, false)?;
        self.transport
            .write_u8(RegisterAddress::socket(id, SN_IMR), 0)?;
        self.sockets[id.as_usize()].status = SocketStatus::Closed;
        Ok(())
    }

    /// Copy Sn_SR into the socket record and return it
    pub fn refresh_status(&mut self, id: SocketId) -> Result<SocketStatus> {
        let raw = self.transport.read_u8(RegisterAddress::socket(id, SN_SR))?;
        let status = SocketStatus::from_raw(raw);
        self.sockets[id.as_usize()].status = status;
        Ok(status)
    }

    /// Arm or disarm a socket's interrupts
    ///
    /// Updates the socket's bit in SIMR and its Sn_IMR. Disarming a TCP
    /// socket leaves CON set in Sn_IMR.
    pub fn toggle_interrupts(&mut self, id: SocketId, on: bool) -> Result<()> {
        self.set_global_mask(id, on)?;
        let socket = &self.sockets[id.as_usize()];
        let mask = if on {
            socket.armed()
        } else if socket.mode == SocketMode::Tcp {
            SocketInterrupts::CON
        } else {
            SocketInterrupts::NONE
        };
        self.transport
            .write_u8(RegisterAddress::socket(id, SN_IMR), mask.to_raw())?;
        Ok(())
    }

    /// Publish the software TX pointer and start transmission
    ///
    /// MACRAW sockets use SEND_MAC, everything else SEND.
    pub fn commit_send(&mut self, id: SocketId) -> Result<()> {
        let socket = self.sockets[id.as_usize()];
        self.transport
            .write_u16(RegisterAddress::socket(id, SN_TX_WR), socket.tx_pointer)?;
        let command = match socket.mode {
            SocketMode::MacRaw => SN_CR_SEND_MAC,
            _ => SN_CR_SEND,
        };
        self.command(id, command)
    }

    pub(crate) fn command(&mut self, id: SocketId, command: u8) -> Result<()> {
        self.transport
            .write_u8(RegisterAddress::socket(id, SN_CR), command)?;
        Ok(())
    }

    fn reload_tx_pointer(&mut self, id: SocketId) -> Result<()> {
        let pointer = self
            .transport
            .read_stable_u16(RegisterAddress::socket(id, SN_TX_WR))?;
        self.sockets[id.as_usize()].tx_pointer = pointer;
        Ok(())
    }

    fn set_global_mask(&mut self, id: SocketId, on: bool) -> Result<()> {
        let simr = RegisterAddress::common(common::SIMR);
        let current = self.transport.read_u8(simr)?;
        let updated = if on {
            current | id.bit()
        } else {
            current & !id.bit()
        };
        self.transport.write_u8(simr, updated)?;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::driver::config::NetConfig;
    use crate::register::socket::{
        SN_IR_CON, SN_IR_RECV, SN_MR_MACRAW, SN_MR_TCP, SOCK_MACRAW, SOCK_UDP,
    };
    use crate::test_utils::MockChip;

    fn device(chip: &MockChip) -> W5500<&MockChip> {
        W5500::new(chip, NetConfig::new())
    }

    #[test]
    fn initialise_writes_port_mode_and_loads_pointer() {
        let chip = MockChip::new();
        chip.set_socket_u16(SocketId::S1, SN_TX_WR, 0x0123);
        let mut dev = device(&chip);

        dev.socket_initialise(SocketId::S1, SocketMode::Tcp, 9999, SocketInterrupts::RECV)
            .unwrap();

        assert_eq!(chip.socket_u16(SocketId::S1, SN_PORT), 9999);
        assert_eq!(chip.socket_reg(SocketId::S1, SN_MR), SN_MR_TCP);
        let socket = dev.socket(SocketId::S1);
        assert_eq!(socket.tx_pointer(), 0x0123);
        assert_eq!(socket.interest(), SocketInterrupts::RECV);
        assert_eq!(socket.port(), 9999);
        // interrupts start off, CON stays armed for TCP
        assert_eq!(chip.common_reg(common::SIMR) & SocketId::S1.bit(), 0);
        assert_eq!(chip.socket_reg(SocketId::S1, SN_IMR), SN_IR_CON);
    }

    #[test]
    fn tcp_open_defers_arming() {
        let chip = MockChip::new();
        let mut dev = device(&chip);
        dev.socket_initialise(SocketId::S1, SocketMode::Tcp, 80, SocketInterrupts::RECV)
            .unwrap();

        dev.socket_open(SocketId::S1).unwrap();

        assert_eq!(chip.commands(), std::vec![(1, SN_CR_OPEN)]);
        assert_eq!(chip.common_reg(common::SIMR) & SocketId::S1.bit(), 0);
    }

    #[test]
    fn raw_open_arms_immediately_and_rereads_pointer() {
        let chip = MockChip::new();
        let mut dev = device(&chip);
        dev.socket_initialise(SocketId::S0, SocketMode::MacRaw, 68, SocketInterrupts::RECV)
            .unwrap();
        chip.set_socket_u16(SocketId::S0, SN_TX_WR, 0x0040);

        dev.socket_open(SocketId::S0).unwrap();

        assert_eq!(chip.socket_reg(SocketId::S0, SN_MR), SN_MR_MACRAW);
        assert_eq!(chip.common_reg(common::SIMR) & SocketId::S0.bit(), 1);
        assert_eq!(chip.socket_reg(SocketId::S0, SN_IMR), SN_IR_RECV);
        assert_eq!(dev.socket(SocketId::S0).tx_pointer(), 0x0040);
        assert_eq!(dev.refresh_status(SocketId::S0).unwrap().to_raw(), SOCK_MACRAW);
    }

    #[test]
    fn toggle_never_clears_tcp_connect_bit() {
        let chip = MockChip::new();
        let mut dev = device(&chip);
        dev.socket_initialise(SocketId::S1, SocketMode::Tcp, 80, SocketInterrupts::RECV)
            .unwrap();

        dev.toggle_interrupts(SocketId::S1, true).unwrap();
        assert_eq!(chip.socket_reg(SocketId::S1, SN_IMR), SN_IR_RECV | SN_IR_CON);
        assert_ne!(chip.common_reg(common::SIMR) & SocketId::S1.bit(), 0);

        dev.toggle_interrupts(SocketId::S1, false).unwrap();
        assert_eq!(chip.socket_reg(SocketId::S1, SN_IMR), SN_IR_CON);
        assert_eq!(chip.common_reg(common::SIMR) & SocketId::S1.bit(), 0);
    }

    #[test]
    fn toggle_preserves_other_sockets_in_simr() {
        let chip = MockChip::new();
        chip.set_common_reg(common::SIMR, 0b1000_0001);
        let mut dev = device(&chip);
        dev.socket_initialise(SocketId::S1, SocketMode::Udp, 5000, SocketInterrupts::RECV)
            .unwrap();

        dev.toggle_interrupts(SocketId::S1, true).unwrap();

        assert_eq!(chip.common_reg(common::SIMR), 0b1000_0011);
    }

    #[test]
    fn close_disarms_everything() {
        let chip = MockChip::new();
        let mut dev = device(&chip);
        dev.socket_initialise(SocketId::S1, SocketMode::Tcp, 80, SocketInterrupts::ALL)
            .unwrap();
        dev.toggle_interrupts(SocketId::S1, true).unwrap();

        dev.socket_close(SocketId::S1).unwrap();

        assert_eq!(chip.socket_reg(SocketId::S1, SN_IMR), 0);
        assert_eq!(chip.common_reg(common::SIMR), 0);
        assert_eq!(dev.refresh_status(SocketId::S1).unwrap(), SocketStatus::Closed);
    }

    #[test]
    fn refresh_status_updates_record() {
        let chip = MockChip::new();
        let mut dev = device(&chip);
        chip.set_socket_reg(SocketId::new(2).unwrap(), SN_SR, SOCK_UDP);

        let id = SocketId::new(2).unwrap();
        assert_eq!(dev.socket(id).status(), SocketStatus::Closed);
        assert_eq!(dev.refresh_status(id).unwrap(), SocketStatus::Udp);
        assert_eq!(dev.socket(id).status(), SocketStatus::Udp);
    }

    #[test]
    fn commit_send_picks_command_by_mode() {
        let chip = MockChip::new();
        let mut dev = device(&chip);
        dev.socket_initialise(SocketId::S0, SocketMode::MacRaw, 68, SocketInterrupts::RECV)
            .unwrap();
        dev.socket_initialise(SocketId::S1, SocketMode::Tcp, 80, SocketInterrupts::RECV)
            .unwrap();
        dev.sockets[0].advance_tx_pointer(10);
        dev.sockets[1].advance_tx_pointer(20);

        dev.commit_send(SocketId::S0).unwrap();
        dev.commit_send(SocketId::S1).unwrap();

        assert_eq!(chip.socket_u16(SocketId::S0, SN_TX_WR), 10);
        assert_eq!(chip.socket_u16(SocketId::S1, SN_TX_WR), 20);
        assert_eq!(chip.commands(), std::vec![(0, SN_CR_SEND_MAC), (1, SN_CR_SEND)]);
    }
}
