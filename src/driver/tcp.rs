//! TCP server driver
//!
//! The chip runs the TCP engine; this layer only drives its command and
//! status surface:
//!
//! ```text
//! CLOSED --open--> INIT --listen--> LISTEN --peer SYN--> ESTABLISHED
//!    ^                                                      |
//!    +------------------- CLOSE_WAIT <----- FIN ------------+
//! ```
//!
//! Waits are bounded by the configured kill switch, a count of status polls
//! rather than a timer.

use super::config::{SocketMode, SocketStatus};
use super::device::W5500;
use super::error::{Error, Result, SocketError};
use super::interrupt::SocketInterrupts;
use crate::hal::ChipBus;
use crate::register::socket::{
    SN_CR_DISCON, SN_CR_LISTEN, SN_CR_RECV, SN_DIPR, SN_DPORT, SN_RX_RD, SN_RX_RSR, SN_TX_FSR,
    SN_TX_WR,
};
use crate::register::{RegisterAddress, SOCKET_BUFFER_SIZE, SocketId};

/// Where a payload lives
#[derive(Debug, Clone, Copy)]
pub enum Payload<'a> {
    /// Long-lived read-only data (string tables, canned responses)
    Static(&'static [u8]),
    /// An ordinary buffer
    Borrowed(&'a [u8]),
}

impl<'a> Payload<'a> {
    /// Payload bytes
    pub const fn as_bytes(&self) -> &'a [u8] {
        match *self {
            Payload::Static(bytes) => bytes,
            Payload::Borrowed(bytes) => bytes,
        }
    }

    /// Payload length
    pub const fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// True for an empty payload
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<'a> From<&'a [u8]> for Payload<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Payload::Borrowed(bytes)
    }
}

/// Send behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SendOptions {
    /// Leave the data in the TX buffer without issuing SEND
    pub defer: bool,
}

impl SendOptions {
    /// Write and transmit
    pub const FLUSH: Self = Self { defer: false };
    /// Write only; a later non-deferred send or `commit_send` transmits
    pub const DEFER: Self = Self { defer: true };
}

/// Remote end of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Peer {
    /// Peer IP address
    pub ip: [u8; 4],
    /// Peer port
    pub port: u16,
}

impl<B: ChipBus> W5500<B> {
    /// Open a TCP socket and put it in LISTEN
    ///
    /// The socket must have been initialised in TCP mode. A peer that connects
    /// before the final poll is accepted: ESTABLISHED counts as success.
    /// Interrupts are armed only on success.
    ///
    /// # Errors
    ///
    /// [`SocketError::ListenTimeout`] carrying the last status seen if either
    /// wait runs out of polls.
    pub fn tcp_listen(&mut self, id: SocketId) -> Result<SocketStatus> {
        self.socket_open(id)?;
        if self.wait_for_status(id, |s| s == SocketStatus::Init)?.is_none() {
            #[cfg(feature = "defmt")]
            defmt::warn!("socket {} stuck in {} after OPEN", id.index(), self.socket(id).status());
            return Err(SocketError::ListenTimeout(self.socket(id).status()).into());
        }

        self.command(id, SN_CR_LISTEN)?;
        let Some(status) = self.wait_for_status(id, |s| {
            matches!(s, SocketStatus::Listen | SocketStatus::Established)
        })?
        else {
            #[cfg(feature = "defmt")]
            defmt::warn!(
                "socket {} stuck in {} after LISTEN",
                id.index(),
                self.socket(id).status()
            );
            return Err(SocketError::ListenTimeout(self.socket(id).status()).into());
        };

        self.toggle_interrupts(id, true)?;

        #[cfg(feature = "defmt")]
        defmt::info!("socket {} listening on port {}", id.index(), self.socket(id).port());

        Ok(status)
    }

    /// Queue a payload in the TX buffer and, unless deferred, send it
    ///
    /// The payload is written at the software TX pointer, which then advances
    /// by its length. A payload is never split across sends.
    ///
    /// # Errors
    ///
    /// - [`SocketError::PayloadTooLarge`] if it can never fit the TX buffer
    /// - [`SocketError::InsufficientSpace`] if Sn_TX_FSR, less whatever earlier
    ///   deferred sends left uncommitted, is smaller than the payload; nothing
    ///   is written and the pointer does not move
    pub fn tcp_send(
        &mut self,
        id: SocketId,
        payload: Payload<'_>,
        options: SendOptions,
    ) -> Result<()> {
        let data = payload.as_bytes();
        if data.len() > SOCKET_BUFFER_SIZE as usize {
            return Err(SocketError::PayloadTooLarge.into());
        }
        let len = data.len() as u16;

        let free = self
            .transport
            .read_stable_u16(RegisterAddress::socket(id, SN_TX_FSR))?;
        // Sn_TX_FSR still counts bytes written by deferred sends
        let committed = self
            .transport
            .read_stable_u16(RegisterAddress::socket(id, SN_TX_WR))?;
        let pending = self.sockets[id.as_usize()]
            .tx_pointer()
            .wrapping_sub(committed);
        if len > free.saturating_sub(pending) {
            return Err(SocketError::InsufficientSpace.into());
        }

        let start = self.sockets[id.as_usize()].tx_pointer();
        let target = RegisterAddress::tx_buffer(id, start);
        match payload {
            Payload::Static(bytes) => self.transport.write_static(target, bytes)?,
            Payload::Borrowed(bytes) => self.transport.write(target, bytes)?,
        }
        self.sockets[id.as_usize()].advance_tx_pointer(len);

        if !options.defer {
            self.commit_send(id)?;
        }
        Ok(())
    }

    /// Copy received data into `buf` and acknowledge the whole segment
    ///
    /// Copies `min(buf.len(), Sn_RX_RSR)` bytes, then moves Sn_RX_RD past
    /// everything the chip reported and issues RECV. Bytes that did not fit
    /// are discarded.
    ///
    /// Returns the number of bytes copied.
    pub fn tcp_read_received(&mut self, id: SocketId, buf: &mut [u8]) -> Result<usize> {
        let received = self
            .transport
            .read_stable_u16(RegisterAddress::socket(id, SN_RX_RSR))?;
        if received == 0 {
            return Ok(0);
        }

        let rd_addr = RegisterAddress::socket(id, SN_RX_RD);
        let read_pointer = self.transport.read_stable_u16(rd_addr)?;
        let copied = self.transport.read(
            RegisterAddress::rx_buffer(id, read_pointer),
            buf,
            received as usize,
        )?;

        self.transport
            .write_u16(rd_addr, read_pointer.wrapping_add(received))?;
        self.command(id, SN_CR_RECV)?;
        Ok(copied)
    }

    /// Send FIN to the peer
    pub fn tcp_disconnect(&mut self, id: SocketId) -> Result<()> {
        self.command(id, SN_CR_DISCON)
    }

    /// Close the socket and disarm its interrupts
    pub fn tcp_close(&mut self, id: SocketId) -> Result<()> {
        self.socket_close(id)
    }

    /// Address and port of the connected peer
    pub fn tcp_peer(&mut self, id: SocketId) -> Result<Peer> {
        let mut ip = [0u8; 4];
        self.transport
            .read(RegisterAddress::socket(id, SN_DIPR), &mut ip, 4)?;
        let port = self
            .transport
            .read_u16(RegisterAddress::socket(id, SN_DPORT))?;
        Ok(Peer { ip, port })
    }

    /// Poll Sn_SR until `done` accepts it or the kill switch runs out
    fn wait_for_status<F>(&mut self, id: SocketId, done: F) -> Result<Option<SocketStatus>>
    where
        F: Fn(SocketStatus) -> bool,
    {
        for _ in 0..self.config.listen_kill_switch {
            let status = self.refresh_status(id)?;
            if done(status) {
                return Ok(Some(status));
            }
        }
        Ok(None)
    }
}

// =============================================================================
// TCP Server Helper
// =============================================================================

/// Listening TCP service bound to one socket
///
/// # Example
///
/// ```ignore
/// let server = TcpServer::new(SocketId::S1, 9999);
/// server.start(&mut w5500)?;
///
/// // after a disconnect event
/// server.restart(&mut w5500)?;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TcpServer {
    socket: SocketId,
    port: u16,
    interest: SocketInterrupts,
    attempts: u8,
}

impl TcpServer {
    /// Server on `socket` listening at `port`, interested in receive,
    /// disconnect and timeout events
    pub const fn new(socket: SocketId, port: u16) -> Self {
        Self {
            socket,
            port,
            interest: SocketInterrupts::RECV
                .union(SocketInterrupts::DISCON)
                .union(SocketInterrupts::TIMEOUT),
            attempts: crate::internal::constants::LISTEN_ATTEMPTS,
        }
    }

    /// Override the interest mask
    #[must_use]
    pub const fn with_interest(mut self, interest: SocketInterrupts) -> Self {
        self.interest = interest;
        self
    }

    /// Override how many `listen` attempts `start` makes
    #[must_use]
    pub const fn with_attempts(mut self, attempts: u8) -> Self {
        self.attempts = if attempts == 0 { 1 } else { attempts };
        self
    }

    /// Socket the server runs on
    pub const fn socket(&self) -> SocketId {
        self.socket
    }

    /// Listening port
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Initialise the socket in TCP mode and listen, retrying on timeout
    pub fn start<B: ChipBus>(&self, dev: &mut W5500<B>) -> Result<SocketStatus> {
        let mut last = Err(SocketError::ListenTimeout(SocketStatus::Closed).into());
        for _ in 0..self.attempts {
            dev.socket_initialise(self.socket, SocketMode::Tcp, self.port, self.interest)?;
            last = dev.tcp_listen(self.socket);
            match last {
                Err(Error::Socket(SocketError::ListenTimeout(_))) => {
                    dev.socket_close(self.socket)?;
                }
                _ => break,
            }
        }
        last
    }

    /// Close whatever is on the socket and listen again
    pub fn restart<B: ChipBus>(&self, dev: &mut W5500<B>) -> Result<SocketStatus> {
        dev.socket_close(self.socket)?;
        self.start(dev)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
