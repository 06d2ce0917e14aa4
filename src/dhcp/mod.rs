//! DHCP client
//!
//! Acquires an address before the chip has one, so it cannot use the chip's
//! UDP engine: requests are composed as whole Ethernet frames on socket 0 in
//! MACRAW mode and replies are parsed from raw frames. Once a lease is bound
//! the socket is reopened as an ordinary UDP endpoint on port 68.
//!
//! # Lease cycle
//!
//! ```text
//!          OFFER             ACK              next poll
//! Discover -----> Request ------> Freshly --------------> Acquired
//!    ^               |            Acquired                   |
//!    |   NAK/retries |                ^  ACK                 | half lease
//!    +---------------+                +------- Renewing <----+
//!    |                                            |  full lease
//!    +------------------ Expired <----------------+----------+
//! ```
//!
//! Time is a tick counter advanced once per [`W5500::dhcp_poll`]. The
//! counter is zeroed when a lease is bound; renewal starts at half the lease
//! and the lease expires at its full length.

mod frame;
mod reply;

pub use reply::{Expectation, MIN_REPLY_LEN, Options, Rejection, Reply, validate};

use crate::driver::config::SocketMode;
use crate::driver::device::W5500;
use crate::driver::error::Result;
use crate::driver::interrupt::SocketInterrupts;
use crate::hal::ChipBus;
use crate::internal::constants::{DEFAULT_LEASE_SECS, DHCP_CLIENT_PORT};
use crate::register::socket::{SN_CR_RECV, SN_RX_RD, SN_RX_RSR};
use crate::register::{RegisterAddress, SOCKET_BUFFER_SIZE, SocketId};
use crate::wire::ETH_HEADER_LEN;

// =============================================================================
// Message Layout
// =============================================================================

/// BOOTP request opcode
pub const BOOTREQUEST: u8 = 1;
/// BOOTP reply opcode
pub const BOOTREPLY: u8 = 2;
/// Hardware type: Ethernet
pub const HTYPE_ETHERNET: u8 = 1;
/// Hardware address length
pub const HLEN_ETHERNET: u8 = 6;
/// Broadcast flag, high byte of the flags field
pub const FLAG_BROADCAST: u8 = 0x80;

// Offsets relative to the start of the DHCP message
/// Opcode
pub const DHCP_OP: usize = 0;
/// Transaction id
pub const DHCP_XID: usize = 4;
/// Flags
pub const DHCP_FLAGS: usize = 10;
/// Client address
pub const DHCP_CIADDR: usize = 12;
/// Offered address
pub const DHCP_YIADDR: usize = 16;
/// Client hardware address
pub const DHCP_CHADDR: usize = 28;
/// Bytes up to and including the used part of chaddr
pub const DHCP_HEADER_LEN: usize = DHCP_CHADDR + HLEN_ETHERNET as usize;
/// Unused chaddr, sname and file bytes
pub const DHCP_ZERO_FILL: usize = 202;
/// Magic cookie
pub const DHCP_COOKIE: usize = DHCP_HEADER_LEN + DHCP_ZERO_FILL;
/// First option byte
pub const DHCP_OPTIONS: usize = DHCP_COOKIE + MAGIC_COOKIE.len();

/// Marks the start of the options block
pub const MAGIC_COOKIE: [u8; 4] = [0x63, 0x82, 0x53, 0x63];

// Message types (option 53)
/// DHCPDISCOVER
pub const DHCPDISCOVER: u8 = 1;
/// DHCPOFFER
pub const DHCPOFFER: u8 = 2;
/// DHCPREQUEST
pub const DHCPREQUEST: u8 = 3;
/// DHCPACK
pub const DHCPACK: u8 = 5;
/// DHCPNAK
pub const DHCPNAK: u8 = 6;

// Option tags
/// Pad
pub const OPT_PAD: u8 = 0;
/// Subnet mask
pub const OPT_SUBNET_MASK: u8 = 1;
/// Router list
pub const OPT_ROUTER: u8 = 3;
/// Requested IP address
pub const OPT_REQUESTED_IP: u8 = 50;
/// Lease time in seconds
pub const OPT_LEASE_TIME: u8 = 51;
/// Message type
pub const OPT_MESSAGE_TYPE: u8 = 53;
/// Server identifier
pub const OPT_SERVER_ID: u8 = 54;
/// Parameter request list
pub const OPT_PARAMETER_LIST: u8 = 55;
/// End of options
pub const OPT_END: u8 = 255;

/// Longest received frame the client inspects; options past this are ignored
const REPLY_BUFFER_LEN: usize = 600;

// =============================================================================
// Lease State
// =============================================================================

/// Position in the lease cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DhcpPhase {
    /// Client not started
    #[default]
    Idle,
    /// Broadcasting DHCPDISCOVER, waiting for an offer
    Discover,
    /// Requesting the offered address, waiting for an ACK
    Request,
    /// Bound, asking the server to extend the lease
    Renewing,
    /// ACK applied on this tick; becomes `Acquired` on the next poll
    FreshlyAcquired,
    /// Bound
    Acquired,
    /// Lease ran out; discovery restarts on the next poll
    Expired,
}

impl DhcpPhase {
    /// Message type sent in this phase; replies must carry a larger one
    pub const fn code(self) -> u8 {
        match self {
            DhcpPhase::Discover => DHCPDISCOVER,
            DhcpPhase::Request | DhcpPhase::Renewing => DHCPREQUEST,
            DhcpPhase::FreshlyAcquired | DhcpPhase::Acquired => DHCPACK,
            DhcpPhase::Idle | DhcpPhase::Expired => 0,
        }
    }

    /// True while a server reply can move the phase
    pub const fn awaiting_reply(self) -> bool {
        matches!(
            self,
            DhcpPhase::Discover | DhcpPhase::Request | DhcpPhase::Renewing
        )
    }

    /// True while the chip holds a valid address
    pub const fn is_bound(self) -> bool {
        matches!(
            self,
            DhcpPhase::FreshlyAcquired | DhcpPhase::Acquired | DhcpPhase::Renewing
        )
    }
}

/// Network identity granted by a server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Lease {
    /// Our address
    pub ip: [u8; 4],
    /// Server that made the offer
    pub server_ip: [u8; 4],
    /// Hardware address the offer came from
    pub server_mac: [u8; 6],
    /// Subnet mask
    pub subnet: [u8; 4],
    /// Default gateway
    pub gateway: [u8; 4],
    /// Lease length in seconds
    pub lease_secs: u32,
}

impl Lease {
    /// No lease
    pub const EMPTY: Self = Self {
        ip: [0; 4],
        server_ip: [0; 4],
        server_mac: [0; 6],
        subnet: [0; 4],
        gateway: [0; 4],
        lease_secs: 0,
    };
}

/// DHCP client state, owned by the device context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DhcpClient {
    socket: SocketId,
    preferred_ip: [u8; 4],
    phase: DhcpPhase,
    lease: Lease,
    ticks: u32,
    last_tx: u32,
    request_attempts: u8,
}

impl DhcpClient {
    /// Idle client on `socket`, asking for `preferred_ip` when discovering
    pub const fn new(socket: SocketId, preferred_ip: [u8; 4]) -> Self {
        Self {
            socket,
            preferred_ip,
            phase: DhcpPhase::Idle,
            lease: Lease::EMPTY,
            ticks: 0,
            last_tx: 0,
            request_attempts: 0,
        }
    }

    /// Socket the client runs on
    pub const fn socket(&self) -> SocketId {
        self.socket
    }

    /// Current phase
    pub const fn phase(&self) -> DhcpPhase {
        self.phase
    }

    /// Lease as far as it is known (offer details while requesting)
    pub const fn lease(&self) -> &Lease {
        &self.lease
    }

    /// Polls since the lease was bound, or since the client started
    pub const fn ticks(&self) -> u32 {
        self.ticks
    }

    /// REQUEST transmissions in the current phase
    pub const fn request_attempts(&self) -> u8 {
        self.request_attempts
    }

    fn quiet_for(&self, period: u32) -> bool {
        self.ticks.wrapping_sub(self.last_tx) >= period
    }
}

// =============================================================================
// Client Operations
// =============================================================================

impl<B: ChipBus> W5500<B> {
    /// Start address acquisition
    ///
    /// Puts the DHCP socket in MACRAW mode and broadcasts the first
    /// DHCPDISCOVER.
    pub fn dhcp_start(&mut self) -> Result<()> {
        self.dhcp.ticks = 0;
        self.begin_discovery()
    }

    /// Advance the lease clock by one tick
    ///
    /// Call once per main-loop iteration. Handles retransmission, the
    /// freshly-acquired fold, renewal at half the lease, expiry at the full
    /// lease and restarting discovery after expiry.
    pub fn dhcp_poll(&mut self) -> Result<DhcpPhase> {
        self.dhcp.ticks = self.dhcp.ticks.wrapping_add(1);
        let lease_ticks = self.config.lease_ticks(self.dhcp.lease.lease_secs);
        let quiet = self.dhcp.quiet_for(self.config.retransmit_ticks);

        match self.dhcp.phase {
            DhcpPhase::FreshlyAcquired => self.dhcp.phase = DhcpPhase::Acquired,
            DhcpPhase::Acquired | DhcpPhase::Renewing if self.dhcp.ticks >= lease_ticks => {
                self.expire();
            }
            DhcpPhase::Acquired if self.dhcp.ticks >= lease_ticks / 2 => self.begin_renewal()?,
            DhcpPhase::Expired => self.begin_discovery()?,
            DhcpPhase::Request
                if quiet && self.dhcp.request_attempts >= self.config.request_retries =>
            {
                #[cfg(feature = "defmt")]
                defmt::warn!("DHCP: no ACK after {} requests", self.dhcp.request_attempts);
                self.dhcp.lease = Lease::EMPTY;
                self.dhcp.request_attempts = 0;
                self.dhcp.phase = DhcpPhase::Discover;
                self.dhcp_send()?;
            }
            DhcpPhase::Discover | DhcpPhase::Request | DhcpPhase::Renewing if quiet => {
                self.dhcp_send()?;
            }
            _ => {}
        }

        Ok(self.dhcp.phase)
    }

    /// Consume one received frame from the DHCP socket
    ///
    /// Called by the main loop for receive events on the DHCP socket. Does
    /// nothing unless a reply is awaited. A length prefix that cannot belong
    /// to a frame means the read pointer lost sync; everything pending is
    /// skipped. Replies that fail validation are discarded.
    pub fn dhcp_handle_arrival(&mut self) -> Result<()> {
        if !self.dhcp.phase.awaiting_reply() {
            return Ok(());
        }
        let id = self.dhcp.socket;

        let pending = self
            .transport
            .read_stable_u16(RegisterAddress::socket(id, SN_RX_RSR))?;
        if pending == 0 {
            return Ok(());
        }
        let rd_addr = RegisterAddress::socket(id, SN_RX_RD);
        let read_pointer = self.transport.read_stable_u16(rd_addr)?;

        let prefix = self
            .transport
            .read_u16(RegisterAddress::rx_buffer(id, read_pointer))?;
        if prefix < (2 + ETH_HEADER_LEN) as u16 || prefix > SOCKET_BUFFER_SIZE || prefix > pending {
            #[cfg(feature = "defmt")]
            defmt::warn!("DHCP: bad length prefix {}, skipping {} bytes", prefix, pending);
            self.transport
                .write_u16(rd_addr, read_pointer.wrapping_add(pending))?;
            self.command(id, SN_CR_RECV)?;
            return Ok(());
        }

        let mut frame = [0u8; REPLY_BUFFER_LEN];
        let copied = self.transport.read(
            RegisterAddress::rx_buffer(id, read_pointer.wrapping_add(2)),
            &mut frame,
            (prefix - 2) as usize,
        )?;
        self.transport
            .write_u16(rd_addr, read_pointer.wrapping_add(prefix))?;
        self.command(id, SN_CR_RECV)?;

        let expectation = Expectation {
            mac: self.config.mac_address,
            xid: self.config.dhcp_xid,
            phase: self.dhcp.phase,
            server_ip: self.dhcp.lease.server_ip,
        };
        match validate(&frame[..copied], &expectation) {
            Ok(reply) => self.apply(&reply),
            Err(Rejection::Nak) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("DHCP: NAK in {}", self.dhcp.phase);
                self.dhcp.lease = Lease::EMPTY;
                if self.dhcp.phase == DhcpPhase::Discover {
                    return Ok(());
                }
                self.dhcp.phase = DhcpPhase::Discover;
                self.dhcp_send()
            }
            Err(_rejection) => {
                #[cfg(feature = "defmt")]
                defmt::debug!("DHCP: discarded reply: {}", _rejection.as_str());
                Ok(())
            }
        }
    }

    /// Current phase of the lease cycle
    pub fn dhcp_phase(&self) -> DhcpPhase {
        self.dhcp.phase
    }

    /// Lease details, meaningful once [`DhcpPhase::is_bound`]
    pub fn lease(&self) -> &Lease {
        self.dhcp.lease()
    }

    /// Client state, for diagnostics
    pub fn dhcp(&self) -> &DhcpClient {
        &self.dhcp
    }

    fn apply(&mut self, reply: &Reply) -> Result<()> {
        match self.dhcp.phase {
            DhcpPhase::Discover => {
                self.dhcp.lease.ip = reply.your_ip;
                self.dhcp.lease.server_ip = reply.server_ip;
                self.dhcp.lease.server_mac = reply.server_mac;
                self.dhcp.phase = DhcpPhase::Request;
                self.dhcp.request_attempts = 0;

                #[cfg(feature = "defmt")]
                defmt::info!(
                    "DHCP: offer {=[u8]} from {=[u8]}",
                    reply.your_ip[..],
                    reply.server_ip[..]
                );

                self.dhcp_send()
            }
            DhcpPhase::Request | DhcpPhase::Renewing => {
                let lease = &mut self.dhcp.lease;
                lease.ip = reply.your_ip;
                lease.subnet = reply.subnet.unwrap_or(self.config.subnet_mask);
                lease.gateway = reply.router.unwrap_or(self.config.gateway);
                lease.lease_secs = reply.lease_secs.unwrap_or(DEFAULT_LEASE_SECS);
                self.dhcp.ticks = 0;
                self.dhcp.last_tx = 0;
                self.dhcp.request_attempts = 0;

                let lease = self.dhcp.lease;
                self.set_network(lease.ip, lease.subnet, lease.gateway)?;

                let id = self.dhcp.socket;
                self.socket_close(id)?;
                self.socket_initialise(
                    id,
                    SocketMode::Udp,
                    DHCP_CLIENT_PORT,
                    SocketInterrupts::RECV,
                )?;
                self.socket_open(id)?;
                self.dhcp.phase = DhcpPhase::FreshlyAcquired;

                #[cfg(feature = "defmt")]
                defmt::info!(
                    "DHCP: bound {=[u8]} for {}s",
                    lease.ip[..],
                    lease.lease_secs
                );

                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn begin_discovery(&mut self) -> Result<()> {
        self.open_raw()?;
        self.dhcp.lease = Lease::EMPTY;
        self.dhcp.request_attempts = 0;
        self.dhcp.phase = DhcpPhase::Discover;
        self.dhcp_send()
    }

    fn begin_renewal(&mut self) -> Result<()> {
        self.open_raw()?;
        self.dhcp.request_attempts = 0;
        self.dhcp.phase = DhcpPhase::Renewing;
        self.dhcp_send()
    }

    fn expire(&mut self) {
        #[cfg(feature = "defmt")]
        defmt::warn!("DHCP: lease on {=[u8]} expired", self.dhcp.lease.ip[..]);
        self.dhcp.phase = DhcpPhase::Expired;
        self.dhcp.ticks = 0;
    }

    fn open_raw(&mut self) -> Result<()> {
        let id = self.dhcp.socket;
        self.socket_close(id)?;
        self.socket_initialise(
            id,
            SocketMode::MacRaw,
            DHCP_CLIENT_PORT,
            SocketInterrupts::RECV,
        )?;
        self.socket_open(id)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
