//! Server reply parsing and validation
//!
//! Replies arrive as whole Ethernet frames on the MACRAW socket. Validation
//! is a pure function of the frame and what the client currently expects, so
//! every rejection path can be exercised without a chip.

use super::{
    BOOTREPLY, DHCP_CHADDR, DHCP_COOKIE, DHCP_OP, DHCP_OPTIONS, DHCP_XID, DHCP_YIADDR, DHCPACK,
    DHCPNAK, DHCPOFFER, DhcpPhase, MAGIC_COOKIE, OPT_END, OPT_LEASE_TIME, OPT_MESSAGE_TYPE,
    OPT_PAD, OPT_ROUTER, OPT_SERVER_ID, OPT_SUBNET_MASK,
};
use crate::internal::constants::DHCP_CLIENT_PORT;
use crate::wire::{
    BROADCAST_MAC, ETH_DST, ETH_SRC, ETH_TYPE, ETHERTYPE_IPV4, IPV4_PROTO_UDP, IPV4_PROTOCOL,
    IPV4_SRC, IPV4_START, UDP_DST_PORT, UDP_PAYLOAD, UDP_START,
};

/// Shortest frame that can hold a reply: headers, fixed message, cookie
pub const MIN_REPLY_LEN: usize = UDP_PAYLOAD + DHCP_OPTIONS;

/// Why a reply was discarded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rejection {
    /// Frame too short to carry a DHCP message
    TooShort,
    /// Not IPv4/UDP addressed to the DHCP client port
    NotDhcp,
    /// Not a BOOTREPLY, or no message type option
    NotReply,
    /// Transaction id is not ours
    WrongTransaction,
    /// Neither the Ethernet destination nor chaddr names this device
    WrongHardwareAddress,
    /// Sent by a server other than the one whose offer was taken
    WrongServer,
    /// Magic cookie missing
    MissingCookie,
    /// Message type does not advance the current phase
    Stale,
    /// Server refused the request
    Nak,
}

impl Rejection {
    /// Returns a human-readable description of the rejection
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Rejection::TooShort => "reply too short",
            Rejection::NotDhcp => "not UDP to the DHCP client port",
            Rejection::NotReply => "not a DHCP reply",
            Rejection::WrongTransaction => "transaction id mismatch",
            Rejection::WrongHardwareAddress => "hardware address mismatch",
            Rejection::WrongServer => "reply from another server",
            Rejection::MissingCookie => "magic cookie missing",
            Rejection::Stale => "stale or out-of-order reply",
            Rejection::Nak => "server sent NAK",
        }
    }
}

impl core::fmt::Display for Rejection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the client is waiting for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expectation {
    /// Own hardware address
    pub mac: [u8; 6],
    /// Transaction id sent in our requests
    pub xid: [u8; 4],
    /// Current phase
    pub phase: DhcpPhase,
    /// Server whose offer was taken (ignored while discovering)
    pub server_ip: [u8; 4],
}

/// Fields extracted from an accepted reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reply {
    /// DHCP message type (option 53)
    pub message_type: u8,
    /// Address offered or assigned (yiaddr)
    pub your_ip: [u8; 4],
    /// Server identifier, or the IPv4 source if the option is absent
    pub server_ip: [u8; 4],
    /// Ethernet source of the reply
    pub server_mac: [u8; 6],
    /// Subnet mask option
    pub subnet: Option<[u8; 4]>,
    /// First router option entry
    pub router: Option<[u8; 4]>,
    /// Lease time option in seconds
    pub lease_secs: Option<u32>,
}

/// Check a received frame against the client's expectation
///
/// `frame` starts at the Ethernet destination address, without the chip's
/// length prefix.
pub fn validate(frame: &[u8], expect: &Expectation) -> Result<Reply, Rejection> {
    if frame.len() < MIN_REPLY_LEN {
        return Err(Rejection::TooShort);
    }
    if be_u16(frame, ETH_TYPE) != ETHERTYPE_IPV4
        || frame[IPV4_START + IPV4_PROTOCOL] != IPV4_PROTO_UDP
        || be_u16(frame, UDP_START + UDP_DST_PORT) != DHCP_CLIENT_PORT
    {
        return Err(Rejection::NotDhcp);
    }

    let dst = &frame[ETH_DST..ETH_DST + 6];
    let chaddr = &frame[UDP_PAYLOAD + DHCP_CHADDR..UDP_PAYLOAD + DHCP_CHADDR + 6];
    if (dst != expect.mac && dst != BROADCAST_MAC) || chaddr != expect.mac {
        return Err(Rejection::WrongHardwareAddress);
    }
    if frame[UDP_PAYLOAD + DHCP_OP] != BOOTREPLY {
        return Err(Rejection::NotReply);
    }
    if frame[UDP_PAYLOAD + DHCP_XID..UDP_PAYLOAD + DHCP_XID + 4] != expect.xid {
        return Err(Rejection::WrongTransaction);
    }
    if frame[UDP_PAYLOAD + DHCP_COOKIE..UDP_PAYLOAD + DHCP_OPTIONS] != MAGIC_COOKIE {
        return Err(Rejection::MissingCookie);
    }

    let mut reply = Reply {
        message_type: 0,
        your_ip: read_ip(frame, UDP_PAYLOAD + DHCP_YIADDR),
        server_ip: read_ip(frame, IPV4_START + IPV4_SRC),
        server_mac: [0; 6],
        subnet: None,
        router: None,
        lease_secs: None,
    };
    reply.server_mac.copy_from_slice(&frame[ETH_SRC..ETH_SRC + 6]);

    for (tag, value) in Options::new(&frame[UDP_PAYLOAD + DHCP_OPTIONS..]) {
        match (tag, value.len()) {
            (OPT_MESSAGE_TYPE, 1) => reply.message_type = value[0],
            (OPT_SERVER_ID, 4) => reply.server_ip = read_ip(value, 0),
            (OPT_SUBNET_MASK, 4) => reply.subnet = Some(read_ip(value, 0)),
            (OPT_ROUTER, len) if len >= 4 => reply.router = Some(read_ip(value, 0)),
            (OPT_LEASE_TIME, 4) => reply.lease_secs = Some(u32::from_be_bytes(read_ip(value, 0))),
            _ => {}
        }
    }
    if reply.message_type == 0 {
        return Err(Rejection::NotReply);
    }

    if matches!(expect.phase, DhcpPhase::Request | DhcpPhase::Renewing)
        && reply.server_ip != expect.server_ip
    {
        return Err(Rejection::WrongServer);
    }
    if reply.message_type == DHCPNAK {
        return Err(Rejection::Nak);
    }

    let wanted = match expect.phase {
        DhcpPhase::Discover => DHCPOFFER,
        DhcpPhase::Request | DhcpPhase::Renewing => DHCPACK,
        _ => return Err(Rejection::Stale),
    };
    if reply.message_type <= expect.phase.code() || reply.message_type != wanted {
        return Err(Rejection::Stale);
    }

    Ok(reply)
}

fn be_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_be_bytes([bytes[at], bytes[at + 1]])
}

fn read_ip(bytes: &[u8], at: usize) -> [u8; 4] {
    [bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]
}

/// Iterator over `(tag, value)` pairs of an options block
///
/// Stops at the end option or at the first option that runs past the data.
#[derive(Debug, Clone)]
pub struct Options<'a> {
    data: &'a [u8],
}

impl<'a> Options<'a> {
    /// Walk an options block, starting just after the magic cookie
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data }
    }
}

impl<'a> Iterator for Options<'a> {
    type Item = (u8, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (&tag, rest) = self.data.split_first()?;
            match tag {
                OPT_PAD => self.data = rest,
                OPT_END => {
                    self.data = &[];
                    return None;
                }
                _ => {
                    let (&len, rest) = rest.split_first()?;
                    let len = len as usize;
                    if rest.len() < len {
                        self.data = &[];
                        return None;
                    }
                    let (value, rest) = rest.split_at(len);
                    self.data = rest;
                    return Some((tag, value));
                }
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
