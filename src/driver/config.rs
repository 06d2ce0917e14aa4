//! Configuration types for the W5500 driver

use crate::internal::constants::{
    DEFAULT_DHCP_XID, DEFAULT_GATEWAY, DEFAULT_IP_ADDR, DEFAULT_MAC_ADDR, DEFAULT_REQUEST_RETRIES,
    DEFAULT_RETRANSMIT_TICKS, DEFAULT_SUBNET_MASK, DEFAULT_TCP_PORT, DEFAULT_TICKS_PER_SECOND,
    LISTEN_KILL_SWITCH,
};
use crate::register::socket::{
    SN_MR_MACRAW, SN_MR_TCP, SN_MR_UDP, SOCK_CLOSE_WAIT, SOCK_CLOSED, SOCK_ESTABLISHED, SOCK_INIT,
    SOCK_LISTEN, SOCK_MACRAW, SOCK_UDP,
};

/// PHY operating mode (PHYCFGR.OPMDC)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PhyMode {
    /// 10BASE-T half duplex, auto-negotiation disabled
    #[default]
    HalfDuplex10 = 0,
    /// 10BASE-T full duplex, auto-negotiation disabled
    FullDuplex10 = 1,
    /// 100BASE-TX half duplex, auto-negotiation disabled
    HalfDuplex100 = 2,
    /// 100BASE-TX full duplex, auto-negotiation disabled
    FullDuplex100 = 3,
    /// 100BASE-TX half duplex, auto-negotiation enabled
    HalfDuplex100AutoNeg = 4,
    /// Power down
    PowerDown = 6,
    /// All capable, auto-negotiation enabled
    AutoNegotiate = 7,
}

impl PhyMode {
    /// Value of the OPMDC field
    pub const fn to_reg_value(self) -> u8 {
        self as u8
    }
}

/// Socket protocol mode (Sn_MR)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SocketMode {
    /// Not configured
    #[default]
    Closed,
    /// Hardware TCP
    Tcp,
    /// Hardware UDP
    Udp,
    /// Raw Ethernet frames (socket 0 only)
    MacRaw,
}

impl SocketMode {
    /// Sn_MR protocol value
    pub const fn to_reg_value(self) -> u8 {
        match self {
            SocketMode::Closed => 0,
            SocketMode::Tcp => SN_MR_TCP,
            SocketMode::Udp => SN_MR_UDP,
            SocketMode::MacRaw => SN_MR_MACRAW,
        }
    }
}

/// Socket status as reported by Sn_SR
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SocketStatus {
    /// Socket closed
    #[default]
    Closed,
    /// TCP socket opened
    Init,
    /// Waiting for a TCP peer
    Listen,
    /// TCP connection up
    Established,
    /// Peer sent FIN
    CloseWait,
    /// UDP socket open
    Udp,
    /// MACRAW socket open
    MacRaw,
    /// Transitional or undocumented status code
    Other(u8),
}

impl SocketStatus {
    /// Decode an Sn_SR value
    pub const fn from_raw(raw: u8) -> Self {
        match raw {
            SOCK_CLOSED => SocketStatus::Closed,
            SOCK_INIT => SocketStatus::Init,
            SOCK_LISTEN => SocketStatus::Listen,
            SOCK_ESTABLISHED => SocketStatus::Established,
            SOCK_CLOSE_WAIT => SocketStatus::CloseWait,
            SOCK_UDP => SocketStatus::Udp,
            SOCK_MACRAW => SocketStatus::MacRaw,
            other => SocketStatus::Other(other),
        }
    }

    /// Raw Sn_SR value
    pub const fn to_raw(self) -> u8 {
        match self {
            SocketStatus::Closed => SOCK_CLOSED,
            SocketStatus::Init => SOCK_INIT,
            SocketStatus::Listen => SOCK_LISTEN,
            SocketStatus::Established => SOCK_ESTABLISHED,
            SocketStatus::CloseWait => SOCK_CLOSE_WAIT,
            SocketStatus::Udp => SOCK_UDP,
            SocketStatus::MacRaw => SOCK_MACRAW,
            SocketStatus::Other(raw) => raw,
        }
    }
}

/// Network and timing configuration
///
/// Everything here is compile-time data; build it in a `const`:
///
/// ```ignore
/// const CONFIG: NetConfig = NetConfig::new()
///     .with_mac_address([0x02, 0x00, 0x00, 0x12, 0x34, 0x56])
///     .with_tcp_port(80);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NetConfig {
    /// Own hardware address
    pub mac_address: [u8; 6],
    /// Address used before a lease exists and requested in DHCPDISCOVER
    pub ip_address: [u8; 4],
    /// Subnet mask programmed at bring-up
    pub subnet_mask: [u8; 4],
    /// Gateway programmed at bring-up
    pub gateway: [u8; 4],
    /// PHY operating mode
    pub phy_mode: PhyMode,
    /// TCP listening port
    pub tcp_port: u16,
    /// DHCP transaction id
    pub dhcp_xid: [u8; 4],
    /// Ticks between DHCP retransmissions
    pub retransmit_ticks: u32,
    /// Main-loop ticks per second, for lease timing
    pub ticks_per_second: u32,
    /// Unanswered DHCPREQUESTs before restarting discovery
    pub request_retries: u8,
    /// Status polls before `listen` gives up
    pub listen_kill_switch: u16,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl NetConfig {
    /// Create a new configuration with defaults
    #[must_use]
    pub const fn new() -> Self {
        Self {
            mac_address: DEFAULT_MAC_ADDR,
            ip_address: DEFAULT_IP_ADDR,
            subnet_mask: DEFAULT_SUBNET_MASK,
            gateway: DEFAULT_GATEWAY,
            phy_mode: PhyMode::HalfDuplex10,
            tcp_port: DEFAULT_TCP_PORT,
            dhcp_xid: DEFAULT_DHCP_XID,
            retransmit_ticks: DEFAULT_RETRANSMIT_TICKS,
            ticks_per_second: DEFAULT_TICKS_PER_SECOND,
            request_retries: DEFAULT_REQUEST_RETRIES,
            listen_kill_switch: LISTEN_KILL_SWITCH,
        }
    }

    // =========================================================================
    // Builder Methods
    // =========================================================================

    /// Set the MAC address
    #[must_use]
    pub const fn with_mac_address(mut self, addr: [u8; 6]) -> Self {
        self.mac_address = addr;
        self
    }

    /// Set the preferred IP address
    #[must_use]
    pub const fn with_ip_address(mut self, addr: [u8; 4]) -> Self {
        self.ip_address = addr;
        self
    }

    /// Set the bring-up subnet mask
    #[must_use]
    pub const fn with_subnet_mask(mut self, mask: [u8; 4]) -> Self {
        self.subnet_mask = mask;
        self
    }

    /// Set the bring-up gateway
    #[must_use]
    pub const fn with_gateway(mut self, addr: [u8; 4]) -> Self {
        self.gateway = addr;
        self
    }

    /// Set the PHY operating mode
    #[must_use]
    pub const fn with_phy_mode(mut self, mode: PhyMode) -> Self {
        self.phy_mode = mode;
        self
    }

    /// Set the TCP listening port
    #[must_use]
    pub const fn with_tcp_port(mut self, port: u16) -> Self {
        self.tcp_port = port;
        self
    }

    /// Set the DHCP transaction id
    #[must_use]
    pub const fn with_dhcp_xid(mut self, xid: [u8; 4]) -> Self {
        self.dhcp_xid = xid;
        self
    }

    /// Set the DHCP retransmit quiet period
    #[must_use]
    pub const fn with_retransmit_ticks(mut self, ticks: u32) -> Self {
        self.retransmit_ticks = ticks;
        self
    }

    /// Set how many main-loop ticks make a second
    ///
    /// Zero is treated as one.
    #[must_use]
    pub const fn with_ticks_per_second(mut self, ticks: u32) -> Self {
        self.ticks_per_second = if ticks == 0 { 1 } else { ticks };
        self
    }

    /// Set the DHCPREQUEST retry limit
    #[must_use]
    pub const fn with_request_retries(mut self, retries: u8) -> Self {
        self.request_retries = retries;
        self
    }

    /// Set the `listen` kill switch
    #[must_use]
    pub const fn with_listen_kill_switch(mut self, polls: u16) -> Self {
        self.listen_kill_switch = polls;
        self
    }

    /// Lease duration in ticks, saturating
    pub const fn lease_ticks(&self, lease_secs: u32) -> u32 {
        lease_secs.saturating_mul(self.ticks_per_second)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
