//! Centralized Constants
//!
//! Single source for the defaults and protocol numbers shared by the driver
//! and DHCP client.
//!
//! # Organization
//!
//! - **Network identity**: Default MAC, preferred IP, subnet, gateway
//! - **Sockets**: Slot assignment and event queue capacity
//! - **Timing**: Kill switch and tick thresholds
//! - **DHCP**: Ports, transaction id
//!
//! Chip register offsets and bit definitions live in [`crate::register`].

// =============================================================================
// Network Identity Defaults
// =============================================================================

/// Default MAC address
pub const DEFAULT_MAC_ADDR: [u8; 6] = [0x4A, 0x36, 0xEE, 0xE0, 0x34, 0xAB];

/// IP address requested in DHCPDISCOVER and used before a lease exists
pub const DEFAULT_IP_ADDR: [u8; 4] = [192, 168, 0, 15];

/// Subnet mask programmed at bring-up
pub const DEFAULT_SUBNET_MASK: [u8; 4] = [255, 255, 255, 0];

/// Gateway programmed at bring-up
pub const DEFAULT_GATEWAY: [u8; 4] = [0, 0, 0, 0];

// =============================================================================
// Sockets
// =============================================================================

/// Socket slot used by the DHCP client (MACRAW is only available on socket 0)
pub const DHCP_SOCKET: u8 = 0;

/// Socket slot used by the TCP server
pub const TCP_SOCKET: u8 = 1;

/// Default TCP listening port
pub const DEFAULT_TCP_PORT: u16 = 9999;

/// Capacity of the interrupt event queue
pub const EVENT_QUEUE_CAPACITY: usize = 5;

// =============================================================================
// Timing
// =============================================================================

/// Status polls before `listen` gives up
pub const LISTEN_KILL_SWITCH: u16 = 100;

/// Number of `listen` attempts made by the TCP server helper
pub const LISTEN_ATTEMPTS: u8 = 3;

/// Main-loop iterations per second assumed when converting lease times
pub const DEFAULT_TICKS_PER_SECOND: u32 = 1_000;

/// Ticks between DHCP retransmissions
pub const DEFAULT_RETRANSMIT_TICKS: u32 = 2_000;

/// Unanswered DHCPREQUESTs before falling back to DHCPDISCOVER
pub const DEFAULT_REQUEST_RETRIES: u8 = 4;

/// Lease length assumed when an ACK carries no lease time option
pub const DEFAULT_LEASE_SECS: u32 = 3_600;

// =============================================================================
// DHCP
// =============================================================================

/// DHCP client UDP port
pub const DHCP_CLIENT_PORT: u16 = 68;

/// DHCP server UDP port
pub const DHCP_SERVER_PORT: u16 = 67;

/// Default DHCP transaction id
pub const DEFAULT_DHCP_XID: [u8; 4] = [0x23, 0x87, 0x13, 0x65];
