//! Link, network and transport header layout
//!
//! Byte offsets into a raw Ethernet II frame carrying IPv4 and UDP, as built
//! by the DHCP client in MACRAW mode. Multi-byte fields are big-endian.
//!
//! ```text
//!  0            14                   34          42
//! +------------+--------------------+-----------+---------...
//! |  Ethernet  |  IPv4 (no options) |    UDP    | payload
//! +------------+--------------------+-----------+---------...
//! ```

pub mod checksum;
pub mod crc;

pub use checksum::ipv4_checksum;
pub use crc::{FCS_LEN, Fcs, fcs};

// =============================================================================
// Ethernet
// =============================================================================

/// Ethernet II header length
pub const ETH_HEADER_LEN: usize = 14;
/// Destination MAC offset
pub const ETH_DST: usize = 0;
/// Source MAC offset
pub const ETH_SRC: usize = 6;
/// EtherType offset
pub const ETH_TYPE: usize = 12;
/// EtherType for IPv4
pub const ETHERTYPE_IPV4: u16 = 0x0800;
/// Broadcast hardware address
pub const BROADCAST_MAC: [u8; 6] = [0xFF; 6];

// =============================================================================
// IPv4
// =============================================================================

/// Start of the IPv4 header
pub const IPV4_START: usize = ETH_HEADER_LEN;
/// IPv4 header length without options
pub const IPV4_HEADER_LEN: usize = 20;
/// Version 4, IHL 5
pub const IPV4_VERSION_IHL: u8 = 0x45;
/// Default time to live
pub const IPV4_TTL: u8 = 64;
/// Protocol number for UDP
pub const IPV4_PROTO_UDP: u8 = 17;

// Offsets relative to the IPv4 header start
/// Total length field
pub const IPV4_TOTAL_LEN: usize = 2;
/// Flags and fragment offset field
pub const IPV4_FLAGS: usize = 6;
/// Time to live field
pub const IPV4_TTL_FIELD: usize = 8;
/// Protocol field
pub const IPV4_PROTOCOL: usize = 9;
/// Header checksum field
pub const IPV4_CHECKSUM: usize = 10;
/// Source address field
pub const IPV4_SRC: usize = 12;
/// Destination address field
pub const IPV4_DST: usize = 16;

/// Limited broadcast address
pub const BROADCAST_IP: [u8; 4] = [0xFF; 4];

// =============================================================================
// UDP
// =============================================================================

/// Start of the UDP header
pub const UDP_START: usize = IPV4_START + IPV4_HEADER_LEN;
/// UDP header length
pub const UDP_HEADER_LEN: usize = 8;
/// Source port field, relative to the UDP header start
pub const UDP_SRC_PORT: usize = 0;
/// Destination port field, relative to the UDP header start
pub const UDP_DST_PORT: usize = 2;
/// Length field, relative to the UDP header start
pub const UDP_LEN: usize = 4;
/// Start of the UDP payload
pub const UDP_PAYLOAD: usize = UDP_START + UDP_HEADER_LEN;
