//! Socket Register Block Definitions
//!
//! Offsets are relative to the socket register block; combine them with a
//! [`SocketId`](super::SocketId) through
//! [`RegisterAddress::socket`](super::RegisterAddress::socket).

// =============================================================================
// Register Offsets
// =============================================================================

/// Socket Mode Register offset
pub const SN_MR: u16 = 0x0000;
/// Socket Command Register offset
pub const SN_CR: u16 = 0x0001;
/// Socket Interrupt Register offset (write 1 to clear)
pub const SN_IR: u16 = 0x0002;
/// Socket Status Register offset
pub const SN_SR: u16 = 0x0003;
/// Socket Source Port Register offset (2 bytes)
pub const SN_PORT: u16 = 0x0004;
/// Socket Destination Hardware Address Register offset (6 bytes)
pub const SN_DHAR: u16 = 0x0006;
/// Socket Destination IP Address Register offset (4 bytes)
pub const SN_DIPR: u16 = 0x000C;
/// Socket Destination Port Register offset (2 bytes)
pub const SN_DPORT: u16 = 0x0010;
/// Socket TX Free Size Register offset (2 bytes, hardware maintained)
pub const SN_TX_FSR: u16 = 0x0020;
/// Socket TX Read Pointer Register offset (2 bytes, hardware maintained)
pub const SN_TX_RD: u16 = 0x0022;
/// Socket TX Write Pointer Register offset (2 bytes)
pub const SN_TX_WR: u16 = 0x0024;
/// Socket RX Received Size Register offset (2 bytes, hardware maintained)
pub const SN_RX_RSR: u16 = 0x0026;
/// Socket RX Read Pointer Register offset (2 bytes)
pub const SN_RX_RD: u16 = 0x0028;
/// Socket RX Write Pointer Register offset (2 bytes, hardware maintained)
pub const SN_RX_WR: u16 = 0x002A;
/// Socket Interrupt Mask Register offset
pub const SN_IMR: u16 = 0x002C;

// =============================================================================
// Socket Mode Register (Sn_MR) Values
// =============================================================================

/// Socket closed
pub const SN_MR_CLOSE: u8 = 0x00;
/// TCP mode
pub const SN_MR_TCP: u8 = 0x01;
/// UDP mode
pub const SN_MR_UDP: u8 = 0x02;
/// MACRAW mode (socket 0 only)
pub const SN_MR_MACRAW: u8 = 0x04;

// =============================================================================
// Socket Command Register (Sn_CR) Values
// =============================================================================

/// Initialize and open the socket in the mode set by Sn_MR
pub const SN_CR_OPEN: u8 = 0x01;
/// Start listening as a TCP server
pub const SN_CR_LISTEN: u8 = 0x02;
/// Connect to a TCP server
pub const SN_CR_CONNECT: u8 = 0x04;
/// Send FIN / disconnect a TCP connection
pub const SN_CR_DISCON: u8 = 0x08;
/// Close the socket
pub const SN_CR_CLOSE: u8 = 0x10;
/// Transmit everything between TX_RD and TX_WR
pub const SN_CR_SEND: u8 = 0x20;
/// Transmit without ARP, using the configured destination hardware address
pub const SN_CR_SEND_MAC: u8 = 0x21;
/// Acknowledge data consumed up to RX_RD
pub const SN_CR_RECV: u8 = 0x40;

// =============================================================================
// Socket Status Register (Sn_SR) Values
// =============================================================================

/// Socket closed
pub const SOCK_CLOSED: u8 = 0x00;
/// TCP socket opened, ready for LISTEN or CONNECT
pub const SOCK_INIT: u8 = 0x13;
/// TCP socket waiting for a peer
pub const SOCK_LISTEN: u8 = 0x14;
/// TCP connection established
pub const SOCK_ESTABLISHED: u8 = 0x17;
/// Peer requested disconnect
pub const SOCK_CLOSE_WAIT: u8 = 0x1C;
/// UDP socket open
pub const SOCK_UDP: u8 = 0x22;
/// MACRAW socket open
pub const SOCK_MACRAW: u8 = 0x42;

// =============================================================================
// Socket Interrupt Register (Sn_IR / Sn_IMR) Bits
// =============================================================================

/// Connection established
pub const SN_IR_CON: u8 = 1 << 0;
/// FIN received / disconnected
pub const SN_IR_DISCON: u8 = 1 << 1;
/// Data received
pub const SN_IR_RECV: u8 = 1 << 2;
/// ARP or TCP timeout
pub const SN_IR_TIMEOUT: u8 = 1 << 3;
/// SEND command completed
pub const SN_IR_SENDOK: u8 = 1 << 4;
/// All defined interrupt bits
pub const SN_IR_ALL: u8 = SN_IR_CON | SN_IR_DISCON | SN_IR_RECV | SN_IR_TIMEOUT | SN_IR_SENDOK;
