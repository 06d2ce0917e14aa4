//! Outgoing DHCP frame composition
//!
//! Frames are assembled in place in the DHCP socket's TX ring:
//!
//! 1. Ethernet, IPv4, UDP and the fixed DHCP header, with zero length and
//!    checksum fields
//! 2. 202 zero bytes (rest of chaddr, sname, file), magic cookie, options
//! 3. length pass: UDP and IPv4 lengths patched from the final size, then the
//!    IPv4 header read back and its checksum written
//! 4. FCS pass: the whole frame read back bit-reversed and run through the
//!    serial CRC, trailer appended
//!
//! The frame is then published with SEND_MAC.

use super::{
    BOOTREQUEST, DHCP_CHADDR, DHCP_CIADDR, DHCP_COOKIE, DHCP_FLAGS, DHCP_HEADER_LEN,
    DHCP_OPTIONS, DHCP_XID, DHCP_ZERO_FILL, DHCPDISCOVER, DHCPREQUEST, DhcpPhase, FLAG_BROADCAST,
    HLEN_ETHERNET, HTYPE_ETHERNET, MAGIC_COOKIE, OPT_END, OPT_LEASE_TIME, OPT_MESSAGE_TYPE,
    OPT_PARAMETER_LIST, OPT_REQUESTED_IP, OPT_ROUTER, OPT_SERVER_ID, OPT_SUBNET_MASK,
};
use crate::driver::device::W5500;
use crate::driver::error::{Result, SocketError};
use crate::hal::ChipBus;
use crate::internal::constants::{DHCP_CLIENT_PORT, DHCP_SERVER_PORT};
use crate::register::socket::SN_TX_FSR;
use crate::register::RegisterAddress;
use crate::wire::{
    self, BROADCAST_IP, BROADCAST_MAC, ETH_DST, ETH_SRC, ETH_TYPE, ETHERTYPE_IPV4, FCS_LEN, Fcs,
    IPV4_CHECKSUM, IPV4_DST, IPV4_FLAGS, IPV4_HEADER_LEN, IPV4_PROTO_UDP, IPV4_PROTOCOL,
    IPV4_SRC, IPV4_START, IPV4_TOTAL_LEN, IPV4_TTL, IPV4_TTL_FIELD, IPV4_VERSION_IHL, UDP_DST_PORT,
    UDP_LEN, UDP_PAYLOAD, UDP_SRC_PORT, UDP_START,
};

/// Headers written from host memory in one transaction
const HEAD_LEN: usize = UDP_PAYLOAD + DHCP_HEADER_LEN;

/// Room for the largest options block the client sends
const OPTIONS_CAPACITY: usize = 24;

/// Bytes read back per transaction during the FCS pass
const FCS_CHUNK: usize = 64;

/// Parameters asked for in every message
const PARAMETER_LIST: [u8; 3] = [OPT_SUBNET_MASK, OPT_ROUTER, OPT_LEASE_TIME];

/// Where a message goes and what it says about us
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Addressing {
    dst_mac: [u8; 6],
    src_ip: [u8; 4],
    dst_ip: [u8; 4],
    ciaddr: [u8; 4],
}

/// Fixed-size options block
struct OptionBlock {
    buf: [u8; OPTIONS_CAPACITY],
    len: usize,
}

impl OptionBlock {
    const fn new() -> Self {
        Self {
            buf: [0; OPTIONS_CAPACITY],
            len: 0,
        }
    }

    fn put(&mut self, tag: u8, value: &[u8]) {
        self.buf[self.len] = tag;
        self.buf[self.len + 1] = value.len() as u8;
        self.buf[self.len + 2..self.len + 2 + value.len()].copy_from_slice(value);
        self.len += 2 + value.len();
    }

    fn end(&mut self) {
        self.buf[self.len] = OPT_END;
        self.len += 1;
    }

    fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

/// Ethernet, IPv4, UDP and fixed DHCP headers with lengths and checksum zero
fn head(mac: [u8; 6], xid: [u8; 4], to: &Addressing) -> [u8; HEAD_LEN] {
    let mut h = [0u8; HEAD_LEN];
    h[ETH_DST..ETH_DST + 6].copy_from_slice(&to.dst_mac);
    h[ETH_SRC..ETH_SRC + 6].copy_from_slice(&mac);
    h[ETH_TYPE..ETH_TYPE + 2].copy_from_slice(&ETHERTYPE_IPV4.to_be_bytes());

    let ip = IPV4_START;
    h[ip] = IPV4_VERSION_IHL;
    h[ip + IPV4_FLAGS] = 0x40; // don't fragment
    h[ip + IPV4_TTL_FIELD] = IPV4_TTL;
    h[ip + IPV4_PROTOCOL] = IPV4_PROTO_UDP;
    h[ip + IPV4_SRC..ip + IPV4_SRC + 4].copy_from_slice(&to.src_ip);
    h[ip + IPV4_DST..ip + IPV4_DST + 4].copy_from_slice(&to.dst_ip);

    let src_port = UDP_START + UDP_SRC_PORT;
    let dst_port = UDP_START + UDP_DST_PORT;
    h[src_port..src_port + 2].copy_from_slice(&DHCP_CLIENT_PORT.to_be_bytes());
    h[dst_port..dst_port + 2].copy_from_slice(&DHCP_SERVER_PORT.to_be_bytes());

    let d = UDP_PAYLOAD;
    h[d] = BOOTREQUEST;
    h[d + 1] = HTYPE_ETHERNET;
    h[d + 2] = HLEN_ETHERNET;
    h[d + DHCP_XID..d + DHCP_XID + 4].copy_from_slice(&xid);
    h[d + DHCP_FLAGS] = FLAG_BROADCAST;
    h[d + DHCP_CIADDR..d + DHCP_CIADDR + 4].copy_from_slice(&to.ciaddr);
    h[d + DHCP_CHADDR..d + DHCP_HEADER_LEN].copy_from_slice(&mac);
    h
}

impl<B: ChipBus> W5500<B> {
    /// Compose and transmit the message for the current phase
    ///
    /// Discover sends DHCPDISCOVER with the preferred address; Request sends
    /// DHCPREQUEST naming the offered address and server; Renewing sends a
    /// unicast DHCPREQUEST with ciaddr set.
    ///
    /// # Errors
    ///
    /// [`SocketError::InsufficientSpace`] if the TX ring cannot hold the
    /// frame; nothing is written.
    pub(crate) fn dhcp_send(&mut self) -> Result<()> {
        let id = self.dhcp.socket;
        let phase = self.dhcp.phase;
        let lease = self.dhcp.lease;
        let mac = self.config.mac_address;

        let mut options = OptionBlock::new();
        let to = match phase {
            DhcpPhase::Renewing => {
                options.put(OPT_MESSAGE_TYPE, &[DHCPREQUEST]);
                Addressing {
                    dst_mac: lease.server_mac,
                    src_ip: lease.ip,
                    dst_ip: lease.server_ip,
                    ciaddr: lease.ip,
                }
            }
            DhcpPhase::Request => {
                options.put(OPT_MESSAGE_TYPE, &[DHCPREQUEST]);
                options.put(OPT_REQUESTED_IP, &lease.ip);
                options.put(OPT_SERVER_ID, &lease.server_ip);
                broadcast()
            }
            _ => {
                options.put(OPT_MESSAGE_TYPE, &[DHCPDISCOVER]);
                options.put(OPT_REQUESTED_IP, &self.dhcp.preferred_ip);
                broadcast()
            }
        };
        options.put(OPT_PARAMETER_LIST, &PARAMETER_LIST);
        options.end();

        let frame_len = (UDP_PAYLOAD + DHCP_OPTIONS + options.len) as u16;
        let free = self
            .transport
            .read_stable_u16(RegisterAddress::socket(id, SN_TX_FSR))?;
        if frame_len + FCS_LEN as u16 > free {
            return Err(SocketError::InsufficientSpace.into());
        }

        let start = RegisterAddress::tx_buffer(id, self.sockets[id.as_usize()].tx_pointer());
        let t = &mut self.transport;
        t.write(start, &head(mac, self.config.dhcp_xid, &to))?;
        t.write_repeat(start.add(HEAD_LEN as u16), 0, DHCP_ZERO_FILL)?;
        t.write_static(start.add((UDP_PAYLOAD + DHCP_COOKIE) as u16), &MAGIC_COOKIE)?;
        t.write(start.add((UDP_PAYLOAD + DHCP_OPTIONS) as u16), options.as_bytes())?;

        // length pass
        t.write_u16(
            start.add((UDP_START + UDP_LEN) as u16),
            frame_len - UDP_START as u16,
        )?;
        let ip_start = start.add(IPV4_START as u16);
        t.write_u16(ip_start.add(IPV4_TOTAL_LEN as u16), frame_len - IPV4_START as u16)?;
        let mut header = [0u8; IPV4_HEADER_LEN];
        t.read(ip_start, &mut header, IPV4_HEADER_LEN)?;
        t.write_u16(
            ip_start.add(IPV4_CHECKSUM as u16),
            wire::ipv4_checksum(&header),
        )?;

        // FCS pass
        let mut fcs = Fcs::new();
        let mut chunk = [0u8; FCS_CHUNK];
        let mut offset = 0u16;
        while offset < frame_len {
            let want = (frame_len - offset) as usize;
            let got = t.read_reversed(start.add(offset), &mut chunk, want)?;
            fcs.update_wire_order(&chunk[..got]);
            offset += got as u16;
        }
        t.write(start.add(frame_len), &fcs.finish())?;

        self.sockets[id.as_usize()].advance_tx_pointer(frame_len + FCS_LEN as u16);
        self.commit_send(id)?;

        self.dhcp.last_tx = self.dhcp.ticks;
        if matches!(phase, DhcpPhase::Request | DhcpPhase::Renewing) {
            self.dhcp.request_attempts = self.dhcp.request_attempts.saturating_add(1);
        }

        #[cfg(feature = "defmt")]
        defmt::debug!("DHCP: sent {} bytes in {}", frame_len, phase);

        Ok(())
    }
}

const fn broadcast() -> Addressing {
    Addressing {
        dst_mac: BROADCAST_MAC,
        src_ip: [0; 4],
        dst_ip: BROADCAST_IP,
        ciaddr: [0; 4],
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
