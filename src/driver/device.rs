//! W5500 device context
//!
//! [`W5500`] owns the transport, the eight socket records, the DHCP lease
//! state and the interrupt event queue. Operations are split across files by
//! concern:
//!
//! - this file: construction, bring-up, network identity
//! - [`socket`](super::socket): socket manager primitives
//! - [`tcp`](super::tcp): TCP server driver
//! - [`interrupt`](super::interrupt): interrupt dispatcher
//! - [`runner`](super::runner): cooperative main-loop step
//! - [`crate::dhcp`]: DHCP client

use super::config::NetConfig;
use super::error::{ConfigError, Result};
use super::socket::Socket;
use crate::dhcp::DhcpClient;
use crate::hal::ChipBus;
use crate::internal::constants::{DHCP_SOCKET, EVENT_QUEUE_CAPACITY};
use crate::register::common::{
    CHIP_VERSION, GAR, PHYCFGR, PHYCFGR_LNK, PHYCFGR_OPMD, PHYCFGR_OPMDC_SHIFT, PHYCFGR_RST, SHAR,
    SIMR, SIPR, SUBR, VERSIONR,
};
use crate::register::{RegisterAddress, SOCKET_COUNT, SocketId};
use crate::sync::EventQueue;
use crate::transport::Transport;

/// Event queue type owned by the device
pub type DeviceEventQueue = EventQueue<EVENT_QUEUE_CAPACITY>;

/// W5500 driver context
///
/// One instance per chip, alive for the life of the program. No allocation.
///
/// # Example
///
/// ```ignore
/// let bus = BitBangSpi::new(clk, mosi, miso, cs);
/// let mut w5500 = W5500::new(bus, NetConfig::new());
/// w5500.init()?;
/// w5500.dhcp_start()?;
///
/// let server = TcpServer::new(SocketId::S1, w5500.config().tcp_port);
/// loop {
///     w5500.run_once(&mut app)?;
/// }
/// ```
#[derive(Debug)]
pub struct W5500<B> {
    pub(crate) transport: Transport<B>,
    pub(crate) config: NetConfig,
    pub(crate) sockets: [Socket; SOCKET_COUNT],
    pub(crate) dhcp: DhcpClient,
    pub(crate) events: DeviceEventQueue,
}

impl<B: ChipBus> W5500<B> {
    /// Create a driver context. The chip is not touched until [`init`](Self::init).
    pub const fn new(bus: B, config: NetConfig) -> Self {
        let dhcp_socket = match SocketId::new(DHCP_SOCKET) {
            Some(id) => id,
            None => SocketId::S0,
        };
        Self {
            transport: Transport::new(bus),
            config,
            sockets: Socket::table(),
            dhcp: DhcpClient::new(dhcp_socket, config.ip_address),
            events: EventQueue::new(),
        }
    }

    /// Verify the chip and program PHY mode and network identity
    ///
    /// All socket interrupts are masked at the chip level afterwards.
    pub fn init(&mut self) -> Result<()> {
        let version = self.version()?;
        if version != CHIP_VERSION {
            #[cfg(feature = "defmt")]
            defmt::warn!("unexpected VERSIONR {:#x}", version);
            return Err(ConfigError::UnknownChip.into());
        }

        self.transport.write_u8(RegisterAddress::common(SIMR), 0)?;

        // New OPMDC only takes effect on a PHY reset pulse
        let phy = PHYCFGR_OPMD | (self.config.phy_mode.to_reg_value() << PHYCFGR_OPMDC_SHIFT);
        let phycfgr = RegisterAddress::common(PHYCFGR);
        self.transport.write_u8(phycfgr, phy)?;
        self.transport.write_u8(phycfgr, phy | PHYCFGR_RST)?;

        let config = self.config;
        self.transport
            .write(RegisterAddress::common(SHAR), &config.mac_address)?;
        self.set_network(config.ip_address, config.subnet_mask, config.gateway)?;

        #[cfg(feature = "defmt")]
        defmt::info!(
            "W5500 up: mac {=[u8]:x} ip {=[u8]}",
            config.mac_address[..],
            config.ip_address[..]
        );

        Ok(())
    }

    /// Read the chip version register
    pub fn version(&mut self) -> Result<u8> {
        Ok(self.transport.read_u8(RegisterAddress::common(VERSIONR))?)
    }

    /// True if the PHY reports link up
    pub fn link_up(&mut self) -> Result<bool> {
        let phy = self.transport.read_u8(RegisterAddress::common(PHYCFGR))?;
        Ok(phy & PHYCFGR_LNK != 0)
    }

    /// Program source IP, subnet mask and gateway
    pub fn set_network(&mut self, ip: [u8; 4], subnet: [u8; 4], gateway: [u8; 4]) -> Result<()> {
        self.transport.write(RegisterAddress::common(SIPR), &ip)?;
        self.transport.write(RegisterAddress::common(SUBR), &subnet)?;
        self.transport.write(RegisterAddress::common(GAR), &gateway)?;
        Ok(())
    }

    /// Configuration the device was built with
    pub fn config(&self) -> &NetConfig {
        &self.config
    }

    /// Local record of a socket
    pub fn socket(&self, id: SocketId) -> &Socket {
        &self.sockets[id.as_usize()]
    }

    /// Interrupt event queue
    pub fn events(&self) -> &DeviceEventQueue {
        &self.events
    }

    /// Give the bus back
    pub fn release(self) -> B {
        self.transport.release()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::driver::config::PhyMode;
    use crate::driver::error::Error;
    use crate::test_utils::MockChip;

    #[test]
    fn init_programs_identity() {
        let chip = MockChip::new();
        let mut dev = W5500::new(&chip, NetConfig::new());

        dev.init().unwrap();

        assert_eq!(chip.common_bytes(SIPR, 4), std::vec![192, 168, 0, 15]);
        assert_eq!(
            chip.common_bytes(SHAR, 6),
            std::vec![0x4A, 0x36, 0xEE, 0xE0, 0x34, 0xAB]
        );
        assert_eq!(chip.common_bytes(SUBR, 4), std::vec![255, 255, 255, 0]);
        assert_eq!(chip.common_bytes(GAR, 4), std::vec![0, 0, 0, 0]);
        assert_eq!(chip.common_reg(SIMR), 0);
    }

    #[test]
    fn init_pulses_phy_reset_with_mode() {
        let chip = MockChip::new();
        let config = NetConfig::new().with_phy_mode(PhyMode::FullDuplex100);
        let mut dev = W5500::new(&chip, config);

        dev.init().unwrap();

        let writes = chip.common_writes(PHYCFGR);
        assert_eq!(writes, std::vec![0x58, 0xD8]);
    }

    #[test]
    fn init_rejects_unknown_chip() {
        let chip = MockChip::new();
        chip.set_common_reg(VERSIONR, 0x51);
        let mut dev = W5500::new(&chip, NetConfig::new());

        assert_eq!(dev.init(), Err(Error::Config(ConfigError::UnknownChip)));
        assert!(chip.common_writes(SIPR).is_empty());
    }

    #[test]
    fn link_status_from_phycfgr() {
        let chip = MockChip::new();
        let mut dev = W5500::new(&chip, NetConfig::new());

        chip.set_common_reg(PHYCFGR, 0xB9);
        assert!(dev.link_up().unwrap());
        chip.set_common_reg(PHYCFGR, 0xB8);
        assert!(!dev.link_up().unwrap());
    }

    #[test]
    fn fresh_device_has_closed_sockets() {
        let chip = MockChip::new();
        let dev = W5500::new(&chip, NetConfig::new());

        for index in 0..SOCKET_COUNT as u8 {
            let id = SocketId::new(index).unwrap();
            assert_eq!(dev.socket(id).id(), id);
            assert_eq!(dev.socket(id).tx_pointer(), 0);
        }
        assert!(dev.events().is_empty());
        assert_eq!(chip.transactions(), 0);
    }
}
