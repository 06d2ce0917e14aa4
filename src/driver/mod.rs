//! Core driver components for the W5500.
//!
//! This module contains the device context and everything layered directly
//! on its sockets:
//!
//! - [`config`] - Network configuration and socket enums
//! - [`error`] - Error types and result aliases
//! - [`device`] - The [`W5500`] context, bring-up and network identity
//! - [`socket`] - Socket manager primitives
//! - [`tcp`] - TCP listen/send/receive and the [`TcpServer`] helper
//! - [`interrupt`] - Interrupt dispatcher and event records
//! - [`runner`] - Main-loop step and the [`EventHandler`] trait
//!
//! # Example
//!
//! ```ignore
//! use ph_w5500::driver::{NetConfig, W5500};
//!
//! let config = NetConfig::new()
//!     .with_mac_address([0x02, 0x00, 0x00, 0x00, 0x00, 0x01])
//!     .with_tcp_port(80);
//! let mut w5500 = W5500::new(bus, config);
//! ```

// Submodules
pub mod config;
pub mod device;
pub mod error;
pub mod interrupt;
pub mod runner;
pub mod socket;
pub mod tcp;

// Re-exports for convenience
pub use config::{NetConfig, PhyMode, SocketMode, SocketStatus};
pub use device::{DeviceEventQueue, W5500};
pub use error::{
    BusError, BusResult, ConfigError, ConfigResult, Error, Result, SocketError, SocketResult,
};
pub use interrupt::{Event, SocketInterrupts};
pub use runner::EventHandler;
pub use socket::Socket;
pub use tcp::{Payload, Peer, SendOptions, TcpServer};
