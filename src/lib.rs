//! W5500 Ethernet Driver
//!
//! A `no_std`, `no_alloc` Rust driver for the WIZnet W5500 hardwired TCP/IP
//! controller, with a DHCP client that runs before the chip has an address.
//!
//! The W5500 carries its own TCP/IP engine and eight socket slots behind an
//! SPI register interface. This crate drives that interface, serves one TCP
//! listener and acquires and renews a lease by speaking DHCP in raw Ethernet
//! frames on socket 0.
//!
//! # Architecture
//!
//! Commands flow down, events flow up:
//!
//! ```text
//!   application  ──>  TCP / DHCP  ──>  socket manager  ──>  transport  ──>  chip
//!        ^                                                                    │
//!        └──  run_once  <──  event queue  <──  service_interrupt  <──  INTn  ──┘
//! ```
//!
//! 1. **Bus Layer** ([`hal`]): [`ChipBus`] over bit-banged GPIO or hardware SPI
//! 2. **Transport** ([`transport`]): Framed, interrupt-masked transactions
//! 3. **Driver** ([`driver`]): Device context, sockets, TCP, interrupt dispatch
//! 4. **DHCP** ([`dhcp`]): Lease state machine over hand-built frames ([`wire`])
//!
//! # Features
//!
//! - `defmt`: Enable defmt formatting and driver trace output
//!
//! # Example
//!
//! ```ignore
//! use ph_w5500::{BitBangSpi, NetConfig, TcpServer, W5500};
//!
//! let bus = BitBangSpi::new(clk, mosi, miso, cs);
//! let mut w5500 = W5500::new(bus, NetConfig::new());
//! w5500.init()?;
//! w5500.dhcp_start()?;
//!
//! let mut app = App::new(TcpServer::new(SocketId::S1, w5500.config().tcp_port));
//! loop {
//!     w5500.run_once(&mut app)?;
//! }
//! ```
//!
//! The interrupt handler for the INTn line calls
//! [`W5500::service_interrupt`], usually through a [`SharedW5500`] static.

#![no_std]
#![deny(missing_docs)]
#![forbid(unsafe_code)]
// Clippy lint levels live here; the per-lint table is in Cargo.toml.
#![deny(clippy::correctness)]
#![warn(
    clippy::suspicious,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::cloned_instead_of_copied,
    clippy::explicit_iter_loop,
    clippy::implicit_clone,
    clippy::inconsistent_struct_constructor,
    clippy::manual_assert,
    clippy::manual_let_else,
    clippy::match_same_arms,
    clippy::needless_pass_by_value,
    clippy::semicolon_if_nothing_returned,
    clippy::uninlined_format_args,
    clippy::unnested_or_patterns,
    clippy::std_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::alloc_instead_of_core
)]
#![allow(
    clippy::mod_module_files,
    clippy::self_named_module_files,
    clippy::similar_names,
    clippy::too_many_arguments,
    clippy::struct_excessive_bools,
    clippy::fn_params_excessive_bools,
    clippy::type_complexity,
    clippy::must_use_candidate,
    clippy::assertions_on_constants,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_lossless,
    clippy::panic_in_result_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::module_name_repetitions,
    clippy::wildcard_imports,
    clippy::items_after_statements
)]

// =============================================================================
// Modules
// =============================================================================

pub mod dhcp;
pub mod driver;
pub mod hal;
pub mod register;
pub mod sync;
pub mod transport;
pub mod wire;

// Internal implementation details (pub(crate) only)
mod internal;

// Test utilities (only available during testing)
#[cfg(test)]
pub(crate) mod test_utils;

// =============================================================================
// Re-exports
// =============================================================================

pub use dhcp::{DhcpClient, DhcpPhase, Lease};
pub use driver::config::{NetConfig, PhyMode, SocketMode, SocketStatus};
pub use driver::device::W5500;
pub use driver::error::{
    BusError, BusResult, ConfigError, ConfigResult, Error, Result, SocketError, SocketResult,
};
pub use driver::interrupt::{Event, SocketInterrupts};
pub use driver::runner::EventHandler;
pub use driver::tcp::{Payload, Peer, SendOptions, TcpServer};
pub use hal::{BitBangSpi, ChipBus, SpiBusAdapter};
pub use register::{RegisterAddress, SocketId};
pub use sync::{EventQueue, SharedW5500};

/// Shared driver constants.
///
/// These are grouped into a dedicated module to keep the top-level facade
/// focused on driver types.
pub mod constants {
    pub use crate::internal::constants::{
        // DHCP
        DEFAULT_DHCP_XID,
        // Network identity
        DEFAULT_GATEWAY,
        DEFAULT_IP_ADDR,
        DEFAULT_LEASE_SECS,
        DEFAULT_MAC_ADDR,
        DEFAULT_REQUEST_RETRIES,
        DEFAULT_RETRANSMIT_TICKS,
        DEFAULT_SUBNET_MASK,
        DEFAULT_TCP_PORT,
        DEFAULT_TICKS_PER_SECOND,
        DHCP_CLIENT_PORT,
        DHCP_SERVER_PORT,
        // Sockets
        DHCP_SOCKET,
        EVENT_QUEUE_CAPACITY,
        // Timing
        LISTEN_ATTEMPTS,
        LISTEN_KILL_SWITCH,
        TCP_SOCKET,
    };
}
