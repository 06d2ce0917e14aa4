//! Error types for the W5500 driver
//!
//! Errors are organized by domain for better diagnostics:
//! - [`BusError`]: GPIO or SPI peripheral failures while shifting a frame
//! - [`SocketError`]: Socket and TCP command failures
//! - [`ConfigError`]: Device bring-up failures
//!
//! The unified [`Error`] enum wraps all domain errors and is returned
//! by most driver methods.
//!
//! DHCP replies that fail validation are not errors. They are reported as a
//! [`Rejection`](crate::dhcp::Rejection) and silently discarded by the client.

use super::config::SocketStatus;

// =============================================================================
// Bus Errors
// =============================================================================

/// Bus errors
///
/// These errors occur while a transaction is on the wire. The chip-select line
/// is released on a best-effort basis before the error is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// A GPIO pin refused to change state or could not be sampled
    Pin,
    /// The SPI peripheral reported a transfer failure
    Spi,
}

impl core::fmt::Display for BusError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl BusError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            BusError::Pin => "GPIO pin error",
            BusError::Spi => "SPI transfer error",
        }
    }
}

// =============================================================================
// Socket Errors
// =============================================================================

/// Socket and TCP errors
///
/// None of these leave the chip in an inconsistent state; every failure can be
/// retried on the next main-loop iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SocketError {
    /// The socket never reached the expected state within the retry bound.
    /// Carries the last status seen.
    ListenTimeout(SocketStatus),
    /// The TX buffer does not have room for the whole payload
    InsufficientSpace,
    /// Socket index outside the chip's eight slots
    InvalidSocket,
    /// Payload longer than a TX pointer can address
    PayloadTooLarge,
}

impl core::fmt::Display for SocketError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SocketError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            SocketError::ListenTimeout(_) => "socket did not reach listen state",
            SocketError::InsufficientSpace => "insufficient TX buffer space",
            SocketError::InvalidSocket => "invalid socket index",
            SocketError::PayloadTooLarge => "payload too large",
        }
    }
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Device bring-up errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// The version register did not identify a W5500
    UnknownChip,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ConfigError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ConfigError::UnknownChip => "chip version mismatch",
        }
    }
}

// =============================================================================
// Unified Error Type
// =============================================================================

/// This enum wraps all domain-specific errors for unified error handling.
///
/// Match on the inner domain error for specific handling:
/// ```ignore
/// match result {
///     Err(Error::Socket(SocketError::InsufficientSpace)) => { /* retry later */ }
///     Err(Error::Bus(BusError::Pin)) => { /* wiring problem */ }
///     _ => {}
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Bus error
    Bus(BusError),
    /// Socket error
    Socket(SocketError),
    /// Configuration error
    Config(ConfigError),
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Bus(e) => write!(f, "bus: {}", e.as_str()),
            Error::Socket(e) => write!(f, "socket: {}", e.as_str()),
            Error::Config(e) => write!(f, "config: {}", e.as_str()),
        }
    }
}

// From impls for automatic conversion
impl From<BusError> for Error {
    fn from(e: BusError) -> Self {
        Error::Bus(e)
    }
}

impl From<SocketError> for Error {
    fn from(e: SocketError) -> Self {
        Error::Socket(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

/// Result type alias for driver operations
pub type Result<T> = core::result::Result<T, Error>;

/// Result type alias for bus operations
pub type BusResult<T> = core::result::Result<T, BusError>;

/// Result type alias for socket operations
pub type SocketResult<T> = core::result::Result<T, SocketError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = core::result::Result<T, ConfigError>;

// =============================================================================
// Unit Tests
// =============================================================================
