//! Common Register Block Definitions
//!
//! Device-wide registers: network identity, interrupt routing and PHY setup.

// =============================================================================
// Register Offsets
// =============================================================================

/// Mode Register offset
pub const MR: u16 = 0x0000;
/// Gateway IP Address Register offset (4 bytes)
pub const GAR: u16 = 0x0001;
/// Subnet Mask Register offset (4 bytes)
pub const SUBR: u16 = 0x0005;
/// Source Hardware Address Register offset (6 bytes)
pub const SHAR: u16 = 0x0009;
/// Source IP Address Register offset (4 bytes)
pub const SIPR: u16 = 0x000F;
/// Interrupt Register offset
pub const IR: u16 = 0x0015;
/// Interrupt Mask Register offset
pub const IMR: u16 = 0x0016;
/// Socket Interrupt Register offset (one bit per socket)
pub const SIR: u16 = 0x0017;
/// Socket Interrupt Mask Register offset (one bit per socket)
pub const SIMR: u16 = 0x0018;
/// PHY Configuration Register offset
pub const PHYCFGR: u16 = 0x002E;
/// Chip Version Register offset (read-only)
pub const VERSIONR: u16 = 0x0039;

/// Value of VERSIONR on a W5500
pub const CHIP_VERSION: u8 = 0x04;

// =============================================================================
// Mode Register (MR) Bits
// =============================================================================

/// Software reset, self-clearing
pub const MR_RST: u8 = 1 << 7;

// =============================================================================
// PHY Configuration Register (PHYCFGR) Bits
// =============================================================================

/// PHY reset (active low: write 0 then 1 to apply a new configuration)
pub const PHYCFGR_RST: u8 = 1 << 7;
/// Configure PHY operation mode from OPMDC rather than hardware pins
pub const PHYCFGR_OPMD: u8 = 1 << 6;
/// Operation mode field shift (bits 5:3)
pub const PHYCFGR_OPMDC_SHIFT: u8 = 3;
/// Operation mode field mask
pub const PHYCFGR_OPMDC_MASK: u8 = 0b111 << 3;
/// Link status bit (read-only)
pub const PHYCFGR_LNK: u8 = 1 << 0;
