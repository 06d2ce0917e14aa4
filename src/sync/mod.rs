//! Synchronization and Concurrency Support
//!
//! The interrupt dispatcher and the main loop share two things: the event
//! queue and, optionally, the whole driver context. This module provides:
//!
//! - **Primitives** (`primitives`): [`CriticalSectionCell`], ISR-safe
//!   interior mutability
//! - **Queue** (`queue`): [`EventQueue`], the bounded single-producer,
//!   single-consumer event FIFO
//! - **Shared Wrapper** (`shared`): [`SharedW5500`], a `static`-friendly
//!   slot for the driver
//!
//! # Example
//!
//! ```ignore
//! use ph_w5500::sync::SharedW5500;
//!
//! static W5500: SharedW5500<Bus> = SharedW5500::new();
//!
//! #[interrupt]
//! fn GPIO_INT() {
//!     W5500.try_with(|dev| dev.service_interrupt());
//! }
//! ```

mod primitives;
mod queue;
mod shared;

pub use primitives::CriticalSectionCell;
pub use queue::EventQueue;
pub use shared::SharedW5500;
