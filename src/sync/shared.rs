//! ISR-safe device wrapper using critical sections.
//!
//! Provides [`SharedW5500`] so a single driver context can live in a
//! `static` and be reached from both the main loop and the INTn handler.

use super::primitives::CriticalSectionCell;
use crate::driver::device::W5500;
use crate::hal::ChipBus;

/// ISR-safe W5500 wrapper using critical sections.
///
/// The slot starts empty because the bus is only available at runtime;
/// [`install`](Self::install) it once during bring-up.
///
/// # Example
///
/// ```ignore
/// static W5500: SharedW5500<Bus> = SharedW5500::new();
///
/// fn main() {
///     W5500.install(W5500::new(bus, NetConfig::new()));
///     W5500.with(|dev| dev.init()).unwrap().unwrap();
///     loop {
///         W5500.with(|dev| dev.run_once(&mut app));
///     }
/// }
///
/// #[interrupt]
/// fn GPIO_INT() {
///     W5500.try_with(|dev| dev.service_interrupt());
/// }
/// ```
pub struct SharedW5500<B> {
    inner: CriticalSectionCell<Option<W5500<B>>>,
}

impl<B: ChipBus> SharedW5500<B> {
    /// Create an empty slot (const, suitable for static initialization).
    pub const fn new() -> Self {
        Self {
            inner: CriticalSectionCell::new(None),
        }
    }

    /// Put a driver in the slot, returning whatever was there before
    pub fn install(&self, device: W5500<B>) -> Option<W5500<B>> {
        self.inner.with(|slot| slot.replace(device))
    }

    /// Remove the driver from the slot
    pub fn take(&self) -> Option<W5500<B>> {
        self.inner.with(Option::take)
    }

    /// True once a driver has been installed
    pub fn is_installed(&self) -> bool {
        self.inner.with_ref(Option::is_some)
    }

    /// Execute a closure with exclusive access to the driver.
    ///
    /// Interrupts are disabled for the duration of the closure. Returns
    /// `None` if nothing is installed.
    #[inline]
    pub fn with<R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut W5500<B>) -> R,
    {
        self.inner.with(|slot| slot.as_mut().map(f))
    }

    /// Try to execute a closure, returning `None` if already borrowed or
    /// nothing is installed.
    #[inline]
    pub fn try_with<R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut W5500<B>) -> R,
    {
        self.inner
            .try_with(|slot| slot.as_mut().map(f))
            .flatten()
    }
}

impl<B: ChipBus> Default for SharedW5500<B> {
    fn default() -> Self {
        Self::new()
    }
}
