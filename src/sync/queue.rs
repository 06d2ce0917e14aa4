//! Bounded interrupt event queue
//!
//! Single producer (the interrupt dispatcher), single consumer (the main
//! loop). Every operation runs inside a critical section, so the two sides
//! may live in different execution contexts.
//!
//! When the queue is full the incoming event is dropped and counted; the
//! events already queued are left untouched.

use heapless::Deque;

use super::primitives::CriticalSectionCell;
use crate::driver::interrupt::Event;

struct Inner<const N: usize> {
    events: Deque<Event, N>,
    dropped: u32,
}

/// Fixed-capacity FIFO of [`Event`]s
pub struct EventQueue<const N: usize> {
    inner: CriticalSectionCell<Inner<N>>,
}

impl<const N: usize> EventQueue<N> {
    /// Create an empty queue (const, suitable for static initialization).
    pub const fn new() -> Self {
        Self {
            inner: CriticalSectionCell::new(Inner {
                events: Deque::new(),
                dropped: 0,
            }),
        }
    }

    /// Append an event
    ///
    /// Returns `false` and counts a drop if the queue is full.
    pub fn push(&self, event: Event) -> bool {
        self.inner.with(|inner| {
            if inner.events.push_back(event).is_ok() {
                true
            } else {
                inner.dropped = inner.dropped.saturating_add(1);
                false
            }
        })
    }

    /// Remove the oldest event
    pub fn pop(&self) -> Option<Event> {
        self.inner.with(|inner| inner.events.pop_front())
    }

    /// Number of queued events
    pub fn len(&self) -> usize {
        self.inner.with_ref(|inner| inner.events.len())
    }

    /// True if nothing is queued
    pub fn is_empty(&self) -> bool {
        self.inner.with_ref(|inner| inner.events.is_empty())
    }

    /// True if the next push will be dropped
    pub fn is_full(&self) -> bool {
        self.inner.with_ref(|inner| inner.events.is_full())
    }

    /// Maximum number of queued events
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Events dropped on overflow since creation or the last [`clear`](Self::clear)
    pub fn dropped(&self) -> u32 {
        self.inner.with_ref(|inner| inner.dropped)
    }

    /// Discard all queued events and reset the drop counter
    pub fn clear(&self) {
        self.inner.with(|inner| {
            inner.events.clear();
            inner.dropped = 0;
        });
    }
}

impl<const N: usize> Default for EventQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> core::fmt::Debug for EventQueue<N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventQueue")
            .field("len", &self.len())
            .field("capacity", &N)
            .field("dropped", &self.dropped())
            .finish()
    }
}
