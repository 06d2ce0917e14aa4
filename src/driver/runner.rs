//! Cooperative main-loop step
//!
//! The interrupt dispatcher only queues events. [`W5500::run_once`] is the
//! consumer side: it advances the DHCP client by one tick and then handles
//! at most one queued event, routing the DHCP socket's receive events into
//! the DHCP client and everything else into an [`EventHandler`].
//!
//! ```text
//! loop {
//!     dhcp_poll()                  one tick
//!     events.pop()  --> DHCP socket?  --> dhcp_handle_arrival()
//!                   \-> otherwise     --> handler.on_*() per bit
//! }
//! ```

use super::device::W5500;
use super::error::Result;
use super::interrupt::{Event, SocketInterrupts};
use crate::dhcp::{DhcpPhase, Lease};
use crate::hal::ChipBus;
use crate::register::SocketId;

/// Application callbacks for socket events
///
/// Every method defaults to doing nothing. An event carrying several
/// interrupt sources calls the matching methods in the order connect,
/// disconnect, receive, timeout, send-complete.
///
/// # Example
///
/// ```ignore
/// struct Http {
///     server: TcpServer,
/// }
///
/// impl<B: ChipBus> EventHandler<B> for Http {
///     fn on_receive(&mut self, dev: &mut W5500<B>, id: SocketId) -> Result<()> {
///         let mut request = [0u8; 64];
///         dev.tcp_read_received(id, &mut request)?;
///         dev.tcp_send(id, Payload::Static(PAGE), SendOptions::FLUSH)?;
///         dev.tcp_disconnect(id)
///     }
///
///     fn on_disconnect(&mut self, dev: &mut W5500<B>, _id: SocketId) -> Result<()> {
///         self.server.restart(dev).map(|_| ())
///     }
///
///     fn on_lease_acquired(&mut self, dev: &mut W5500<B>, _lease: &Lease) -> Result<()> {
///         self.server.start(dev).map(|_| ())
///     }
/// }
/// ```
pub trait EventHandler<B: ChipBus> {
    /// A peer connected
    fn on_connect(&mut self, dev: &mut W5500<B>, id: SocketId) -> Result<()> {
        let _ = (dev, id);
        Ok(())
    }

    /// The peer closed or the connection dropped
    fn on_disconnect(&mut self, dev: &mut W5500<B>, id: SocketId) -> Result<()> {
        let _ = (dev, id);
        Ok(())
    }

    /// Data is waiting in the RX ring
    fn on_receive(&mut self, dev: &mut W5500<B>, id: SocketId) -> Result<()> {
        let _ = (dev, id);
        Ok(())
    }

    /// The chip gave up on an ARP or TCP retransmission
    fn on_timeout(&mut self, dev: &mut W5500<B>, id: SocketId) -> Result<()> {
        let _ = (dev, id);
        Ok(())
    }

    /// A SEND finished
    fn on_send_complete(&mut self, dev: &mut W5500<B>, id: SocketId) -> Result<()> {
        let _ = (dev, id);
        Ok(())
    }

    /// A lease was just bound; called once, on the tick after the ACK
    fn on_lease_acquired(&mut self, dev: &mut W5500<B>, lease: &Lease) -> Result<()> {
        let _ = (dev, lease);
        Ok(())
    }
}

impl<B: ChipBus> W5500<B> {
    /// One main-loop iteration
    ///
    /// Polls the DHCP client, then pops and dispatches at most one event.
    /// Returns the event that was handled, if any.
    ///
    /// # Errors
    ///
    /// Bus errors, and whatever the handler returns.
    pub fn run_once<H: EventHandler<B>>(&mut self, handler: &mut H) -> Result<Option<Event>> {
        let fresh = self.dhcp_phase() == DhcpPhase::FreshlyAcquired;
        self.dhcp_poll()?;
        if fresh {
            let lease = *self.lease();
            handler.on_lease_acquired(self, &lease)?;
        }

        let Some(event) = self.events.pop() else {
            return Ok(None);
        };
        let id = event.socket();
        let bits = event.interrupts();

        if id == self.dhcp().socket() {
            if bits.contains(SocketInterrupts::RECV) {
                self.dhcp_handle_arrival()?;
            }
            return Ok(Some(event));
        }

        if bits.contains(SocketInterrupts::CON) {
            handler.on_connect(self, id)?;
        }
        if bits.contains(SocketInterrupts::DISCON) {
            handler.on_disconnect(self, id)?;
        }
        if bits.contains(SocketInterrupts::RECV) {
            handler.on_receive(self, id)?;
        }
        if bits.contains(SocketInterrupts::TIMEOUT) {
            handler.on_timeout(self, id)?;
        }
        if bits.contains(SocketInterrupts::SEND_OK) {
            handler.on_send_complete(self, id)?;
        }
        Ok(Some(event))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
