//! Transport boundary for the instrument link
//!
//! The engine never talks to a socket directly. Implementations of
//! [`Transport`] deliver inbound traffic as [`TransportEvent`]s through a
//! polled queue, which the session worker consumes one at a time; there are
//! no callbacks and no shared closures, so cancellation is just "stop
//! polling and drop the transport".
//!
//! # Implementations
//!
//! - [`TcpTransport`] - real instrument link over TCP with a background
//!   reader thread
//! - [`MockTransport`] - scriptable in-memory transport for tests
//!   (feature-gated, enabled by default)

pub mod tcp;

#[cfg(feature = "mock-transport")]
pub mod mock;

pub use tcp::TcpTransport;

#[cfg(feature = "mock-transport")]
pub use mock::{MockTransport, MockTransportHandle};

use crate::error::Result;
use std::time::Duration;

/// One event delivered by a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The link is established and frames may flow
    Opened,
    /// One inbound binary frame
    Binary(Vec<u8>),
    /// One inbound text frame
    Text(String),
    /// The link closed (either side)
    Closed,
    /// The link failed; a `Closed` follows
    Error(String),
}

/// A bidirectional instrument link
///
/// Implementations must be `Send`: the session worker owns the transport on
/// its own thread. `open` must not block on connection establishment;
/// success or failure arrives later as an [`TransportEvent::Opened`] or
/// [`TransportEvent::Error`]/[`TransportEvent::Closed`] event.
pub trait Transport: Send {
    /// Begin establishing the link
    fn open(&mut self) -> Result<()>;

    /// Tear the link down without error
    ///
    /// Safe to call in any state; events already queued may still be
    /// delivered by `poll_event`.
    fn close(&mut self);

    /// Send one text frame upstream
    fn send_text(&mut self, message: &str) -> Result<()>;

    /// Wait up to `timeout` for the next inbound event
    ///
    /// Returns `None` on timeout. This is the session worker's only
    /// suspension point besides its timers.
    fn poll_event(&mut self, timeout: Duration) -> Option<TransportEvent>;

    /// Whether the link is currently established
    fn is_open(&self) -> bool;
}
