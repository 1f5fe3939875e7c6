//! Mock transport for testing without a reachable instrument
//!
//! The mock delivers whatever events a [`MockTransportHandle`] injects and
//! records everything the session sends, so tests can script an instrument
//! conversation and assert on the engine's side of it.
//!
//! # Example
//!
//! ```ignore
//! use telemeter_rs::transport::{MockTransport, Transport, TransportEvent};
//!
//! let mut transport = MockTransport::new();
//! let handle = transport.handle();
//!
//! transport.open()?;                       // queues Opened
//! handle.inject_words(&[3333]);            // one binary end-of-stream frame
//! handle.close_link();                     // simulate the instrument dropping
//!
//! assert_eq!(handle.sent(), Vec::<String>::new());
//! ```
//!
//! # Enabling
//!
//! Available with the `mock-transport` feature (on by default):
//!
//! ```bash
//! cargo test --features mock-transport
//! ```

use crate::error::{EngineError, Result};
use crate::transport::{Transport, TransportEvent};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

#[derive(Debug, Default)]
struct MockState {
    open: bool,
    sent: Vec<String>,
    open_count: u32,
}

/// Scriptable in-memory implementation of [`Transport`]
pub struct MockTransport {
    event_tx: Sender<TransportEvent>,
    event_rx: Receiver<TransportEvent>,
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// Create a new mock transport
    pub fn new() -> Self {
        let (event_tx, event_rx) = unbounded();
        Self {
            event_tx,
            event_rx,
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// A handle for injecting events and inspecting sent messages
    ///
    /// Handles stay valid after the transport is moved into a session.
    pub fn handle(&self) -> MockTransportHandle {
        MockTransportHandle {
            event_tx: self.event_tx.clone(),
            state: self.state.clone(),
        }
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for MockTransport {
    fn open(&mut self) -> Result<()> {
        let mut state = lock(&self.state);
        state.open = true;
        state.open_count += 1;
        let _ = self.event_tx.send(TransportEvent::Opened);
        Ok(())
    }

    fn close(&mut self) {
        lock(&self.state).open = false;
    }

    fn send_text(&mut self, message: &str) -> Result<()> {
        let mut state = lock(&self.state);
        if !state.open {
            return Err(EngineError::Transport("not connected".to_string()));
        }
        state.sent.push(message.to_string());
        Ok(())
    }

    fn poll_event(&mut self, timeout: Duration) -> Option<TransportEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    fn is_open(&self) -> bool {
        lock(&self.state).open
    }
}

/// Test-side handle to a [`MockTransport`]
#[derive(Clone)]
pub struct MockTransportHandle {
    event_tx: Sender<TransportEvent>,
    state: Arc<Mutex<MockState>>,
}

impl MockTransportHandle {
    /// Inject a raw transport event
    pub fn inject(&self, event: TransportEvent) {
        let _ = self.event_tx.send(event);
    }

    /// Inject a binary frame given as i16 words (little-endian encoded)
    pub fn inject_words(&self, words: &[i16]) {
        let bytes = words.iter().flat_map(|w| w.to_le_bytes()).collect();
        self.inject(TransportEvent::Binary(bytes));
    }

    /// Inject a binary frame given as i32 words (little-endian encoded)
    pub fn inject_dwords(&self, words: &[i32]) {
        let bytes = words.iter().flat_map(|w| w.to_le_bytes()).collect();
        self.inject(TransportEvent::Binary(bytes));
    }

    /// Inject a text frame
    pub fn inject_text(&self, text: impl Into<String>) {
        self.inject(TransportEvent::Text(text.into()));
    }

    /// Simulate the instrument dropping the link
    pub fn close_link(&self) {
        lock(&self.state).open = false;
        self.inject(TransportEvent::Closed);
    }

    /// Simulate a link failure
    pub fn fail_link(&self, message: impl Into<String>) {
        lock(&self.state).open = false;
        self.inject(TransportEvent::Error(message.into()));
        self.inject(TransportEvent::Closed);
    }

    /// Everything the session has sent so far
    pub fn sent(&self) -> Vec<String> {
        lock(&self.state).sent.clone()
    }

    /// Drain the record of sent messages
    pub fn take_sent(&self) -> Vec<String> {
        std::mem::take(&mut lock(&self.state).sent)
    }

    /// How many times the transport has been opened
    pub fn open_count(&self) -> u32 {
        lock(&self.state).open_count
    }

    /// Whether the link is currently open
    pub fn is_open(&self) -> bool {
        lock(&self.state).open
    }
}

fn lock(state: &Mutex<MockState>) -> std::sync::MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
