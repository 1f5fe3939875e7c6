//! TCP transport for the instrument link
//!
//! Connects to the instrument's stream port and runs a background reader
//! thread that turns the socket into [`TransportEvent`]s. The stream carries
//! both channels with a 3-byte adapter header per frame:
//!
//! ```text
//! [kind: u8] [len: u16 LE] [payload: len bytes]
//! ```
//!
//! where kind `0x01` is a binary frame and `0x02` a text frame. Frames with
//! an unknown kind are skipped.
//!
//! `open` never blocks: connection establishment happens on the reader
//! thread, and its outcome arrives as an `Opened` or `Error`+`Closed` event.

use crate::error::{EngineError, Result};
use crate::transport::{Transport, TransportEvent};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Adapter frame kind: binary channel
const FRAME_BINARY: u8 = 0x01;
/// Adapter frame kind: text channel
const FRAME_TEXT: u8 = 0x02;

/// TCP implementation of [`Transport`]
pub struct TcpTransport {
    addr: String,
    event_tx: Sender<TransportEvent>,
    event_rx: Receiver<TransportEvent>,
    /// Writer half of the current connection, shared with `close`
    stream: Arc<Mutex<Option<TcpStream>>>,
    /// Liveness flag for the current connection's reader thread; cleared on
    /// `close` so a deliberate shutdown does not surface as a `Closed` event
    alive: Option<Arc<AtomicBool>>,
    open: Arc<AtomicBool>,
}

impl TcpTransport {
    /// Create a transport that will connect to `addr` (host:port)
    pub fn new(addr: impl Into<String>) -> Self {
        let (event_tx, event_rx) = unbounded();
        Self {
            addr: addr.into(),
            event_tx,
            event_rx,
            stream: Arc::new(Mutex::new(None)),
            alive: None,
            open: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The address this transport connects to
    pub fn addr(&self) -> &str {
        &self.addr
    }
}

impl Transport for TcpTransport {
    fn open(&mut self) -> Result<()> {
        if self.is_open() {
            return Ok(());
        }

        let alive = Arc::new(AtomicBool::new(true));
        self.alive = Some(alive.clone());

        let addr = self.addr.clone();
        let tx = self.event_tx.clone();
        let slot = self.stream.clone();
        let open = self.open.clone();

        std::thread::Builder::new()
            .name("telemeter-transport".to_string())
            .spawn(move || match TcpStream::connect(&addr) {
                Ok(stream) => {
                    let reader = match stream.try_clone() {
                        Ok(reader) => reader,
                        Err(e) => {
                            let _ = tx.send(TransportEvent::Error(e.to_string()));
                            let _ = tx.send(TransportEvent::Closed);
                            return;
                        }
                    };
                    *lock(&slot) = Some(stream);
                    open.store(true, Ordering::SeqCst);
                    let _ = tx.send(TransportEvent::Opened);

                    read_loop(reader, &tx, &alive);

                    open.store(false, Ordering::SeqCst);
                    *lock(&slot) = None;
                    if alive.load(Ordering::SeqCst) {
                        let _ = tx.send(TransportEvent::Closed);
                    }
                }
                Err(e) => {
                    tracing::warn!("connect to {} failed: {}", addr, e);
                    if alive.load(Ordering::SeqCst) {
                        let _ = tx.send(TransportEvent::Error(e.to_string()));
                        let _ = tx.send(TransportEvent::Closed);
                    }
                }
            })?;

        Ok(())
    }

    fn close(&mut self) {
        if let Some(alive) = self.alive.take() {
            alive.store(false, Ordering::SeqCst);
        }
        if let Some(stream) = lock(&self.stream).take() {
            let _ = stream.shutdown(Shutdown::Both);
        }
        self.open.store(false, Ordering::SeqCst);
    }

    fn send_text(&mut self, message: &str) -> Result<()> {
        let mut slot = lock(&self.stream);
        let stream = slot
            .as_mut()
            .ok_or_else(|| EngineError::Transport("not connected".to_string()))?;

        let payload = message.as_bytes();
        let len = u16::try_from(payload.len())
            .map_err(|_| EngineError::Transport("message too large".to_string()))?;
        let mut frame = Vec::with_capacity(3 + payload.len());
        frame.push(FRAME_TEXT);
        frame.extend_from_slice(&len.to_le_bytes());
        frame.extend_from_slice(payload);
        stream.write_all(&frame)?;
        Ok(())
    }

    fn poll_event(&mut self, timeout: Duration) -> Option<TransportEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        self.close();
    }
}

fn lock(slot: &Mutex<Option<TcpStream>>) -> std::sync::MutexGuard<'_, Option<TcpStream>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

fn read_loop(mut stream: TcpStream, tx: &Sender<TransportEvent>, alive: &AtomicBool) {
    let mut header = [0u8; 3];
    loop {
        if !alive.load(Ordering::SeqCst) {
            return;
        }
        match stream.read_exact(&mut header) {
            Ok(()) => {
                let kind = header[0];
                let len = usize::from(u16::from_le_bytes([header[1], header[2]]));
                let mut payload = vec![0u8; len];
                if stream.read_exact(&mut payload).is_err() {
                    return;
                }
                let event = match kind {
                    FRAME_BINARY => TransportEvent::Binary(payload),
                    FRAME_TEXT => {
                        TransportEvent::Text(String::from_utf8_lossy(&payload).into_owned())
                    }
                    other => {
                        tracing::warn!("skipping frame with unknown kind {:#04x}", other);
                        continue;
                    }
                };
                if tx.send(event).is_err() {
                    return;
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return,
            Err(e) => {
                if alive.load(Ordering::SeqCst) {
                    let _ = tx.send(TransportEvent::Error(e.to_string()));
                }
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn test_send_before_open_fails() {
        let mut transport = TcpTransport::new("127.0.0.1:1");
        assert!(transport.send_text("x").is_err());
        assert!(!transport.is_open());
    }

    #[test]
    fn test_connect_failure_reports_closed() {
        // Port 1 is essentially never listening.
        let mut transport = TcpTransport::new("127.0.0.1:1");
        transport.open().unwrap();

        let mut saw_closed = false;
        for _ in 0..2 {
            match transport.poll_event(Duration::from_secs(5)) {
                Some(TransportEvent::Error(_)) => {}
                Some(TransportEvent::Closed) => {
                    saw_closed = true;
                    break;
                }
                other => panic!("unexpected event: {:?}", other),
            }
        }
        assert!(saw_closed);
    }

    #[test]
    fn test_open_receive_and_close() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server = std::thread::spawn(move || {
            let (mut socket, _) = listener.accept().unwrap();
            // One binary frame [4444] and one text frame "hi".
            let tag: i16 = 4444;
            let mut frame = vec![FRAME_BINARY, 2, 0];
            frame.extend_from_slice(&tag.to_le_bytes());
            frame.extend_from_slice(&[FRAME_TEXT, 2, 0, b'h', b'i']);
            socket.write_all(&frame).unwrap();

            // Read back what the client sends.
            let mut header = [0u8; 3];
            socket.read_exact(&mut header).unwrap();
            let mut payload = vec![0u8; usize::from(u16::from_le_bytes([header[1], header[2]]))];
            socket.read_exact(&mut payload).unwrap();
            payload
        });

        let mut transport = TcpTransport::new(addr.to_string());
        transport.open().unwrap();

        assert_eq!(
            transport.poll_event(Duration::from_secs(5)),
            Some(TransportEvent::Opened)
        );
        assert_eq!(
            transport.poll_event(Duration::from_secs(5)),
            Some(TransportEvent::Binary(4444i16.to_le_bytes().to_vec()))
        );
        assert_eq!(
            transport.poll_event(Duration::from_secs(5)),
            Some(TransportEvent::Text("hi".to_string()))
        );

        transport.send_text("x").unwrap();
        assert_eq!(server.join().unwrap(), b"x");

        transport.close();
        assert!(!transport.is_open());
    }
}
