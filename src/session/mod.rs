//! Session ownership and control
//!
//! A [`Session`] owns everything one capture needs — transport, history
//! buffer, timers, display sink — with an explicit lifecycle: `run` starts
//! the connection cycle, [`SessionHandle::stop`] tears it down. The worker
//! runs on its own thread and is driven entirely through typed
//! [`SessionCommand`]s over a bounded channel; dropping the handle stops the
//! session.
//!
//! # Example
//!
//! ```ignore
//! use telemeter_rs::config::EngineConfig;
//! use telemeter_rs::display::TracingDisplay;
//! use telemeter_rs::session::Session;
//! use telemeter_rs::transport::TcpTransport;
//! use telemeter_rs::types::CaptureMode;
//!
//! let config = EngineConfig::default();
//! let transport = TcpTransport::new(config.device_addr.clone());
//! let (session, handle) =
//!     Session::new(config, CaptureMode::Meter, Box::new(transport), Box::new(TracingDisplay));
//!
//! let worker = session.spawn()?;
//! handle.select_range(0.0, 250.0);
//! handle.stop();
//! worker.join().ok();
//! ```

pub mod worker;

pub use worker::SessionWorker;

use crate::config::EngineConfig;
use crate::display::DisplaySink;
use crate::protocol::ScaleSelector;
use crate::transport::Transport;
use crate::types::CaptureMode;
use crossbeam_channel::{bounded, Receiver, Sender};

/// Message sent from the owner to the session worker
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    /// Select the window of the history to render statistics over
    ///
    /// Inverted bounds are accepted and swapped.
    SelectRange {
        /// Window start, milliseconds on the history axis
        min_ms: f64,
        /// Window end, milliseconds on the history axis
        max_ms: f64,
    },
    /// Change the current range requested by subsequent meter polls
    SetMeterScale(ScaleSelector),
    /// Set the instrument's test oscillator frequency
    SetOscFrequency(u32),
    /// Ask the instrument to begin a chart capture stream
    StartCapture {
        /// Instrument measurement-config index
        cfg_index: u8,
        /// Capture duration in seconds
        capture_secs: u32,
        /// Current range for the capture
        scale: ScaleSelector,
    },
    /// Tear the session down
    Stop,
}

/// One capture session, ready to run
pub struct Session {
    config: EngineConfig,
    mode: CaptureMode,
    command_rx: Receiver<SessionCommand>,
    transport: Box<dyn Transport>,
    display: Box<dyn DisplaySink>,
}

impl Session {
    /// Create a session and the handle that controls it
    pub fn new(
        config: EngineConfig,
        mode: CaptureMode,
        transport: Box<dyn Transport>,
        display: Box<dyn DisplaySink>,
    ) -> (Self, SessionHandle) {
        let (command_tx, command_rx) = bounded(256);
        let session = Self {
            config,
            mode,
            command_rx,
            transport,
            display,
        };
        (session, SessionHandle { command_tx })
    }

    /// Run the session on the calling thread until it is stopped
    pub fn run(self) {
        let mut worker = SessionWorker::new(
            &self.config,
            self.mode,
            self.command_rx,
            self.transport,
            self.display,
        );
        worker.run();
    }

    /// Run the session on a dedicated thread
    pub fn spawn(self) -> std::io::Result<std::thread::JoinHandle<()>> {
        std::thread::Builder::new()
            .name("telemeter-session".to_string())
            .spawn(move || self.run())
    }
}

/// Owner-side handle to a running session
///
/// All methods are fire-and-forget; a stopped session ignores them.
#[derive(Clone)]
pub struct SessionHandle {
    command_tx: Sender<SessionCommand>,
}

impl SessionHandle {
    /// Send a raw command
    pub fn send(&self, command: SessionCommand) -> bool {
        self.command_tx.send(command).is_ok()
    }

    /// Select the statistics window
    pub fn select_range(&self, min_ms: f64, max_ms: f64) {
        let _ = self
            .command_tx
            .send(SessionCommand::SelectRange { min_ms, max_ms });
    }

    /// Change the meter polling range
    pub fn set_meter_scale(&self, scale: ScaleSelector) {
        let _ = self.command_tx.send(SessionCommand::SetMeterScale(scale));
    }

    /// Set the test oscillator frequency
    pub fn set_osc_frequency(&self, hz: u32) {
        let _ = self.command_tx.send(SessionCommand::SetOscFrequency(hz));
    }

    /// Begin a chart capture stream
    pub fn start_capture(&self, cfg_index: u8, capture_secs: u32, scale: ScaleSelector) {
        let _ = self.command_tx.send(SessionCommand::StartCapture {
            cfg_index,
            capture_secs,
            scale,
        });
    }

    /// Tear the session down
    pub fn stop(&self) {
        let _ = self.command_tx.send(SessionCommand::Stop);
    }
}
