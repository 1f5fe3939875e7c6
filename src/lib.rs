//! # telemeter-rs: instrument telemetry decode-and-window engine
//!
//! A real-time telemetry engine for a current/voltage/frequency test
//! instrument. The engine consumes wire frames from a socket transport,
//! decodes heterogeneous binary/JSON packets, applies per-range scale
//! factors, maintains a bounded rolling history, and computes windowed
//! statistics over any sub-range of that history.
//!
//! ## Architecture
//!
//! - **Protocol**: pure decoders for the tagged binary frames and JSON
//!   messages the instrument emits, plus the outbound request tokens
//! - **Session**: a worker thread owning transport, history, and timers,
//!   driven by typed commands over crossbeam channels
//! - **Transport**: trait boundary with a TCP implementation and a
//!   scriptable mock for tests
//! - **Display**: trait boundary for whatever renders the decoded data
//!
//! ## Example
//!
//! ```ignore
//! use telemeter_rs::{
//!     config::EngineConfig,
//!     display::TracingDisplay,
//!     session::Session,
//!     transport::TcpTransport,
//!     types::CaptureMode,
//! };
//!
//! let config = EngineConfig::default();
//! let transport = TcpTransport::new(config.device_addr.clone());
//! let (session, handle) = Session::new(
//!     config,
//!     CaptureMode::Chart,
//!     Box::new(transport),
//!     Box::new(TracingDisplay),
//! );
//!
//! let worker = session.spawn()?;
//! handle.select_range(0.0, 250.0);
//! // ... later
//! handle.stop();
//! worker.join().ok();
//! ```

pub mod config;
pub mod display;
pub mod error;
pub mod history;
pub mod protocol;
pub mod session;
pub mod stats;
pub mod transport;
pub mod types;

// Re-export commonly used types
pub use config::EngineConfig;
pub use display::{DisplaySink, NullDisplay, TracingDisplay};
pub use error::{EngineError, Result};
pub use history::HistoryBuffer;
pub use protocol::{DecodeError, Frame, Request, ScaleSelector, ScaleTable};
pub use session::{Session, SessionCommand, SessionHandle};
pub use stats::WindowStats;
pub use transport::{Transport, TransportEvent};
pub use types::{CaptureMode, ConnectionStatus, ControlEvent, Reading};
