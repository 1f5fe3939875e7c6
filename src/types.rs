//! Core data types for the telemetry engine
//!
//! This module contains the fundamental data structures shared across the
//! decoder, history buffer, and session controller.
//!
//! # Main Types
//!
//! - [`Reading`] - One timestamped current/voltage sample
//! - [`ControlEvent`] - Out-of-band instrument data not tied to a sample
//! - [`ConnectionStatus`] - Transport connection state
//! - [`CaptureMode`] - Which of the instrument's capture variants a session runs

use serde::{Deserialize, Serialize};

/// Default number of readings retained in the history buffer
pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;

/// A single timestamped sample in physical units
///
/// Timestamps are assigned by the history buffer owner
/// (`last timestamp + period`), not taken from the wall clock, so a replayed
/// stream produces identical time axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// Milliseconds since the start of the capture axis
    pub timestamp_ms: f64,
    /// Current in milliamperes
    pub current_ma: f64,
    /// Voltage in volts
    pub voltage_v: f64,
}

impl Reading {
    /// Create a new reading
    pub fn new(timestamp_ms: f64, current_ma: f64, voltage_v: f64) -> Self {
        Self {
            timestamp_ms,
            current_ma,
            voltage_v,
        }
    }

    /// A zero-valued reading, used to pre-fill the history axis
    pub fn zero(timestamp_ms: f64) -> Self {
        Self::new(timestamp_ms, 0.0, 0.0)
    }
}

/// Out-of-band instrument data decoded from the wire but not part of the
/// timestamped sample stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    /// Measured oscillator frequency in Hz
    Frequency(i32),
    /// The instrument's measured value exceeded its current range
    OffScale(bool),
}

/// Connection state of the session's transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    /// Not connected to the instrument
    #[default]
    Disconnected,
    /// Attempting to connect
    Connecting,
    /// Connected and accepting frames
    Connected,
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionStatus::Disconnected => write!(f, "Disconnected"),
            ConnectionStatus::Connecting => write!(f, "Connecting..."),
            ConnectionStatus::Connected => write!(f, "Connected"),
        }
    }
}

/// Capture variant a session runs
///
/// All three variants share the same decode path; they differ in which
/// frames they expect and whether they poll the instrument on a timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CaptureMode {
    /// Streamed sample blocks appended to the rolling history
    #[default]
    Chart,
    /// Polled single current/voltage samples
    Meter,
    /// Polled frequency counter values
    Frequency,
}

impl CaptureMode {
    /// Whether this mode requests samples on a fixed interval
    pub fn is_polled(&self) -> bool {
        matches!(self, CaptureMode::Meter | CaptureMode::Frequency)
    }
}

impl std::fmt::Display for CaptureMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureMode::Chart => write!(f, "chart"),
            CaptureMode::Meter => write!(f, "meter"),
            CaptureMode::Frequency => write!(f, "frequency"),
        }
    }
}
