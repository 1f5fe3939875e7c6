//! Display boundary
//!
//! Rendering is not this engine's job. A [`DisplaySink`] receives decoded
//! series, statistics, and instrument events and turns them into whatever
//! the host shows; the session never knows or cares what that is. Statistics
//! from an empty window (NaN averages) are forwarded as-is — presentation of
//! degenerate values is the sink's decision.

use crate::stats::WindowStats;
use crate::types::{ConnectionStatus, ControlEvent, Reading};

/// Receiver for everything the session decodes
///
/// Implementations must be `Send`; the session worker calls them from its
/// own thread. The mode-specific hooks default to no-ops so a chart-only
/// sink does not need to care about meter or frequency traffic.
pub trait DisplaySink: Send {
    /// Render the currently selected window of the history
    fn render(&mut self, series: &[Reading]);

    /// Render statistics computed over that window
    fn render_stats(&mut self, stats: &WindowStats);

    /// Render one polled meter sample, already in physical units
    fn render_meter(&mut self, current_ma: f64, voltage_v: f64) {
        let _ = (current_ma, voltage_v);
    }

    /// An out-of-band instrument event (frequency value, off-scale flag)
    fn control_event(&mut self, event: ControlEvent) {
        let _ = event;
    }

    /// The session's connection state changed
    fn connection_changed(&mut self, status: ConnectionStatus) {
        let _ = status;
    }
}

/// Sink that logs everything through `tracing`
///
/// Used by the bundled binary; also handy while bringing up a new
/// instrument.
#[derive(Debug, Default)]
pub struct TracingDisplay;

impl DisplaySink for TracingDisplay {
    fn render(&mut self, series: &[Reading]) {
        if let (Some(first), Some(last)) = (series.first(), series.last()) {
            tracing::info!(
                "window [{:.1}, {:.1}] ms, {} readings",
                first.timestamp_ms,
                last.timestamp_ms,
                series.len()
            );
        } else {
            tracing::info!("window empty");
        }
    }

    fn render_stats(&mut self, stats: &WindowStats) {
        tracing::info!("{}", stats);
    }

    fn render_meter(&mut self, current_ma: f64, voltage_v: f64) {
        tracing::info!("{:.3} mA  {:.3} V", current_ma, voltage_v);
    }

    fn control_event(&mut self, event: ControlEvent) {
        match event {
            ControlEvent::Frequency(hz) => tracing::info!("{} Hz", hz),
            ControlEvent::OffScale(true) => tracing::warn!("reading off scale"),
            ControlEvent::OffScale(false) => {}
        }
    }

    fn connection_changed(&mut self, status: ConnectionStatus) {
        tracing::info!("connection: {}", status);
    }
}

/// Sink that discards everything
///
/// For benchmarks and sessions that only exist to drive the instrument.
#[derive(Debug, Default)]
pub struct NullDisplay;

impl DisplaySink for NullDisplay {
    fn render(&mut self, _series: &[Reading]) {}

    fn render_stats(&mut self, _stats: &WindowStats) {}
}
