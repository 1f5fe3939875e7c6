//! Integration tests for the session lifecycle
//!
//! These tests drive a full session over the mock transport:
//! - poll/ack conversation in the polled capture modes
//! - chart stream decoding into history and window statistics
//! - reconnect scheduling after a dropped link
//! - guarded teardown

#![cfg(feature = "mock-transport")]

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use telemeter_rs::config::EngineConfig;
use telemeter_rs::display::DisplaySink;
use telemeter_rs::protocol::ScaleSelector;
use telemeter_rs::session::Session;
use telemeter_rs::stats::WindowStats;
use telemeter_rs::transport::MockTransport;
use telemeter_rs::types::{CaptureMode, ConnectionStatus, ControlEvent, Reading};

#[derive(Debug, Clone, PartialEq)]
enum DisplayCall {
    Render(Vec<Reading>),
    Stats(WindowStats),
    Meter(f64, f64),
    Control(ControlEvent),
    Connection(ConnectionStatus),
}

#[derive(Clone, Default)]
struct RecordingDisplay {
    calls: Arc<Mutex<Vec<DisplayCall>>>,
}

impl RecordingDisplay {
    fn calls(&self) -> Vec<DisplayCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl DisplaySink for RecordingDisplay {
    fn render(&mut self, series: &[Reading]) {
        self.calls
            .lock()
            .unwrap()
            .push(DisplayCall::Render(series.to_vec()));
    }

    fn render_stats(&mut self, stats: &WindowStats) {
        self.calls.lock().unwrap().push(DisplayCall::Stats(*stats));
    }

    fn render_meter(&mut self, current_ma: f64, voltage_v: f64) {
        self.calls
            .lock()
            .unwrap()
            .push(DisplayCall::Meter(current_ma, voltage_v));
    }

    fn control_event(&mut self, event: ControlEvent) {
        self.calls.lock().unwrap().push(DisplayCall::Control(event));
    }

    fn connection_changed(&mut self, status: ConnectionStatus) {
        self.calls
            .lock()
            .unwrap()
            .push(DisplayCall::Connection(status));
    }
}

/// Poll `predicate` until it holds or `timeout` elapses
fn wait_until(timeout: Duration, mut predicate: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if predicate() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    predicate()
}

fn test_config() -> EngineConfig {
    EngineConfig {
        history_capacity: 100,
        chart_period_ms: 0.5,
        poll_interval_ms: 100,
        reconnect_delay_ms: 500,
        ..EngineConfig::default()
    }
}

#[test]
fn test_meter_poll_and_ack_cycle() {
    let transport = MockTransport::new();
    let mock = transport.handle();
    let display = RecordingDisplay::default();
    let (session, handle) = Session::new(
        test_config(),
        CaptureMode::Meter,
        Box::new(transport),
        Box::new(display.clone()),
    );
    let worker = session.spawn().unwrap();

    // The session connects on start and issues an initial sample request.
    assert!(wait_until(Duration::from_secs(2), || {
        mock.sent().contains(&"m0".to_string())
    }));

    // One meter frame: 2000 raw units on the high range, 1200 raw voltage.
    mock.inject_words(&[4444, 0, 2000, 1200, 0]);

    assert!(wait_until(Duration::from_secs(2), || {
        display.calls().contains(&DisplayCall::Meter(100.0, 1.5))
    }));
    // Every processed frame is acknowledged.
    assert!(wait_until(Duration::from_secs(2), || {
        mock.sent().contains(&"x".to_string())
    }));

    // The poll timer keeps requesting samples.
    assert!(wait_until(Duration::from_secs(2), || {
        mock.sent().iter().filter(|m| *m == "m0").count() >= 2
    }));

    handle.stop();
    worker.join().unwrap();
    assert!(!mock.is_open());
}

#[test]
fn test_meter_scale_change_applies_to_polls() {
    let transport = MockTransport::new();
    let mock = transport.handle();
    let (session, handle) = Session::new(
        test_config(),
        CaptureMode::Meter,
        Box::new(transport),
        Box::new(RecordingDisplay::default()),
    );
    let worker = session.spawn().unwrap();

    assert!(wait_until(Duration::from_secs(2), || {
        !mock.sent().is_empty()
    }));
    handle.set_meter_scale(ScaleSelector::LowRange);

    assert!(wait_until(Duration::from_secs(2), || {
        mock.sent().contains(&"m1".to_string())
    }));

    handle.stop();
    worker.join().unwrap();
}

#[test]
fn test_frequency_flow() {
    let transport = MockTransport::new();
    let mock = transport.handle();
    let display = RecordingDisplay::default();
    let (session, handle) = Session::new(
        test_config(),
        CaptureMode::Frequency,
        Box::new(transport),
        Box::new(display.clone()),
    );
    let worker = session.spawn().unwrap();

    assert!(wait_until(Duration::from_secs(2), || {
        mock.sent().contains(&"f".to_string())
    }));

    mock.inject_dwords(&[5555, 440]);
    assert!(wait_until(Duration::from_secs(2), || {
        display
            .calls()
            .contains(&DisplayCall::Control(ControlEvent::Frequency(440)))
    }));

    // A parameter change goes out as the oscfreq JSON command.
    handle.set_osc_frequency(880);
    assert!(wait_until(Duration::from_secs(2), || {
        mock.sent().iter().any(|m| m.contains("oscfreq"))
    }));

    handle.stop();
    worker.join().unwrap();
}

#[test]
fn test_chart_stream_updates_history_and_stats() {
    let transport = MockTransport::new();
    let mock = transport.handle();
    let display = RecordingDisplay::default();
    let (session, handle) = Session::new(
        test_config(),
        CaptureMode::Chart,
        Box::new(transport),
        Box::new(display.clone()),
    );
    let worker = session.spawn().unwrap();

    assert!(wait_until(Duration::from_secs(2), || {
        display
            .calls()
            .contains(&DisplayCall::Connection(ConnectionStatus::Connected))
    }));

    mock.inject_words(&[1111, 500, 0, 150, 240, 148, 239, 147, 238]);
    mock.inject_words(&[2222, 145, 237]);
    mock.inject_words(&[3333]);

    // Window the last four samples: [48000, 50000) ms on the new 500 ms axis
    // of a 100-entry buffer.
    handle.select_range(48_000.0, 50_000.0);

    assert!(wait_until(Duration::from_secs(2), || {
        display.calls().iter().any(|call| match call {
            DisplayCall::Stats(stats) => {
                (stats.current_max - 7.5).abs() < 1e-9
                    && (stats.current_min - 7.25).abs() < 1e-9
                    && (stats.voltage_max - 0.3).abs() < 1e-9
            }
            _ => false,
        })
    }));

    // Chart mode never acknowledges frames.
    assert!(!mock.sent().contains(&"x".to_string()));

    handle.stop();
    worker.join().unwrap();
}

#[test]
fn test_reconnect_fires_after_delay_only() {
    let transport = MockTransport::new();
    let mock = transport.handle();
    let (session, handle) = Session::new(
        test_config(), // 500 ms reconnect delay
        CaptureMode::Meter,
        Box::new(transport),
        Box::new(RecordingDisplay::default()),
    );
    let worker = session.spawn().unwrap();

    assert!(wait_until(Duration::from_secs(2), || mock.open_count() == 1));

    let dropped_at = Instant::now();
    mock.close_link();

    // No attempt before the configured delay.
    std::thread::sleep(Duration::from_millis(250));
    assert_eq!(mock.open_count(), 1);

    // Exactly one attempt lands after it.
    assert!(wait_until(Duration::from_secs(2), || mock.open_count() == 2));
    assert!(dropped_at.elapsed() >= Duration::from_millis(500));

    std::thread::sleep(Duration::from_millis(300));
    assert_eq!(mock.open_count(), 2);

    handle.stop();
    worker.join().unwrap();
}

#[test]
fn test_teardown_cancels_pending_reconnect() {
    let transport = MockTransport::new();
    let mock = transport.handle();
    let (session, handle) = Session::new(
        test_config(),
        CaptureMode::Meter,
        Box::new(transport),
        Box::new(RecordingDisplay::default()),
    );
    let worker = session.spawn().unwrap();

    assert!(wait_until(Duration::from_secs(2), || mock.open_count() == 1));

    mock.close_link();
    handle.stop();
    worker.join().unwrap();

    // The scheduled reconnect never fires once the session is gone.
    std::thread::sleep(Duration::from_millis(800));
    assert_eq!(mock.open_count(), 1);
    assert!(!mock.is_open());
}

#[test]
fn test_stopped_session_leaves_no_stray_requests() {
    let transport = MockTransport::new();
    let mock = transport.handle();
    let (session, handle) = Session::new(
        test_config(),
        CaptureMode::Frequency,
        Box::new(transport),
        Box::new(RecordingDisplay::default()),
    );
    let worker = session.spawn().unwrap();

    assert!(wait_until(Duration::from_secs(2), || {
        !mock.sent().is_empty()
    }));

    handle.stop();
    worker.join().unwrap();

    let sent_at_stop = mock.sent().len();
    std::thread::sleep(Duration::from_millis(400));
    assert_eq!(mock.sent().len(), sent_at_stop);
}
