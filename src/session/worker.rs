//! Session worker: the connection state machine
//!
//! The worker runs on its own thread and owns all mutable session state. It
//! cycles `Disconnected → Connecting → Connected → Disconnected` for the
//! life of the session:
//!
//! - frames arriving while `Connected` are decoded, scaled, and dispatched
//!   to the history buffer and the display sink;
//! - a closure or transport error schedules exactly one reconnect attempt
//!   after the configured delay (no backoff — the instrument sits on a local
//!   link and is expected to come back);
//! - the polled modes (meter, frequency) request a fresh sample on a fixed
//!   interval, and acknowledge every inbound frame so the instrument keeps
//!   the next one coming;
//! - teardown cancels both timers and closes the transport behind the
//!   `stopping` guard, so the close does not itself trigger a reconnect. The
//!   history buffer is left intact and dropped with the worker.
//!
//! Each event is processed to completion before the next is considered; the
//! only suspension points are the transport event poll and the timer
//! deadlines.

use crate::config::EngineConfig;
use crate::display::DisplaySink;
use crate::history::HistoryBuffer;
use crate::protocol::{Frame, Request, ScaleSelector, ScaleTable, Scales, TextMessage};
use crate::session::SessionCommand;
use crate::stats::WindowStats;
use crate::transport::{Transport, TransportEvent};
use crate::types::{CaptureMode, ConnectionStatus, ControlEvent};
use crossbeam_channel::{Receiver, TryRecvError};
use std::time::{Duration, Instant};

/// How long one loop iteration waits for a transport event; also bounds
/// timer resolution
const EVENT_POLL_TIMEOUT: Duration = Duration::from_millis(20);

/// The worker that runs a session's event loop
pub struct SessionWorker {
    mode: CaptureMode,
    command_rx: Receiver<SessionCommand>,
    transport: Box<dyn Transport>,
    display: Box<dyn DisplaySink>,
    history: HistoryBuffer,
    scale_table: ScaleTable,
    /// Scales resolved for the current chart stream; a start-of-stream frame
    /// replaces them
    chart_scales: Scales,
    /// Range requested by meter polls
    meter_scale: ScaleSelector,
    status: ConnectionStatus,
    /// Last window selection; `None` means the full history span
    selection: Option<(f64, f64)>,
    reconnect_delay: Duration,
    poll_interval: Duration,
    reconnect_at: Option<Instant>,
    next_poll_at: Option<Instant>,
    stopping: bool,
}

impl SessionWorker {
    /// Create a worker from a session's parts
    pub fn new(
        config: &EngineConfig,
        mode: CaptureMode,
        command_rx: Receiver<SessionCommand>,
        transport: Box<dyn Transport>,
        display: Box<dyn DisplaySink>,
    ) -> Self {
        let scale_table = config.scales;
        Self {
            mode,
            command_rx,
            transport,
            display,
            history: HistoryBuffer::new(config.history_capacity, config.chart_period_ms),
            scale_table,
            chart_scales: scale_table.resolve(ScaleSelector::default()),
            meter_scale: ScaleSelector::default(),
            status: ConnectionStatus::Disconnected,
            selection: None,
            reconnect_delay: config.reconnect_delay(),
            poll_interval: config.poll_interval(),
            reconnect_at: None,
            next_poll_at: None,
            stopping: false,
        }
    }

    /// Run the event loop until the session is stopped
    pub fn run(&mut self) {
        tracing::info!("session worker started ({} mode)", self.mode);
        self.connect();

        while !self.stopping {
            self.process_commands();
            if self.stopping {
                break;
            }
            if let Some(event) = self.transport.poll_event(EVENT_POLL_TIMEOUT) {
                self.handle_transport_event(event);
            }
            self.check_timers();
        }

        tracing::info!("session worker stopped");
    }

    /// Drain pending commands from the owner
    fn process_commands(&mut self) {
        loop {
            match self.command_rx.try_recv() {
                Ok(command) => self.handle_command(command),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    // Owner dropped the handle: same as an explicit stop.
                    self.teardown();
                    break;
                }
            }
        }
    }

    fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::SelectRange { min_ms, max_ms } => {
                self.selection = Some((min_ms, max_ms));
                self.refresh_window();
            }
            SessionCommand::SetMeterScale(scale) => {
                self.meter_scale = scale;
            }
            SessionCommand::SetOscFrequency(hz) => {
                self.send_request(Request::SetOscFrequency(hz));
            }
            SessionCommand::StartCapture {
                cfg_index,
                capture_secs,
                scale,
            } => {
                self.send_request(Request::StartCapture {
                    cfg_index,
                    capture_secs,
                    scale,
                });
            }
            SessionCommand::Stop => {
                self.teardown();
            }
        }
    }

    /// Begin establishing the transport link
    fn connect(&mut self) {
        self.set_status(ConnectionStatus::Connecting);
        if let Err(e) = self.transport.open() {
            tracing::warn!("transport open failed: {}", e);
            self.set_status(ConnectionStatus::Disconnected);
            self.schedule_reconnect();
        }
    }

    fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Opened => {
                self.set_status(ConnectionStatus::Connected);
                self.reconnect_at = None;
                if self.mode.is_polled() {
                    // Bootstrap the frame/ack cycle without waiting a full
                    // poll interval.
                    self.send_poll_request();
                    self.next_poll_at = Some(Instant::now() + self.poll_interval);
                }
            }
            TransportEvent::Binary(bytes) => {
                self.handle_binary(&bytes);
                self.ack_if_polled();
            }
            TransportEvent::Text(text) => {
                self.handle_text(&text);
                self.ack_if_polled();
            }
            TransportEvent::Error(message) => {
                tracing::warn!("transport error: {}", message);
                self.handle_disconnect();
            }
            TransportEvent::Closed => {
                self.handle_disconnect();
            }
        }
    }

    fn handle_binary(&mut self, bytes: &[u8]) {
        match Frame::decode(bytes) {
            Ok(frame) => self.apply_frame(frame),
            Err(e) => tracing::debug!("dropping frame: {}", e),
        }
    }

    fn apply_frame(&mut self, frame: Frame) {
        match frame {
            Frame::Start {
                period_ms,
                scale,
                pairs,
            } => {
                if period_ms > 0 {
                    self.history.reset(f64::from(period_ms));
                } else {
                    tracing::warn!("keeping current period; stream announced {}", period_ms);
                }
                self.chart_scales = self.scale_table.resolve(scale);
                self.append_pairs(&pairs);
            }
            Frame::Continuation { pairs } => {
                self.append_pairs(&pairs);
            }
            Frame::End => {
                tracing::info!("capture stream complete");
                self.refresh_window();
            }
            Frame::Meter {
                scale,
                raw_current,
                raw_voltage,
                off_scale,
            } => {
                let scales = self.scale_table.resolve(scale);
                let (current_ma, voltage_v) = scales.apply(raw_current, raw_voltage);
                self.display.render_meter(current_ma, voltage_v);
                self.display.control_event(ControlEvent::OffScale(off_scale));
            }
            Frame::Frequency { hz } => {
                self.display.control_event(ControlEvent::Frequency(hz));
            }
        }
    }

    fn handle_text(&mut self, text: &str) {
        match TextMessage::decode(text) {
            Ok(TextMessage::Sample { current, voltage }) => {
                let current_ma = current * self.chart_scales.current;
                let voltage_v = voltage * self.chart_scales.voltage;
                self.history.append(current_ma, voltage_v);
                self.refresh_window();
            }
            Err(e) => tracing::debug!("dropping text message: {}", e),
        }
    }

    fn append_pairs(&mut self, pairs: &[(i16, i16)]) {
        for (raw_current, raw_voltage) in pairs {
            let (current_ma, voltage_v) = self.chart_scales.apply(*raw_current, *raw_voltage);
            self.history.append(current_ma, voltage_v);
        }
        self.refresh_window();
    }

    /// Re-render the selected window and its statistics
    fn refresh_window(&mut self) {
        let (min_ms, max_ms) = self.selection.unwrap_or((0.0, self.history.span_ms()));
        let window = self.history.range(min_ms, max_ms);
        let stats = WindowStats::compute(&window);
        self.display.render(&window);
        self.display.render_stats(&stats);
    }

    /// The polled modes acknowledge every inbound frame
    fn ack_if_polled(&mut self) {
        if self.mode.is_polled() && self.transport.is_open() {
            self.send_request(Request::Ack);
        }
    }

    fn send_poll_request(&mut self) {
        let request = match self.mode {
            CaptureMode::Meter => Request::MeterSample(self.meter_scale),
            CaptureMode::Frequency => Request::FrequencySample,
            CaptureMode::Chart => return,
        };
        self.send_request(request);
    }

    fn send_request(&mut self, request: Request) {
        let text = match request.encode() {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("failed to encode request: {}", e);
                return;
            }
        };
        if let Err(e) = self.transport.send_text(&text) {
            tracing::warn!("send failed: {}", e);
        }
    }

    /// React to the link dropping, whatever the cause
    fn handle_disconnect(&mut self) {
        if self.stopping {
            return;
        }
        if self.status == ConnectionStatus::Disconnected && self.reconnect_at.is_some() {
            // A transport error is followed by a close; one reconnect is
            // already scheduled for this closure.
            return;
        }
        self.set_status(ConnectionStatus::Disconnected);
        self.next_poll_at = None;
        self.schedule_reconnect();
    }

    fn schedule_reconnect(&mut self) {
        if self.reconnect_at.is_none() {
            self.reconnect_at = Some(Instant::now() + self.reconnect_delay);
            tracing::info!("reconnecting in {:?}", self.reconnect_delay);
        }
    }

    fn check_timers(&mut self) {
        let now = Instant::now();
        if let Some(at) = self.reconnect_at {
            if now >= at {
                self.reconnect_at = None;
                self.connect();
            }
        }
        if let Some(at) = self.next_poll_at {
            if now >= at {
                self.send_poll_request();
                self.next_poll_at = Some(now + self.poll_interval);
            }
        }
    }

    /// Guarded teardown: cancel timers, close the transport, and make sure
    /// the close cannot schedule a reconnect
    fn teardown(&mut self) {
        if self.stopping {
            return;
        }
        self.stopping = true;
        self.next_poll_at = None;
        self.reconnect_at = None;
        self.transport.close();
        self.set_status(ConnectionStatus::Disconnected);
    }

    fn set_status(&mut self, status: ConnectionStatus) {
        if self.status != status {
            self.status = status;
            tracing::debug!("connection: {}", status);
            self.display.connection_changed(status);
        }
    }
}
