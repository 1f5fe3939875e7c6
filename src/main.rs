//! Instrument telemetry console - main entry point
//!
//! Connects to the instrument's stream port, runs one capture session, and
//! logs decoded readings through `tracing`. Session commands are read from
//! stdin, one per line:
//!
//! ```text
//! range <min_ms> <max_ms>   select the statistics window
//! scale <0|1>               set the meter range
//! freq <hz>                 set the test oscillator frequency
//! capture <cfg> <secs> <0|1>  start a chart capture stream
//! quit                      stop the session and exit
//! ```
//!
//! Usage: `telemeter-rs [chart|meter|frequency] [addr]`

use anyhow::Context;
use telemeter_rs::{
    config::EngineConfig,
    display::TracingDisplay,
    protocol::ScaleSelector,
    session::{Session, SessionHandle},
    transport::TcpTransport,
    types::CaptureMode,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,telemeter_rs=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = match EngineConfig::default_path() {
        Some(path) => EngineConfig::load_or_default(path),
        None => EngineConfig::default(),
    };

    let mut args = std::env::args().skip(1);
    let mode = match args.next().as_deref() {
        None | Some("chart") => CaptureMode::Chart,
        Some("meter") => CaptureMode::Meter,
        Some("frequency") => CaptureMode::Frequency,
        Some(other) => anyhow::bail!("unknown capture mode '{}'", other),
    };
    if let Some(addr) = args.next() {
        config.device_addr = addr;
    }

    tracing::info!("starting {} session against {}", mode, config.device_addr);

    let transport = TcpTransport::new(config.device_addr.clone());
    let (session, handle) = Session::new(config, mode, Box::new(transport), Box::new(TracingDisplay));
    let worker = session.spawn().context("failed to spawn session worker")?;

    // Drive the session from stdin until EOF or "quit".
    let stdin = std::io::stdin();
    let mut line = String::new();
    loop {
        line.clear();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        if !dispatch_line(&handle, line.trim()) {
            break;
        }
    }

    handle.stop();
    if worker.join().is_err() {
        anyhow::bail!("session worker panicked");
    }
    Ok(())
}

/// Parse one console line; returns false when the session should end
fn dispatch_line(handle: &SessionHandle, line: &str) -> bool {
    let mut parts = line.split_whitespace();
    match parts.next() {
        None => true,
        Some("quit") | Some("q") => false,
        Some("range") => {
            match (
                parts.next().and_then(|v| v.parse::<f64>().ok()),
                parts.next().and_then(|v| v.parse::<f64>().ok()),
            ) {
                (Some(min_ms), Some(max_ms)) => handle.select_range(min_ms, max_ms),
                _ => tracing::warn!("usage: range <min_ms> <max_ms>"),
            }
            true
        }
        Some("scale") => {
            match parts
                .next()
                .and_then(|v| v.parse::<i16>().ok())
                .and_then(|v| ScaleSelector::from_wire(v).ok())
            {
                Some(scale) => handle.set_meter_scale(scale),
                None => tracing::warn!("usage: scale <0|1>"),
            }
            true
        }
        Some("freq") => {
            match parts.next().and_then(|v| v.parse::<u32>().ok()) {
                Some(hz) => handle.set_osc_frequency(hz),
                None => tracing::warn!("usage: freq <hz>"),
            }
            true
        }
        Some("capture") => {
            match (
                parts.next().and_then(|v| v.parse::<u8>().ok()),
                parts.next().and_then(|v| v.parse::<u32>().ok()),
                parts
                    .next()
                    .and_then(|v| v.parse::<i16>().ok())
                    .and_then(|v| ScaleSelector::from_wire(v).ok()),
            ) {
                (Some(cfg_index), Some(capture_secs), Some(scale)) => {
                    handle.start_capture(cfg_index, capture_secs, scale);
                }
                _ => tracing::warn!("usage: capture <cfg> <secs> <0|1>"),
            }
            true
        }
        Some(other) => {
            tracing::warn!("unknown command '{}'", other);
            true
        }
    }
}
