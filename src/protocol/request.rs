//! Outbound messages to the instrument
//!
//! Everything the engine sends upstream is text: single-character request
//! tokens that drive the polled capture modes, and two JSON commands that
//! change instrument parameters. The `cv_capture` command carries its
//! numeric fields as strings; the instrument firmware parses them with
//! `strtol` and will not accept JSON numbers there.

use crate::protocol::{DecodeError, ScaleSelector};
use serde::Serialize;

/// One outbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Acknowledge the last received frame (`"x"`)
    Ack,
    /// Request one meter sample at the given range (`"m0"` / `"m1"`)
    MeterSample(ScaleSelector),
    /// Request one frequency counter sample (`"f"`)
    FrequencySample,
    /// Set the test oscillator frequency
    SetOscFrequency(u32),
    /// Begin a chart capture stream
    StartCapture {
        /// Instrument measurement-config index to capture with
        cfg_index: u8,
        /// Capture duration in seconds
        capture_secs: u32,
        /// Current range for the capture
        scale: ScaleSelector,
    },
}

#[derive(Serialize)]
struct OscFreqCmd {
    action: &'static str,
    freqhz: u32,
}

#[derive(Serialize)]
struct CvCaptureCmd {
    action: &'static str,
    #[serde(rename = "cfgIndex")]
    cfg_index: String,
    #[serde(rename = "captureSecs")]
    capture_secs: String,
    scale: String,
}

impl Request {
    /// Encode the message as the text the transport should send
    pub fn encode(&self) -> Result<String, DecodeError> {
        match self {
            Request::Ack => Ok("x".to_string()),
            Request::MeterSample(scale) => Ok(format!("m{}", scale.to_wire())),
            Request::FrequencySample => Ok("f".to_string()),
            Request::SetOscFrequency(hz) => {
                let cmd = OscFreqCmd {
                    action: "oscfreq",
                    freqhz: *hz,
                };
                Ok(serde_json::to_string(&cmd)?)
            }
            Request::StartCapture {
                cfg_index,
                capture_secs,
                scale,
            } => {
                let cmd = CvCaptureCmd {
                    action: "cv_capture",
                    cfg_index: cfg_index.to_string(),
                    capture_secs: capture_secs.to_string(),
                    scale: scale.to_wire().to_string(),
                };
                Ok(serde_json::to_string(&cmd)?)
            }
        }
    }
}
