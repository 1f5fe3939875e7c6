//! Binary and JSON frame decoding
//!
//! Binary frames are arrays of little-endian signed integers whose first
//! element is a message tag selecting the layout:
//!
//! | Tag  | Width | Length          | Meaning |
//! |------|-------|-----------------|---------|
//! | 1111 | i16   | 3 + 2n          | chart start-of-stream (period, scale, sample pairs) |
//! | 2222 | i16   | 1 + 2n          | chart continuation (sample pairs) |
//! | 3333 | i16   | 1               | chart end-of-stream |
//! | 4444 | i16   | 5               | meter reading (scale, current, voltage, off-scale) |
//! | 5555 | i32   | 2               | frequency reading (Hz) |
//!
//! Sample pairs are raw `(current, voltage)` integers; physical units are
//! applied later via [`crate::protocol::ScaleTable`]. The frequency frame is
//! the only 32-bit layout; because its tag value fits in the low half-word,
//! the leading i16 of a valid frequency frame also reads 5555 and the two
//! views agree on the discriminator.

use crate::protocol::{DecodeError, ScaleSelector};
use serde::Deserialize;

/// Chart start-of-stream tag
pub const TAG_CHART_START: i16 = 1111;
/// Chart continuation tag
pub const TAG_CHART_DATA: i16 = 2222;
/// Chart end-of-stream tag
pub const TAG_CHART_END: i16 = 3333;
/// Meter reading tag
pub const TAG_METER: i16 = 4444;
/// Frequency reading tag (i32 layout)
pub const TAG_FREQUENCY: i16 = 5555;

/// One decoded binary frame
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// Start of a chart capture stream: sample period, scale selector, and
    /// the first block of raw `(current, voltage)` pairs
    Start {
        /// Sample period in milliseconds, as sent by the instrument
        period_ms: i16,
        /// Current-scale selector for the whole stream
        scale: ScaleSelector,
        /// Raw sample pairs following the header
        pairs: Vec<(i16, i16)>,
    },
    /// Continuation block of an in-progress chart stream
    Continuation {
        /// Raw sample pairs
        pairs: Vec<(i16, i16)>,
    },
    /// End-of-stream marker, no payload
    End,
    /// One polled meter reading
    Meter {
        /// Current-scale selector for this sample
        scale: ScaleSelector,
        /// Raw current value
        raw_current: i16,
        /// Raw voltage value
        raw_voltage: i16,
        /// Whether the instrument reports the value off its range
        off_scale: bool,
    },
    /// One polled frequency counter reading
    Frequency {
        /// Measured frequency in Hz
        hz: i32,
    },
}

impl Frame {
    /// Decode one binary frame
    ///
    /// Validates tag and length before interpreting any field; never mutates
    /// state. Unknown tags and layout violations are reported as
    /// [`DecodeError`] so the caller can drop the frame without side effects.
    pub fn decode(bytes: &[u8]) -> Result<Frame, DecodeError> {
        if bytes.is_empty() || bytes.len() % 2 != 0 {
            return Err(DecodeError::Truncated);
        }

        let words = read_words(bytes);
        let tag = words[0];
        match tag {
            TAG_CHART_START => {
                if words.len() < 3 || (words.len() - 3) % 2 != 0 {
                    return Err(DecodeError::LengthMismatch {
                        tag,
                        words: words.len(),
                    });
                }
                Ok(Frame::Start {
                    period_ms: words[1],
                    scale: ScaleSelector::from_wire(words[2])?,
                    pairs: read_pairs(&words[3..]),
                })
            }
            TAG_CHART_DATA => {
                if (words.len() - 1) % 2 != 0 {
                    return Err(DecodeError::LengthMismatch {
                        tag,
                        words: words.len(),
                    });
                }
                Ok(Frame::Continuation {
                    pairs: read_pairs(&words[1..]),
                })
            }
            TAG_CHART_END => {
                if words.len() != 1 {
                    return Err(DecodeError::LengthMismatch {
                        tag,
                        words: words.len(),
                    });
                }
                Ok(Frame::End)
            }
            TAG_METER => {
                if words.len() != 5 {
                    return Err(DecodeError::LengthMismatch {
                        tag,
                        words: words.len(),
                    });
                }
                Ok(Frame::Meter {
                    scale: ScaleSelector::from_wire(words[1])?,
                    raw_current: words[2],
                    raw_voltage: words[3],
                    off_scale: words[4] != 0,
                })
            }
            TAG_FREQUENCY => {
                // Int32 layout: [tag, hz]. Demand the full i32 tag so a
                // 16-bit frame that merely starts with 5555 is rejected.
                if bytes.len() != 8 || read_i32(bytes, 0) != i32::from(TAG_FREQUENCY) {
                    return Err(DecodeError::LengthMismatch {
                        tag,
                        words: words.len(),
                    });
                }
                Ok(Frame::Frequency {
                    hz: read_i32(bytes, 4),
                })
            }
            other => Err(DecodeError::UnknownTag(other)),
        }
    }
}

/// One decoded text-channel message
#[derive(Debug, Clone, PartialEq)]
pub enum TextMessage {
    /// A meter-style sample delivered over the text channel instead of
    /// binary; values are raw instrument units, scaled by the session
    Sample {
        /// Raw current value
        current: f64,
        /// Raw voltage value
        voltage: f64,
    },
}

#[derive(Debug, Deserialize)]
struct TextFrame {
    id: String,
    value: TextSample,
}

#[derive(Debug, Deserialize)]
struct TextSample {
    #[serde(rename = "mA")]
    ma: f64,
    #[serde(rename = "V")]
    v: f64,
}

impl TextMessage {
    /// Decode one text frame
    ///
    /// Recognizes `{"id":"0","value":{"mA":n,"V":n}}`; anything else that
    /// parses as JSON is [`DecodeError::UnknownText`].
    pub fn decode(text: &str) -> Result<TextMessage, DecodeError> {
        let frame: TextFrame = serde_json::from_str(text)?;
        if frame.id != "0" {
            return Err(DecodeError::UnknownText);
        }
        Ok(TextMessage::Sample {
            current: frame.value.ma,
            voltage: frame.value.v,
        })
    }
}

fn read_words(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|c| i16::from_le_bytes([c[0], c[1]]))
        .collect()
}

fn read_pairs(words: &[i16]) -> Vec<(i16, i16)> {
    words.chunks_exact(2).map(|c| (c[0], c[1])).collect()
}

fn read_i32(bytes: &[u8], offset: usize) -> i32 {
    i32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}
