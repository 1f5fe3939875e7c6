//! Wire protocol for the instrument link
//!
//! The instrument speaks two channels over the same socket:
//!
//! - **Binary frames**: fixed- or variable-width arrays of little-endian
//!   signed integers, discriminated by a leading numeric tag
//!   ([`Frame::decode`]).
//! - **Text frames**: small JSON messages for data delivered over the text
//!   channel and for outbound parameter changes ([`TextMessage::decode`],
//!   [`Request::encode`]).
//!
//! Decoding is a pure parse step: tag and length are validated before any
//! field is interpreted, and no shared state is touched. Malformed frames
//! surface as [`DecodeError`] and are dropped by the session without any
//! state change.

pub mod frame;
pub mod request;
pub mod scale;

pub use frame::{Frame, TextMessage};
pub use request::Request;
pub use scale::{ScaleSelector, ScaleTable, Scales};

use thiserror::Error;

/// Failure modes of the wire parsers
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The leading tag is not one the protocol defines
    #[error("unknown frame tag {0}")]
    UnknownTag(i16),

    /// A known tag arrived with a word count its layout does not allow
    #[error("frame tag {tag} with invalid length of {words} words")]
    LengthMismatch { tag: i16, words: usize },

    /// The buffer is empty or not a whole number of 16-bit words
    #[error("frame is empty or truncated mid-word")]
    Truncated,

    /// A scale selector outside the supported range arrived on the wire
    #[error("scale selector {0} outside the supported range")]
    InvalidScaleSelector(i16),

    /// A JSON message parsed but does not match any recognized shape
    #[error("unrecognized text message")]
    UnknownText,

    /// A text frame is not valid JSON, or an outbound command failed to
    /// serialize
    #[error("malformed JSON message: {0}")]
    Json(#[from] serde_json::Error),
}
