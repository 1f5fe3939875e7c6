//! Error handling for the telemetry engine
//!
//! This module defines the crate-level error type and a Result alias.
//! Protocol-level decode failures live in [`crate::protocol::DecodeError`]
//! and are wrapped here so they can cross component boundaries with `?`.

use crate::protocol::DecodeError;
use thiserror::Error;

/// Main error type for engine operations
#[derive(Error, Debug)]
pub enum EngineError {
    /// A wire frame could not be decoded
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// The transport failed or refused an operation
    #[error("transport error: {0}")]
    Transport(String),

    /// Errors related to configuration loading/saving
    #[error("configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors related to channel communication
    #[error("channel error: {0}")]
    Channel(String),
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
