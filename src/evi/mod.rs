//! Hume EVI (Empathic Voice Interface) adapter.
//!
//! EVI is the AI-voice side of the bridge: a WebSocket service that consumes
//! linear16 PCM and produces both response audio and conversational events
//! (transcripts, interruptions, errors). The bridge opens one EVI connection
//! per call, negotiates the fixed audio format at connect time, and then
//! relays audio in both directions until either leg terminates.

pub mod client;
mod config;
pub mod messages;

pub use client::{EviConnection, EviSink, EviStream};
pub use config::EviConfig;
pub use messages::{
    AudioInput, AudioOutput, EVI_API_KEY_HEADER, EVI_CHANNELS, EVI_SAMPLE_RATE, EVI_WEBSOCKET_URL,
    EviClientMessage, EviServerMessage, SessionSettings,
};

use thiserror::Error;

/// Errors raised by the EVI adapter.
#[derive(Debug, Error)]
pub enum EviError {
    /// Connection to the service failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Connection attempt timed out.
    #[error("connection timed out after {0}s")]
    Timeout(u64),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// WebSocket error.
    #[error("websocket error: {0}")]
    WebSocket(String),

    /// Message serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for EVI operations.
pub type EviResult<T> = Result<T, EviError>;
