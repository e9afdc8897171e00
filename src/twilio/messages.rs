//! Twilio Media Streams message types.
//!
//! # Message Flow
//!
//! ```text
//! Twilio → Bridge:
//!   - start (streamSid, callSid)
//!   - media (base64 mu-law payload)
//!   - stop
//!
//! Bridge → Twilio:
//!   - media (streamSid, base64 mu-law payload)
//! ```
//!
//! Events the bridge does not understand (e.g. `connected`, `mark`) are
//! deserialized as [`TwilioInbound::Unknown`] and ignored, so new provider
//! events cannot break an active call.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use serde::{Deserialize, Serialize};

// =============================================================================
// Twilio → Bridge
// =============================================================================

/// Events received on the media stream socket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum TwilioInbound {
    /// Media stream opened; carries the call and stream identifiers.
    Start(StreamStart),
    /// One chunk of caller audio.
    Media(MediaEvent),
    /// Media stream closed by the provider.
    Stop,
    /// Any event kind this bridge does not handle.
    #[serde(other)]
    Unknown,
}

/// Payload of a `start` event.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamStart {
    /// Identifier that must tag every outbound media frame for this call.
    #[serde(rename = "streamSid")]
    pub stream_sid: String,
    pub start: StartMetadata,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StartMetadata {
    #[serde(rename = "callSid")]
    pub call_sid: String,
}

/// Payload of a `media` event.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaEvent {
    pub media: MediaPayload,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaPayload {
    /// Base64-encoded mu-law audio (8 kHz, mono).
    pub payload: String,
}

impl MediaPayload {
    /// Decode the audio payload to mu-law bytes.
    pub fn decode_audio(&self) -> Result<Vec<u8>, base64::DecodeError> {
        BASE64.decode(&self.payload)
    }
}

// =============================================================================
// Bridge → Twilio
// =============================================================================

/// Frames sent back over the media stream socket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum TwilioOutbound {
    Media(OutboundMedia),
}

/// An outbound audio frame. Constructing one requires the stream identifier,
/// so an unaddressed frame cannot exist.
#[derive(Debug, Clone, Serialize)]
pub struct OutboundMedia {
    #[serde(rename = "streamSid")]
    pub stream_sid: String,
    pub media: OutboundPayload,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutboundPayload {
    pub payload: String,
}

impl OutboundMedia {
    /// Build a media frame from mu-law bytes addressed to `stream_sid`.
    pub fn new(stream_sid: impl Into<String>, mulaw: &[u8]) -> Self {
        Self {
            stream_sid: stream_sid.into(),
            media: OutboundPayload {
                payload: BASE64.encode(mulaw),
            },
        }
    }
}
