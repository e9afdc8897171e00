//! Hume EVI WebSocket message types.
//!
//! # Message Flow
//!
//! ```text
//! Bridge → EVI:
//!   - session_settings (declare the PCM format, sent once at connect)
//!   - audio_input (base64 linear16 chunks)
//!
//! EVI → Bridge:
//!   - audio_output (base64 linear16 response audio)
//!   - user_message / assistant_message (transcripts)
//!   - user_interruption
//!   - error
//! ```
//!
//! Only `audio_output` is forwarded to the telephony leg; the rest are
//! informational and terminate at the bridge.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use serde::{Deserialize, Serialize};

// =============================================================================
// Constants
// =============================================================================

/// Hume EVI WebSocket endpoint URL.
pub const EVI_WEBSOCKET_URL: &str = "wss://api.hume.ai/v0/evi/chat";

/// Sample rate the bridge negotiates for both audio directions (Hz).
pub const EVI_SAMPLE_RATE: u32 = 48_000;

/// Number of audio channels (mono).
pub const EVI_CHANNELS: u8 = 1;

/// Request header carrying the API key.
pub const EVI_API_KEY_HEADER: &str = "X-Hume-Api-Key";

// =============================================================================
// Bridge → EVI
// =============================================================================

/// Messages sent from the bridge to EVI.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EviClientMessage {
    /// Configure session audio format. Must precede any audio.
    SessionSettings(SessionSettings),
    /// One chunk of caller audio.
    AudioInput(AudioInput),
}

/// Session settings declaring the audio input format.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSettings {
    pub audio: AudioSettings,
}

impl SessionSettings {
    /// The fixed format this bridge always negotiates: linear16, 48 kHz, mono.
    pub fn linear16() -> Self {
        Self {
            audio: AudioSettings {
                encoding: AudioEncoding::Linear16,
                sample_rate: EVI_SAMPLE_RATE,
                channels: EVI_CHANNELS,
            },
        }
    }
}

/// Audio format settings.
#[derive(Debug, Clone, Serialize)]
pub struct AudioSettings {
    pub encoding: AudioEncoding,
    pub sample_rate: u32,
    pub channels: u8,
}

/// Supported audio encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioEncoding {
    /// Linear 16-bit PCM, little-endian.
    Linear16,
}

/// Audio input message containing base64-encoded PCM.
#[derive(Debug, Clone, Serialize)]
pub struct AudioInput {
    pub data: String,
}

impl AudioInput {
    /// Create an AudioInput from raw PCM bytes.
    pub fn from_pcm(pcm: &[u8]) -> Self {
        Self {
            data: BASE64.encode(pcm),
        }
    }
}

// =============================================================================
// EVI → Bridge
// =============================================================================

/// Messages received from EVI.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EviServerMessage {
    /// Response audio chunk.
    AudioOutput(AudioOutput),
    /// Caller speech transcript.
    UserMessage(TranscriptMessage),
    /// Assistant speech transcript.
    AssistantMessage(TranscriptMessage),
    /// The caller spoke over the assistant.
    UserInterruption(UserInterruption),
    /// Application-level error from the service.
    Error(EviErrorEvent),
    /// Unknown message type (forward compatibility).
    #[serde(other)]
    Unknown,
}

/// Audio output chunk.
#[derive(Debug, Clone, Deserialize)]
pub struct AudioOutput {
    #[serde(default)]
    pub id: Option<String>,
    /// Base64-encoded linear16 PCM (48 kHz, mono).
    pub data: String,
}

impl AudioOutput {
    /// Decode the audio payload to PCM bytes.
    pub fn decode_audio(&self) -> Result<Vec<u8>, base64::DecodeError> {
        BASE64.decode(&self.data)
    }
}

/// Transcript wrapper shared by user and assistant messages.
#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptMessage {
    pub message: TranscriptContent,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptContent {
    #[serde(default)]
    pub role: Option<String>,
    pub content: String,
}

/// Interruption event.
#[derive(Debug, Clone, Deserialize)]
pub struct UserInterruption {
    /// Interruption time in milliseconds.
    #[serde(default)]
    pub time: Option<u64>,
}

/// Application-level error event. Informational: the session continues
/// unless the socket itself closes.
#[derive(Debug, Clone, Deserialize)]
pub struct EviErrorEvent {
    pub message: String,
    #[serde(default)]
    pub code: Option<String>,
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Serialize a client message to JSON.
pub fn serialize_client_message(msg: &EviClientMessage) -> Result<String, serde_json::Error> {
    serde_json::to_string(msg)
}

/// Deserialize a server message from JSON.
pub fn deserialize_server_message(json: &str) -> Result<EviServerMessage, serde_json::Error> {
    serde_json::from_str(json)
}
