//! HTTP and WebSocket request handlers
//!
//! This module organizes the bridge's handlers into logical groups:
//! - `api` - Health check endpoint
//! - `debug` - Voice service connectivity probe
//! - `stream` - Telephony media stream WebSocket (the bridge itself)
//! - `voice` - Call-control webhook returning TwiML

pub mod api;
pub mod debug;
pub mod stream;
pub mod voice;

// Re-export commonly used handlers for convenient access
pub use stream::stream_handler;
pub use voice::voice_incoming;
