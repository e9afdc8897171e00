//! Twilio Media Streams adapter.
//!
//! Twilio opens a WebSocket to the bridge and streams call audio as JSON
//! envelopes: a `start` event carrying the call and stream identifiers, a
//! `media` event per ~20ms of base64 mu-law audio, and a `stop` event when
//! the call ends. Audio sent back to the caller uses the same `media`
//! envelope and must carry the stream identifier from `start`.

pub mod messages;

pub use messages::{
    MediaEvent, MediaPayload, OutboundMedia, StartMetadata, StreamStart, TwilioInbound,
    TwilioOutbound,
};
