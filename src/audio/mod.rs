//! Audio transcoding between the two legs of a bridged call.
//!
//! The telephony leg carries G.711 mu-law at 8 kHz mono; the voice service
//! leg carries linear16 PCM (little-endian) at 48 kHz mono. Every media
//! frame crosses this module exactly once, in one direction:
//!
//! ```text
//! telephony → [mulaw decode] → [6x upsample] → voice service   (uplink)
//! voice service → [6:1 downsample] → [mulaw encode] → telephony (downlink)
//! ```
//!
//! The codec itself is stateless; the resamplers carry a small amount of
//! explicit cross-chunk state so interpolation stays continuous across frame
//! boundaries. That state lives inside the per-session transcoder values,
//! never in a global.

pub mod mulaw;
mod resample;
mod transcode;

pub use resample::{Downsampler, RATE_RATIO, Upsampler};
pub use transcode::{DownlinkTranscoder, UplinkTranscoder};

use thiserror::Error;

/// Sample rate of the telephony leg (Hz).
pub const TELEPHONY_SAMPLE_RATE: u32 = 8_000;

/// Errors produced while transcoding a media frame.
///
/// A transcoding error is always local to the offending frame: the caller
/// logs it and drops the frame, the session continues.
#[derive(Debug, Error)]
pub enum AudioError {
    /// The PCM byte buffer does not contain a whole number of 16-bit samples.
    #[error("truncated PCM frame: {0} bytes is not a whole number of samples")]
    TruncatedFrame(usize),
}
