//! Direction-specific transcoding pipelines.
//!
//! One transcoder value exists per session and direction; each owns the
//! resampler state for its direction.

use super::AudioError;
use super::mulaw;
use super::resample::{Downsampler, Upsampler};

/// Telephony → voice service: mu-law 8 kHz bytes to linear16 LE 48 kHz bytes.
///
/// Infallible: every mu-law byte decodes to a sample.
#[derive(Debug, Default)]
pub struct UplinkTranscoder {
    upsampler: Upsampler,
}

impl UplinkTranscoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process(&mut self, mulaw_bytes: &[u8]) -> Vec<u8> {
        let narrow = mulaw::decode_buf(mulaw_bytes);
        let wide = self.upsampler.process(&narrow);

        let mut output = Vec::with_capacity(wide.len() * 2);
        for sample in wide {
            output.extend_from_slice(&sample.to_le_bytes());
        }
        output
    }
}

/// Voice service → telephony: linear16 LE 48 kHz bytes to mu-law 8 kHz bytes.
///
/// Fails fast on a buffer that is not sample aligned; the caller drops the
/// frame and the session continues.
#[derive(Debug, Default)]
pub struct DownlinkTranscoder {
    downsampler: Downsampler,
}

impl DownlinkTranscoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process(&mut self, pcm_bytes: &[u8]) -> Result<Vec<u8>, AudioError> {
        if pcm_bytes.len() % 2 != 0 {
            return Err(AudioError::TruncatedFrame(pcm_bytes.len()));
        }

        let wide: Vec<i16> = pcm_bytes
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        let narrow = self.downsampler.process(&wide);

        Ok(mulaw::encode_buf(&narrow))
    }
}
