//! Fixed-ratio rate conversion between the 8 kHz and 48 kHz legs.
//!
//! The two wire rates are protocol constants, so the conversion is always a
//! clean 1:6 or 6:1. Upsampling interpolates linearly between consecutive
//! input samples; downsampling averages each block of six, which doubles as
//! a crude anti-alias filter. Both directions are delay-free: every call
//! returns exactly `len * 6` (up) or `len / 6` (down, with the sub-block
//! remainder carried into the next call) samples.
//!
//! Each direction carries its own small state across calls so chunk
//! boundaries do not introduce discontinuities. Construct one value per
//! session and direction; never share them.

/// Ratio between the voice-service rate (48 kHz) and the telephony rate (8 kHz).
pub const RATE_RATIO: usize = 6;

/// 1:6 linear-interpolation upsampler.
///
/// Remembers the previous input sample so the interpolation ramp is
/// continuous from one chunk to the next. The very first sample of a stream
/// is held flat.
#[derive(Debug, Default)]
pub struct Upsampler {
    last: Option<i16>,
}

impl Upsampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert 8 kHz samples to 48 kHz. Output length is `input.len() * 6`.
    pub fn process(&mut self, input: &[i16]) -> Vec<i16> {
        let mut output = Vec::with_capacity(input.len() * RATE_RATIO);
        for &sample in input {
            let prev = i32::from(self.last.unwrap_or(sample));
            let cur = i32::from(sample);
            for step in 1..=RATE_RATIO as i32 {
                let interpolated = prev + (cur - prev) * step / RATE_RATIO as i32;
                output.push(interpolated as i16);
            }
            self.last = Some(sample);
        }
        output
    }
}

/// 6:1 block-averaging downsampler.
///
/// Input chunks need not be a multiple of six samples; the remainder is
/// carried into the next call.
#[derive(Debug, Default)]
pub struct Downsampler {
    carry: Vec<i16>,
}

impl Downsampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert 48 kHz samples to 8 kHz. Output length is
    /// `(carry + input.len()) / 6`.
    pub fn process(&mut self, input: &[i16]) -> Vec<i16> {
        let mut samples = std::mem::take(&mut self.carry);
        samples.extend_from_slice(input);

        let mut output = Vec::with_capacity(samples.len() / RATE_RATIO);
        let mut blocks = samples.chunks_exact(RATE_RATIO);
        for block in &mut blocks {
            let sum: i32 = block.iter().map(|&s| i32::from(s)).sum();
            output.push((sum / RATE_RATIO as i32) as i16);
        }
        self.carry = blocks.remainder().to_vec();
        output
    }
}
