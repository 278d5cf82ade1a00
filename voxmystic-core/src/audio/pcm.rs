//! Raw 16-bit little-endian PCM <-> float sample conversion

use base64::Engine;

use super::{AudioError, AudioSample};

/// Map a float amplitude onto the signed 16-bit range.
///
/// Positive values scale by 32767 and negative values by 32768 so that both
/// ends of [-1.0, 1.0] reach full scale. NaN maps to silence.
pub fn quantize(value: f32) -> i16 {
    if value.is_nan() {
        return 0;
    }
    let clamped = value.clamp(-1.0, 1.0);
    let scaled = if clamped < 0.0 {
        clamped * 32768.0
    } else {
        clamped * 32767.0
    };
    scaled.round() as i16
}

pub(crate) fn write_pcm16le(samples: &[f32], out: &mut Vec<u8>) {
    out.reserve(samples.len() * 2);
    for &sample in samples {
        out.extend_from_slice(&quantize(sample).to_le_bytes());
    }
}

/// Convert f32 samples to i16 little-endian bytes
pub fn encode_pcm16le(samples: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    write_pcm16le(samples, &mut bytes);
    bytes
}

/// Interpret raw 16-bit signed little-endian PCM as an [`AudioSample`].
///
/// The byte length must be a non-zero multiple of one frame
/// (`2 * channels`). Each value is divided by 32768.
pub fn decode_pcm16le(
    bytes: &[u8],
    sample_rate: u32,
    channels: u16,
) -> Result<AudioSample, AudioError> {
    if channels == 0 {
        return Err(AudioError::InvalidChannels);
    }
    if bytes.is_empty() {
        return Err(AudioError::EmptyBuffer);
    }
    let frame_len = 2 * channels as usize;
    if bytes.len() % frame_len != 0 {
        return Err(AudioError::Misaligned {
            len: bytes.len(),
            unit: "bytes",
            channels,
        });
    }

    let samples = bytes
        .chunks_exact(2)
        .map(|chunk| i16::from_le_bytes([chunk[0], chunk[1]]) as f32 / 32768.0)
        .collect();

    AudioSample::new(samples, sample_rate, channels)
}

/// Decode a base64 payload of raw PCM, as returned inline by the speech model
pub fn decode_base64_pcm(
    encoded: &str,
    sample_rate: u32,
    channels: u16,
) -> Result<AudioSample, AudioError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| AudioError::Base64(e.to_string()))?;

    tracing::debug!(bytes = bytes.len(), sample_rate, channels, "decoded model audio");

    decode_pcm16le(&bytes, sample_rate, channels)
}
