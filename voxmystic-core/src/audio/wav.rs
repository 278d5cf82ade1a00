//! Canonical 16-bit PCM WAV container.
//!
//! The layout is the classic 44-byte header: a `RIFF` chunk wrapping a
//! 16-byte `fmt ` chunk and a single `data` chunk. Bit depth is always 16
//! regardless of the precision of the input samples.

use std::io;
use std::path::Path;
use std::time::Duration;

use super::pcm::write_pcm16le;
use super::{AudioError, AudioSample};

/// Size of the canonical header preceding the PCM payload
pub const WAV_HEADER_LEN: usize = 44;

const RIFF_OVERHEAD: u32 = 36;
const FMT_CHUNK_LEN: u32 = 16;
const PCM_FORMAT_TAG: u16 = 1;
const BITS_PER_SAMPLE: u16 = 16;
const BYTES_PER_SAMPLE: u16 = BITS_PER_SAMPLE / 8;

/// Header fields of a canonical PCM WAV file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub chunk_size: u32,
    pub format_tag: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub data_len: u32,
}

impl WavHeader {
    /// Header describing `data_len` bytes of 16-bit PCM. Formats whose
    /// block align or byte rate overflow the header fields are rejected.
    pub fn for_payload(sample_rate: u32, channels: u16, data_len: u32) -> Result<Self, AudioError> {
        let too_large = || AudioError::FormatTooLarge {
            sample_rate,
            channels,
        };
        let block_align = channels.checked_mul(BYTES_PER_SAMPLE).ok_or_else(too_large)?;
        let byte_rate = sample_rate
            .checked_mul(u32::from(block_align))
            .ok_or_else(too_large)?;
        let chunk_size = RIFF_OVERHEAD
            .checked_add(data_len)
            .ok_or(AudioError::TooLong {
                bytes: data_len as usize,
            })?;

        Ok(Self {
            chunk_size,
            format_tag: PCM_FORMAT_TAG,
            channels,
            sample_rate,
            byte_rate,
            block_align,
            bits_per_sample: BITS_PER_SAMPLE,
            data_len,
        })
    }

    fn write_to(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&self.chunk_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&FMT_CHUNK_LEN.to_le_bytes());
        buf.extend_from_slice(&self.format_tag.to_le_bytes());
        buf.extend_from_slice(&self.channels.to_le_bytes());
        buf.extend_from_slice(&self.sample_rate.to_le_bytes());
        buf.extend_from_slice(&self.byte_rate.to_le_bytes());
        buf.extend_from_slice(&self.block_align.to_le_bytes());
        buf.extend_from_slice(&self.bits_per_sample.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&self.data_len.to_le_bytes());
    }

    /// Parse a canonical 44-byte header. Extended `fmt ` chunks and extra
    /// chunks before `data` are rejected.
    pub fn parse(bytes: &[u8]) -> Result<Self, AudioError> {
        if bytes.len() < WAV_HEADER_LEN {
            return Err(AudioError::InvalidHeader(format!(
                "expected at least {WAV_HEADER_LEN} bytes, got {}",
                bytes.len()
            )));
        }

        let tag = |offset: usize| &bytes[offset..offset + 4];
        let u16_at = |offset: usize| u16::from_le_bytes([bytes[offset], bytes[offset + 1]]);
        let u32_at = |offset: usize| {
            u32::from_le_bytes([
                bytes[offset],
                bytes[offset + 1],
                bytes[offset + 2],
                bytes[offset + 3],
            ])
        };

        if tag(0) != b"RIFF" || tag(8) != b"WAVE" {
            return Err(AudioError::InvalidHeader("missing RIFF/WAVE tags".into()));
        }
        if tag(12) != b"fmt " || u32_at(16) != FMT_CHUNK_LEN {
            return Err(AudioError::InvalidHeader(
                "expected a 16-byte fmt chunk".into(),
            ));
        }
        if tag(36) != b"data" {
            return Err(AudioError::InvalidHeader(
                "expected data chunk at offset 36".into(),
            ));
        }

        Ok(Self {
            chunk_size: u32_at(4),
            format_tag: u16_at(20),
            channels: u16_at(22),
            sample_rate: u32_at(24),
            byte_rate: u32_at(28),
            block_align: u16_at(32),
            bits_per_sample: u16_at(34),
            data_len: u32_at(40),
        })
    }
}

/// A complete WAV file held in memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavContainer {
    header: WavHeader,
    bytes: Vec<u8>,
}

impl WavContainer {
    pub fn header(&self) -> &WavHeader {
        &self.header
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// The interleaved PCM payload following the header
    pub fn data(&self) -> &[u8] {
        &self.bytes[WAV_HEADER_LEN..]
    }

    /// Total length in bytes, header included
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.header.data_len == 0
    }

    pub fn duration(&self) -> Duration {
        let frames = self.header.data_len as f64 / self.header.block_align as f64;
        Duration::from_secs_f64(frames / self.header.sample_rate as f64)
    }

    /// Write the container to `path`, creating parent directories.
    pub fn write_to_path(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, &self.bytes)
    }
}

/// Encode a sample buffer as a 16-bit PCM WAV container.
///
/// Values are clamped to [-1.0, 1.0] and scaled by 32767 (positive) or 32768
/// (negative) with rounding. Output is byte-identical for identical input.
pub fn encode_wav(sample: AudioSample) -> Result<WavContainer, AudioError> {
    let payload_len = sample.samples().len() * BYTES_PER_SAMPLE as usize;
    let data_len =
        u32::try_from(payload_len).map_err(|_| AudioError::TooLong { bytes: payload_len })?;

    let header = WavHeader::for_payload(sample.sample_rate(), sample.channels(), data_len)?;

    let mut bytes = Vec::with_capacity(WAV_HEADER_LEN + payload_len);
    header.write_to(&mut bytes);
    write_pcm16le(sample.samples(), &mut bytes);

    tracing::debug!(
        sample_rate = header.sample_rate,
        channels = header.channels,
        data_len,
        "encoded wav container"
    );

    Ok(WavContainer { header, bytes })
}
