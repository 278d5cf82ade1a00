//! Audio sample model and the PCM/WAV codec used for model output and
//! captured voice samples.

pub mod error;
pub mod pcm;
pub mod wav;

use std::time::Duration;

pub use error::AudioError;
pub use pcm::{decode_base64_pcm, decode_pcm16le, encode_pcm16le};
pub use wav::{encode_wav, WavContainer, WavHeader};

/// Sample rate of the raw PCM returned by the speech model.
pub const MODEL_SAMPLE_RATE: u32 = 24_000;

/// Channel count of the raw PCM returned by the speech model.
pub const MODEL_CHANNELS: u16 = 1;

/// Audio format profile specifying sample rate and channel count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioProfile {
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioProfile {
    /// Format of the audio produced by the speech model
    pub const MODEL_OUTPUT: AudioProfile = AudioProfile {
        sample_rate: MODEL_SAMPLE_RATE,
        channels: MODEL_CHANNELS,
    };

    fn validate(&self) -> Result<(), AudioError> {
        if self.sample_rate == 0 {
            return Err(AudioError::InvalidSampleRate);
        }
        if self.channels == 0 {
            return Err(AudioError::InvalidChannels);
        }
        Ok(())
    }
}

/// Interleaved floating point samples plus their format.
///
/// Construction validates the buffer, so every `AudioSample` in circulation is
/// non-empty and made of whole frames. The encoder takes it by value.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSample {
    samples: Vec<f32>,
    profile: AudioProfile,
}

impl AudioSample {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Result<Self, AudioError> {
        let profile = AudioProfile {
            sample_rate,
            channels,
        };
        profile.validate()?;

        if samples.is_empty() {
            return Err(AudioError::EmptyBuffer);
        }
        if samples.len() % channels as usize != 0 {
            return Err(AudioError::Misaligned {
                len: samples.len(),
                unit: "samples",
                channels,
            });
        }

        Ok(Self { samples, profile })
    }

    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Result<Self, AudioError> {
        Self::new(samples, sample_rate, 1)
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.profile.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.profile.channels
    }

    pub fn profile(&self) -> AudioProfile {
        self.profile
    }

    /// Number of frames (one value per channel)
    pub fn frames(&self) -> usize {
        self.samples.len() / self.profile.channels as usize
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.frames() as f64 / self.profile.sample_rate as f64)
    }
}
