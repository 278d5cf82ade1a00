use thiserror::Error;

/// Failures while decoding or encoding audio buffers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AudioError {
    #[error("audio buffer is empty")]
    EmptyBuffer,

    #[error("sample rate must be a positive number of Hz")]
    InvalidSampleRate,

    #[error("channel count must be at least 1")]
    InvalidChannels,

    #[error("buffer of {len} {unit} does not hold whole {channels}-channel frames")]
    Misaligned {
        len: usize,
        unit: &'static str,
        channels: u16,
    },

    #[error("audio payload is not valid base64: {0}")]
    Base64(String),

    #[error("{bytes} bytes of PCM do not fit in a WAV container")]
    TooLong { bytes: usize },

    #[error("{channels} channels at {sample_rate} Hz overflow the WAV format fields")]
    FormatTooLarge { sample_rate: u32, channels: u16 },

    #[error("invalid WAV header: {0}")]
    InvalidHeader(String),
}
