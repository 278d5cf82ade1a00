//! Voice sample collection: audio files from disk and live recording sessions

pub mod meter;
#[cfg(feature = "devices")]
pub mod microphone;
#[cfg(feature = "devices")]
pub mod playback;
pub mod session;

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::audio::{AudioError, WavContainer};

pub use meter::{level_bar, LevelMeter};
pub use session::{LevelFrame, RecordingSession, SampleSource};

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Microphone access is required for real-time cloning.")]
    PermissionDenied { reason: String },

    #[error("Unsupported audio file type: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("Audio file is empty: {}", .0.display())]
    EmptyFile(PathBuf),

    #[error("Failed to read audio file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Recording captured no audio")]
    NothingRecorded,

    #[error("Audio device error: {0}")]
    Device(String),

    #[error(transparent)]
    Audio(#[from] AudioError),
}

/// A voice sample ready to be sent for analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedAudio {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl CapturedAudio {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    pub fn from_wav(wav: WavContainer) -> Self {
        Self::new(wav.into_bytes(), "audio/wav")
    }

    /// Load a sample from disk, inferring its media type from the extension
    pub async fn from_file(path: &Path) -> Result<Self, CaptureError> {
        let mime_type =
            mime_type_for(path).ok_or_else(|| CaptureError::UnsupportedFormat(path.into()))?;

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| CaptureError::Read {
                path: path.into(),
                source,
            })?;

        if bytes.is_empty() {
            return Err(CaptureError::EmptyFile(path.into()));
        }

        tracing::debug!(?path, mime_type, bytes = bytes.len(), "loaded voice sample");

        Ok(Self::new(bytes, mime_type))
    }
}

/// Media type for an audio file extension, or `None` if it is not audio
pub fn mime_type_for(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match extension.as_str() {
        "wav" | "wave" => "audio/wav",
        "mp3" => "audio/mpeg",
        "webm" => "audio/webm",
        "ogg" | "oga" | "opus" => "audio/ogg",
        "m4a" | "mp4" => "audio/mp4",
        "aac" => "audio/aac",
        "flac" => "audio/flac",
        "aif" | "aiff" => "audio/aiff",
        _ => return None,
    };
    Some(mime)
}
