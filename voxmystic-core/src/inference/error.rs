use anyhow::anyhow;
use thiserror::Error;

/// Failures talking to the remote model. None of these are retried
/// automatically; the user repeats the action instead.
#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("No audio data returned from model")]
    NoAudio,

    #[error(
        "Failed to capture voice signature. Ensure your sample is clear and at least 5 seconds long."
    )]
    AnalysisFailed(anyhow::Error),

    #[error("Model service error {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Request to model service failed: {0}")]
    Transport(anyhow::Error),

    #[error("Provider is not configured: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for InferenceError {
    fn from(source: reqwest::Error) -> Self {
        Self::Transport(anyhow!(source))
    }
}

impl From<serde_json::Error> for InferenceError {
    fn from(source: serde_json::Error) -> Self {
        Self::Transport(anyhow!(source))
    }
}
