use async_trait::async_trait;

use super::error::InferenceError;
use super::types::{SynthesisRequest, SynthesizedSpeech, VoiceAnalysis};
use crate::capture::CapturedAudio;

/// The remote generative model behind synthesis and voice analysis
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Render narration text. Returns base64 raw PCM at the model output
    /// profile, or [`InferenceError::NoAudio`] when the response has none.
    async fn synthesize(
        &self,
        request: SynthesisRequest,
    ) -> Result<SynthesizedSpeech, InferenceError>;

    /// Derive a persona instruction and visual signature from a voice sample
    async fn analyze_sample(&self, sample: &CapturedAudio)
        -> Result<VoiceAnalysis, InferenceError>;
}
