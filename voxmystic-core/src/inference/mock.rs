use std::sync::{Arc, Mutex};

use base64::Engine;

use super::error::InferenceError;
use super::provider::InferenceProvider;
use super::types::{SynthesisRequest, SynthesizedSpeech, VoiceAnalysis};
use crate::audio::{encode_pcm16le, MODEL_SAMPLE_RATE};
use crate::capture::CapturedAudio;

pub const MOCK_PERSONA: &str = "Speak in a calm, low, and measured voice:";
pub const MOCK_SIGNATURE: &str = "linear-gradient(135deg, #1e293b 0%, #6366f1 100%)";

/// Mock behavior for the mock provider
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, Default, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum MockBehavior {
    /// Return a short tone for synthesis and a fixed persona for analysis
    #[default]
    Success,
    /// Respond without any audio payload
    NoAudio,
    /// Fail every call with an HTTP style error
    ServiceError { status: u16, message: String },
    /// Analysis response without persona or signature fields
    PartialAnalysis,
    /// Analysis fails outright
    AnalysisError,
    /// Pop one behavior per call, falling back to success once drained
    BehaviorQueue { behaviors: Vec<MockBehavior> },
}

/// Mock inference provider for testing and offline use
#[derive(Clone)]
pub struct MockProvider {
    behavior: Arc<Mutex<MockBehavior>>,
    synthesis_requests: Arc<Mutex<Vec<SynthesisRequest>>>,
    analyzed_samples: Arc<Mutex<Vec<CapturedAudio>>>,
}

impl MockProvider {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior: Arc::new(Mutex::new(behavior)),
            synthesis_requests: Arc::new(Mutex::new(Vec::new())),
            analyzed_samples: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn pop_behavior_from_queue(behavior: &mut MockBehavior) -> MockBehavior {
        if let MockBehavior::BehaviorQueue { behaviors } = behavior {
            if behaviors.is_empty() {
                return MockBehavior::Success;
            }
            return behaviors.remove(0);
        }
        behavior.clone()
    }

    fn next_behavior(&self) -> MockBehavior {
        let mut behavior = self.behavior.lock().unwrap();
        Self::pop_behavior_from_queue(&mut behavior)
    }

    pub fn set_behavior(&self, behavior: MockBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn synthesis_requests(&self) -> Vec<SynthesisRequest> {
        self.synthesis_requests.lock().unwrap().clone()
    }

    pub fn last_synthesis_request(&self) -> Option<SynthesisRequest> {
        self.synthesis_requests.lock().unwrap().last().cloned()
    }

    pub fn analyzed_samples(&self) -> Vec<CapturedAudio> {
        self.analyzed_samples.lock().unwrap().clone()
    }
}

/// 100ms of a 440Hz tone at the model output rate, base64 encoded
pub fn mock_tone_base64() -> String {
    let frames = MODEL_SAMPLE_RATE as usize / 10;
    let samples: Vec<f32> = (0..frames)
        .map(|i| {
            let t = i as f32 / MODEL_SAMPLE_RATE as f32;
            (t * 440.0 * std::f32::consts::TAU).sin() * 0.5
        })
        .collect();
    base64::engine::general_purpose::STANDARD.encode(encode_pcm16le(&samples))
}

fn service_error(status: u16, message: String) -> InferenceError {
    InferenceError::Http {
        status,
        body: message,
    }
}

#[async_trait::async_trait]
impl InferenceProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn synthesize(
        &self,
        request: SynthesisRequest,
    ) -> Result<SynthesizedSpeech, InferenceError> {
        self.synthesis_requests.lock().unwrap().push(request);

        match self.next_behavior() {
            MockBehavior::NoAudio => Err(InferenceError::NoAudio),
            MockBehavior::ServiceError { status, message } => Err(service_error(status, message)),
            _ => Ok(SynthesizedSpeech {
                audio_base64: mock_tone_base64(),
            }),
        }
    }

    async fn analyze_sample(
        &self,
        sample: &CapturedAudio,
    ) -> Result<VoiceAnalysis, InferenceError> {
        self.analyzed_samples.lock().unwrap().push(sample.clone());

        match self.next_behavior() {
            MockBehavior::PartialAnalysis | MockBehavior::NoAudio => {
                Ok(VoiceAnalysis::from_partial(None, None))
            }
            MockBehavior::AnalysisError => Err(InferenceError::AnalysisFailed(anyhow::anyhow!(
                "Mock analysis failure"
            ))),
            MockBehavior::ServiceError { status, message } => Err(
                InferenceError::AnalysisFailed(anyhow::anyhow!(service_error(status, message))),
            ),
            _ => Ok(VoiceAnalysis {
                persona_instruction: MOCK_PERSONA.to_string(),
                visual_signature: MOCK_SIGNATURE.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::decode_base64_pcm;

    #[tokio::test]
    async fn queue_drains_then_succeeds() {
        let provider = MockProvider::new(MockBehavior::BehaviorQueue {
            behaviors: vec![MockBehavior::NoAudio],
        });
        let request = SynthesisRequest {
            text: "hi".into(),
            voice_id: "Puck".into(),
            persona_instruction: None,
        };

        assert!(matches!(
            provider.synthesize(request.clone()).await,
            Err(InferenceError::NoAudio)
        ));
        assert!(provider.synthesize(request).await.is_ok());
        assert_eq!(provider.synthesis_requests().len(), 2);
    }

    #[test]
    fn tone_decodes_at_model_rate() {
        let sample = decode_base64_pcm(&mock_tone_base64(), MODEL_SAMPLE_RATE, 1).unwrap();
        assert_eq!(sample.frames(), 2_400);
    }
}
