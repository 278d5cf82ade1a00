//! Gemini `generateContent` implementation of [`InferenceProvider`]

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, info};

use super::error::InferenceError;
use super::provider::InferenceProvider;
use super::types::{SynthesisRequest, SynthesizedSpeech, VoiceAnalysis};
use crate::capture::CapturedAudio;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TTS_MODEL: &str = "gemini-2.5-flash-preview-tts";
pub const DEFAULT_ANALYSIS_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

const ANALYSIS_PROMPT: &str = r#"Analyze this voice sample. Extract its unique acoustic fingerprint (tone, resonance, emotional weight, and cadence).

Return a JSON object with:
1. "persona": A single-sentence TTS instruction starting with "Speak in a..." and ending with a colon.
   Example: "Speak in a velvet-smooth, mid-range male voice with a slight hint of mystery and a slow, rhythmic pace:"
2. "signature": A CSS linear-gradient string (e.g., "linear-gradient(135deg, #6366f1 0%, #a855f7 100%)") that visually represents the 'feeling' of the voice. Darker/deeper voices should have darker/richer colors, brighter/higher voices should have vibrant/lighter colors."#;

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
    pub tts_model: String,
    pub analysis_model: String,
    pub timeout: Duration,
}

impl GeminiConfig {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            tts_model: DEFAULT_TTS_MODEL.to_string(),
            analysis_model: DEFAULT_ANALYSIS_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

pub struct GeminiProvider {
    config: GeminiConfig,
    client: Client,
}

impl GeminiProvider {
    pub fn new(config: GeminiConfig) -> Result<Self, InferenceError> {
        if config.api_key.trim().is_empty() {
            return Err(InferenceError::Configuration(
                "Gemini API key is empty".to_string(),
            ));
        }

        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self { config, client })
    }

    async fn generate(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, InferenceError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            model
        );

        debug!(%model, "Sending generateContent request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<RequestContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

impl RequestPart {
    fn text(text: impl Into<String>) -> Self {
        Self {
            inline_data: None,
            text: Some(text.into()),
        }
    }

    fn inline(mime_type: &str, data: String) -> Self {
        Self {
            inline_data: Some(InlineData {
                mime_type: mime_type.to_string(),
                data,
            }),
            text: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    data: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<&'static str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    speech_config: Option<SpeechConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeechConfig {
    voice_config: VoiceConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceConfig {
    prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PrebuiltVoiceConfig {
    voice_name: String,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
struct AnalysisPayload {
    #[serde(default)]
    persona: Option<String>,
    #[serde(default)]
    signature: Option<String>,
}

impl GenerateContentResponse {
    fn first_parts(&self) -> &[ResponsePart] {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| content.parts.as_slice())
            .unwrap_or_default()
    }
}

fn synthesis_request(request: &SynthesisRequest) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![RequestContent {
            parts: vec![RequestPart::text(request.prompt())],
        }],
        generation_config: GenerationConfig {
            response_modalities: Some(vec!["AUDIO"]),
            speech_config: Some(SpeechConfig {
                voice_config: VoiceConfig {
                    prebuilt_voice_config: PrebuiltVoiceConfig {
                        voice_name: request.voice_id.clone(),
                    },
                },
            }),
            ..Default::default()
        },
    }
}

fn analysis_request(sample: &CapturedAudio) -> GenerateContentRequest {
    let data = base64::engine::general_purpose::STANDARD.encode(&sample.bytes);
    GenerateContentRequest {
        contents: vec![RequestContent {
            parts: vec![
                RequestPart::inline(&sample.mime_type, data),
                RequestPart::text(ANALYSIS_PROMPT),
            ],
        }],
        generation_config: GenerationConfig {
            response_mime_type: Some("application/json"),
            response_schema: Some(json!({
                "type": "OBJECT",
                "properties": {
                    "persona": { "type": "STRING" },
                    "signature": { "type": "STRING" }
                },
                "required": ["persona", "signature"]
            })),
            ..Default::default()
        },
    }
}

fn extract_audio(response: &GenerateContentResponse) -> Result<SynthesizedSpeech, InferenceError> {
    response
        .first_parts()
        .iter()
        .filter_map(|part| part.inline_data.as_ref())
        .map(|inline| inline.data.trim())
        .find(|data| !data.is_empty())
        .map(|data| SynthesizedSpeech {
            audio_base64: data.to_string(),
        })
        .ok_or(InferenceError::NoAudio)
}

fn extract_analysis(response: &GenerateContentResponse) -> Result<VoiceAnalysis, serde_json::Error> {
    let text = response
        .first_parts()
        .iter()
        .find_map(|part| part.text.as_deref())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .unwrap_or("{}");

    let payload: AnalysisPayload = serde_json::from_str(text)?;
    Ok(VoiceAnalysis::from_partial(
        payload.persona,
        payload.signature,
    ))
}

#[async_trait]
impl InferenceProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn synthesize(
        &self,
        request: SynthesisRequest,
    ) -> Result<SynthesizedSpeech, InferenceError> {
        let body = synthesis_request(&request);
        let result = self
            .generate(&self.config.tts_model, &body)
            .await
            .and_then(|response| extract_audio(&response));

        match &result {
            Ok(speech) => info!(
                voice = %request.voice_id,
                encoded_len = speech.audio_base64.len(),
                "Synthesized narration"
            ),
            Err(e) => error!(voice = %request.voice_id, error = %e, "Gemini TTS error"),
        }

        result
    }

    async fn analyze_sample(
        &self,
        sample: &CapturedAudio,
    ) -> Result<VoiceAnalysis, InferenceError> {
        let body = analysis_request(sample);
        let response = self
            .generate(&self.config.analysis_model, &body)
            .await
            .map_err(|e| {
                error!(error = %e, "Voice analysis error");
                InferenceError::AnalysisFailed(anyhow::anyhow!(e))
            })?;

        extract_analysis(&response).map_err(|e| {
            error!(error = %e, "Voice analysis returned malformed JSON");
            InferenceError::AnalysisFailed(anyhow::anyhow!(e))
        })
    }
}
