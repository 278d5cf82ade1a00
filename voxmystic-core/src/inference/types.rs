use serde::{Deserialize, Serialize};

/// Instruction used when the analysis response carries no persona
pub const FALLBACK_PERSONA: &str = "Speak in a natural voice:";

/// Gradient used when the analysis response carries no visual signature
pub const FALLBACK_SIGNATURE: &str = "linear-gradient(135deg, #4f46e5 0%, #7c3aed 100%)";

/// A request to render narration text with a model voice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesisRequest {
    pub text: String,
    pub voice_id: String,
    pub persona_instruction: Option<String>,
}

impl SynthesisRequest {
    /// Text sent to the model. A persona instruction is prepended and the
    /// narration quoted so the model reads it in that style.
    pub fn prompt(&self) -> String {
        match &self.persona_instruction {
            Some(persona) => format!("{persona} \"{}\"", self.text),
            None => self.text.clone(),
        }
    }
}

/// Audio returned from synthesis, still base64 encoded raw PCM
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedSpeech {
    pub audio_base64: String,
}

/// Persona extracted from a voice sample
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceAnalysis {
    pub persona_instruction: String,
    pub visual_signature: String,
}

impl VoiceAnalysis {
    /// Fill missing or blank fields with the neutral fallbacks
    pub fn from_partial(persona: Option<String>, signature: Option<String>) -> Self {
        let non_blank = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
        Self {
            persona_instruction: non_blank(persona)
                .unwrap_or_else(|| FALLBACK_PERSONA.to_string()),
            visual_signature: non_blank(signature)
                .unwrap_or_else(|| FALLBACK_SIGNATURE.to_string()),
        }
    }
}
