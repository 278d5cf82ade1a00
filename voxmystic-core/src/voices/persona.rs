use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::inference::{SynthesisRequest, VoiceAnalysis};

/// Prebuilt model voice used for every cloned persona. Identity is carried
/// entirely by the persona instruction.
pub const CLONE_BASE_VOICE: &str = "Kore";

/// Name given to a persona restored from history that matches no saved clone
pub const RESTORED_PERSONA_NAME: &str = "Restored Persona";

/// A built-in voice
#[derive(Debug, PartialEq, Eq)]
pub struct PresetVoice {
    pub name: &'static str,
    pub voice_id: &'static str,
    pub description: &'static str,
    pub persona_instruction: Option<&'static str>,
}

pub static PRESETS: [PresetVoice; 8] = [
    PresetVoice {
        name: "Julian",
        voice_id: "Kore",
        description: "Warm, clear, and professional male voice.",
        persona_instruction: Some("Speak in a warm, clear, and professional male voice:"),
    },
    PresetVoice {
        name: "Orion",
        voice_id: "Kore",
        description: "Heroic, resonant, and cinematic male voice.",
        persona_instruction: Some(
            "Speak in a heroic, resonant, and cinematic male voice with high confidence:",
        ),
    },
    PresetVoice {
        name: "Kore",
        voice_id: "Kore",
        description: "Deep, gravelly, and mysterious.",
        persona_instruction: None,
    },
    PresetVoice {
        name: "Aoede",
        voice_id: "Aoede",
        description: "Graceful, melodic, and bright.",
        persona_instruction: None,
    },
    PresetVoice {
        name: "Puck",
        voice_id: "Puck",
        description: "Playful, energetic, and whimsical.",
        persona_instruction: None,
    },
    PresetVoice {
        name: "Charon",
        voice_id: "Charon",
        description: "Ancient, slow, and weighty.",
        persona_instruction: None,
    },
    PresetVoice {
        name: "Zephyr",
        voice_id: "Zephyr",
        description: "Soft, airy, and calming.",
        persona_instruction: None,
    },
    PresetVoice {
        name: "Fenrir",
        voice_id: "Fenrir",
        description: "Strong, commanding, and rough.",
        persona_instruction: None,
    },
];

pub fn default_preset() -> &'static PresetVoice {
    &PRESETS[0]
}

pub fn find_preset(name: &str) -> Option<&'static PresetVoice> {
    PRESETS.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}

/// A persona derived from a user's voice sample
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClonedVoice {
    pub id: String,
    pub name: String,
    pub voice_id: String,
    pub description: String,
    pub persona_instruction: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual_signature: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ClonedVoice {
    pub fn from_analysis(name: impl Into<String>, analysis: VoiceAnalysis) -> Self {
        Self::with_instruction(
            name,
            analysis.persona_instruction,
            Some(analysis.visual_signature),
        )
    }

    pub fn with_instruction(
        name: impl Into<String>,
        persona_instruction: String,
        visual_signature: Option<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            voice_id: CLONE_BASE_VOICE.to_string(),
            description: describe_persona(&persona_instruction),
            persona_instruction,
            visual_signature,
            created_at: Utc::now(),
        }
    }
}

/// Human readable description of a persona instruction: the instruction with
/// its leading "Speak in a " and first colon removed.
pub fn describe_persona(instruction: &str) -> String {
    instruction
        .replacen("Speak in a ", "", 1)
        .replacen(':', "", 1)
}

pub fn default_clone_name(existing_clones: usize) -> String {
    format!("Neural Clone {}", existing_clones + 1)
}

/// The voice a narration is rendered with
#[derive(Debug, Clone, PartialEq)]
pub enum VoicePersona {
    Preset(&'static PresetVoice),
    Clone(ClonedVoice),
}

impl Default for VoicePersona {
    fn default() -> Self {
        Self::Preset(default_preset())
    }
}

impl VoicePersona {
    pub fn name(&self) -> &str {
        match self {
            Self::Preset(p) => p.name,
            Self::Clone(c) => &c.name,
        }
    }

    pub fn voice_id(&self) -> &str {
        match self {
            Self::Preset(p) => p.voice_id,
            Self::Clone(c) => &c.voice_id,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Self::Preset(p) => p.description,
            Self::Clone(c) => &c.description,
        }
    }

    pub fn persona_instruction(&self) -> Option<&str> {
        match self {
            Self::Preset(p) => p.persona_instruction,
            Self::Clone(c) => Some(&c.persona_instruction),
        }
    }

    pub fn is_clone(&self) -> bool {
        matches!(self, Self::Clone(_))
    }

    pub fn synthesis_request(&self, text: &str) -> SynthesisRequest {
        SynthesisRequest {
            text: text.to_string(),
            voice_id: self.voice_id().to_string(),
            persona_instruction: self.persona_instruction().map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Speak in a calm, low voice:", "calm, low voice")]
    #[case("Speak in a bright tone: with pauses:", "bright tone with pauses:")]
    #[case("Whisper softly", "Whisper softly")]
    #[case("Say it: Speak in a rush", "Say it rush")]
    fn describes_persona(#[case] instruction: &str, #[case] expected: &str) {
        assert_eq!(describe_persona(instruction), expected);
    }

    #[test]
    fn clones_use_base_voice() {
        let clone = ClonedVoice::from_analysis(
            "Narrator",
            VoiceAnalysis {
                persona_instruction: "Speak in a husky whisper:".into(),
                visual_signature: "linear-gradient(red, blue)".into(),
            },
        );
        assert_eq!(clone.voice_id, CLONE_BASE_VOICE);
        assert_eq!(clone.description, "husky whisper");
        assert_eq!(
            clone.visual_signature.as_deref(),
            Some("linear-gradient(red, blue)")
        );
    }

    #[test]
    fn preset_request_carries_optional_persona() {
        let kore = VoicePersona::Preset(find_preset("kore").unwrap());
        let request = kore.synthesis_request("Hello");
        assert_eq!(request.voice_id, "Kore");
        assert_eq!(request.persona_instruction, None);

        let julian = VoicePersona::default();
        assert_eq!(julian.name(), "Julian");
        assert!(julian
            .synthesis_request("Hello")
            .persona_instruction
            .unwrap()
            .starts_with("Speak in a warm"));
    }

    #[test]
    fn default_names_count_existing_clones() {
        assert_eq!(default_clone_name(0), "Neural Clone 1");
        assert_eq!(default_clone_name(2), "Neural Clone 3");
    }
}
