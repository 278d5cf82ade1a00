pub mod library;
pub mod persona;

pub use library::VoiceLibrary;
pub use persona::{
    default_clone_name, default_preset, describe_persona, find_preset, ClonedVoice, PresetVoice,
    VoicePersona, CLONE_BASE_VOICE, PRESETS, RESTORED_PERSONA_NAME,
};
