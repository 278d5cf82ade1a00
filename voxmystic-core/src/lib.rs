pub mod audio;
pub mod capture;
pub mod history;
pub mod inference;
pub mod settings;
pub mod studio;
pub mod voices;

// Public library API
pub use audio::{encode_wav, AudioSample, WavContainer};
pub use capture::CapturedAudio;
pub use inference::InferenceProvider;
pub use settings::{Settings, SettingsManager};
pub use studio::{AppStatus, Studio, StudioError};
pub use voices::{VoiceLibrary, VoicePersona};
