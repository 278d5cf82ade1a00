//! Narration studio state: the selected voice, the current render, and the
//! status shown to the user.
//!
//! Every operation that fails records its message and flips the status to
//! [`AppStatus::Error`] without touching the previous audio or the history,
//! so the user can simply try again.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use strum::Display;
use thiserror::Error;
use tracing::{error, info};

use crate::audio::{decode_base64_pcm, encode_wav, AudioError, AudioProfile, WavContainer};
use crate::capture::{CaptureError, CapturedAudio};
use crate::history::{NarrationHistory, NarrationRecord};
use crate::inference::{InferenceError, InferenceProvider};
use crate::voices::{
    default_clone_name, default_preset, find_preset, ClonedVoice, PresetVoice, VoiceLibrary,
    VoicePersona, PRESETS, RESTORED_PERSONA_NAME,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AppStatus {
    #[default]
    Idle,
    Generating,
    Analyzing,
    Recording,
    Playing,
    Error,
}

#[derive(Error, Debug)]
pub enum StudioError {
    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error("Unknown voice: {0}")]
    UnknownVoice(String),

    #[error("'{0}' is a built-in voice and cannot be deleted")]
    NotAClone(String),

    #[error("No narration with id {0}")]
    UnknownRecord(String),

    #[error("No narrations yet")]
    EmptyHistory,

    #[error("{0:#}")]
    Storage(anyhow::Error),
}

pub struct Studio {
    provider: Arc<dyn InferenceProvider>,
    library: VoiceLibrary,
    history: NarrationHistory,
    selected: VoicePersona,
    status: AppStatus,
    error_message: Option<String>,
    current_audio: Option<WavContainer>,
    draft: String,
}

impl Studio {
    pub fn new(provider: Arc<dyn InferenceProvider>, library: VoiceLibrary) -> Self {
        Self {
            provider,
            library,
            history: NarrationHistory::new(),
            selected: VoicePersona::default(),
            status: AppStatus::Idle,
            error_message: None,
            current_audio: None,
            draft: String::new(),
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    pub fn status(&self) -> AppStatus {
        self.status
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn selected_voice(&self) -> &VoicePersona {
        &self.selected
    }

    pub fn library(&self) -> &VoiceLibrary {
        &self.library
    }

    pub fn history(&self) -> &NarrationHistory {
        &self.history
    }

    pub fn current_audio(&self) -> Option<&WavContainer> {
        self.current_audio.as_ref()
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Every selectable voice, clones first
    pub fn voices(&self) -> Vec<VoicePersona> {
        self.library.personas()
    }

    pub fn select_voice(&mut self, name: &str) -> Result<&VoicePersona, StudioError> {
        match self.library.resolve(name) {
            Some(persona) => {
                self.selected = persona;
                Ok(&self.selected)
            }
            None => Err(self.fail(StudioError::UnknownVoice(name.to_string()))),
        }
    }

    /// Render `text` with the selected voice. Blank text is ignored.
    pub async fn narrate(&mut self, text: &str) -> Result<Option<&NarrationRecord>, StudioError> {
        if text.trim().is_empty() {
            return Ok(None);
        }

        self.begin(AppStatus::Generating);
        match self.render(text).await {
            Ok(record) => {
                info!(
                    id = %record.id,
                    voice = %record.voice_name,
                    duration = ?record.audio.duration(),
                    "narration rendered"
                );
                self.current_audio = Some(record.audio.clone());
                self.history.push(record);
                self.status = AppStatus::Idle;
                Ok(self.history.latest())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    async fn render(&self, text: &str) -> Result<NarrationRecord, StudioError> {
        let request = self.selected.synthesis_request(text);
        let speech = self.provider.synthesize(request).await?;
        let AudioProfile {
            sample_rate,
            channels,
        } = AudioProfile::MODEL_OUTPUT;
        let sample = decode_base64_pcm(&speech.audio_base64, sample_rate, channels)?;
        let wav = encode_wav(sample)?;
        Ok(NarrationRecord::new(text, &self.selected, wav))
    }

    /// Mark that a live recording is underway
    pub fn begin_recording(&mut self) {
        self.begin(AppStatus::Recording);
    }

    /// Analyze a voice sample, save the resulting clone and select it.
    /// Without a usable name the clone is called "Neural Clone N".
    pub async fn clone_voice(
        &mut self,
        sample: CapturedAudio,
        name: Option<String>,
    ) -> Result<ClonedVoice, StudioError> {
        self.begin(AppStatus::Analyzing);

        let analysis = match self.provider.analyze_sample(&sample).await {
            Ok(analysis) => analysis,
            Err(e) => return Err(self.fail(e.into())),
        };

        let name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| default_clone_name(self.library.len()));
        let clone = ClonedVoice::from_analysis(name, analysis);

        if let Err(e) = self.library.add(clone.clone()) {
            return Err(self.fail(StudioError::Storage(e)));
        }

        info!(name = %clone.name, persona = %clone.persona_instruction, "voice cloned");
        self.selected = VoicePersona::Clone(clone.clone());
        self.status = AppStatus::Idle;
        Ok(clone)
    }

    /// Delete a saved clone along with any clone sharing its persona. If the
    /// selection was one of them it falls back to the default preset.
    pub fn delete_voice(&mut self, name_or_id: &str) -> Result<ClonedVoice, StudioError> {
        let Some(id) = self.library.find(name_or_id).map(|c| c.id.clone()) else {
            let error = if find_preset(name_or_id).is_some() {
                StudioError::NotAClone(name_or_id.to_string())
            } else {
                StudioError::UnknownVoice(name_or_id.to_string())
            };
            return Err(self.fail(error));
        };

        let removed = match self.library.remove(&id) {
            Ok(removed) => removed,
            Err(e) => return Err(self.fail(StudioError::Storage(e))),
        };
        let Some(deleted) = removed.iter().find(|c| c.id == id).cloned() else {
            return Err(self.fail(StudioError::UnknownVoice(name_or_id.to_string())));
        };

        let was_selected = match &self.selected {
            VoicePersona::Clone(selected) => removed.iter().any(|c| {
                c.id == selected.id || c.persona_instruction == selected.persona_instruction
            }),
            VoicePersona::Preset(_) => false,
        };
        if was_selected {
            self.selected = VoicePersona::default();
        }

        Ok(deleted)
    }

    /// Bring back the text and voice of a past narration. A persona that no
    /// longer matches any voice is saved to the library as "Restored Persona".
    pub fn restore(&mut self, record_id: &str) -> Result<&VoicePersona, StudioError> {
        let Some(record) = self.history.get(record_id).cloned() else {
            return Err(self.fail(StudioError::UnknownRecord(record_id.to_string())));
        };

        self.draft = record.text.clone();
        let persona = self.persona_for(&record);
        if let VoicePersona::Clone(clone) = &persona {
            if self.library.find(&clone.id).is_none() {
                if let Err(e) = self.library.add(clone.clone()) {
                    return Err(self.fail(StudioError::Storage(e)));
                }
            }
        }

        self.selected = persona;
        info!(id = %record.id, voice = %self.selected.name(), "narration restored");
        Ok(&self.selected)
    }

    fn persona_for(&self, record: &NarrationRecord) -> VoicePersona {
        match &record.persona_instruction {
            Some(instruction) => {
                if let Some(existing) = self.library.find_by_instruction(instruction) {
                    return VoicePersona::Clone(existing.clone());
                }
                if let Some(preset) = PRESETS.iter().find(|p| {
                    p.name == record.voice_name
                        && p.persona_instruction == Some(instruction.as_str())
                }) {
                    return VoicePersona::Preset(preset);
                }
                let mut restored = ClonedVoice::with_instruction(
                    RESTORED_PERSONA_NAME,
                    instruction.clone(),
                    None,
                );
                restored.voice_id = record.voice_id.clone();
                VoicePersona::Clone(restored)
            }
            None => {
                let plain = |p: &&'static PresetVoice| p.persona_instruction.is_none();
                let preset = find_preset(&record.voice_name)
                    .filter(plain)
                    .or_else(|| {
                        PRESETS
                            .iter()
                            .filter(plain)
                            .find(|p| p.voice_id == record.voice_id)
                    })
                    .unwrap_or_else(default_preset);
                VoicePersona::Preset(preset)
            }
        }
    }

    /// Make a narration (the latest when `record_id` is `None`) the current
    /// audio and mark playback as started. Returns the audio to play.
    pub fn begin_playback(&mut self, record_id: Option<&str>) -> Result<WavContainer, StudioError> {
        let audio = match self.lookup(record_id) {
            Ok(record) => record.audio.clone(),
            Err(e) => return Err(self.fail(e)),
        };
        self.current_audio = Some(audio.clone());
        self.begin(AppStatus::Playing);
        Ok(audio)
    }

    pub fn finish_playback(&mut self) {
        if self.status == AppStatus::Playing {
            self.status = AppStatus::Idle;
        }
    }

    /// Write a narration (the latest when `record_id` is `None`) into `dir`
    pub fn export(&mut self, record_id: Option<&str>, dir: &Path) -> Result<PathBuf, StudioError> {
        let result = self
            .lookup(record_id)
            .and_then(|record| NarrationHistory::export(record, dir).map_err(StudioError::Storage));
        result.map_err(|e| self.fail(e))
    }

    fn lookup(&self, record_id: Option<&str>) -> Result<&NarrationRecord, StudioError> {
        match record_id {
            Some(id) => self
                .history
                .get(id)
                .ok_or_else(|| StudioError::UnknownRecord(id.to_string())),
            None => self.history.latest().ok_or(StudioError::EmptyHistory),
        }
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Record a failure that happened outside the studio, such as a
    /// microphone that could not be opened
    pub fn fail(&mut self, error: StudioError) -> StudioError {
        error!(status = %self.status, "{error}");
        self.status = AppStatus::Error;
        self.error_message = Some(error.to_string());
        error
    }

    pub fn dismiss_error(&mut self) {
        if self.status == AppStatus::Error {
            self.status = AppStatus::Idle;
        }
        self.error_message = None;
    }

    fn begin(&mut self, status: AppStatus) {
        self.status = status;
        self.error_message = None;
    }
}
