//! In-memory history of rendered narrations

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rand::Rng;
use std::path::{Path, PathBuf};

use crate::audio::WavContainer;
use crate::voices::VoicePersona;

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_LEN: usize = 7;

/// One rendered narration. Never mutated after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct NarrationRecord {
    pub id: String,
    pub text: String,
    pub voice_name: String,
    pub voice_id: String,
    pub persona_instruction: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub audio: WavContainer,
}

impl NarrationRecord {
    pub fn new(text: impl Into<String>, voice: &VoicePersona, audio: WavContainer) -> Self {
        Self {
            id: record_id(),
            text: text.into(),
            voice_name: voice.name().to_string(),
            voice_id: voice.voice_id().to_string(),
            persona_instruction: voice.persona_instruction().map(str::to_string),
            timestamp: Utc::now(),
            audio,
        }
    }

    /// File name used when the narration is downloaded
    pub fn file_name(&self) -> String {
        format!("voxmystic-{}.wav", self.id)
    }
}

/// Random 7 character lowercase base-36 identifier
fn record_id() -> String {
    let mut rng = rand::thread_rng();
    (0..ID_LEN)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

/// Narrations of this session, newest first
#[derive(Debug, Default)]
pub struct NarrationHistory {
    records: Vec<NarrationRecord>,
}

impl NarrationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: NarrationRecord) {
        self.records.insert(0, record);
    }

    pub fn records(&self) -> &[NarrationRecord] {
        &self.records
    }

    pub fn get(&self, id: &str) -> Option<&NarrationRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn latest(&self) -> Option<&NarrationRecord> {
        self.records.first()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Write `record` as `voxmystic-{id}.wav` inside `dir`
    pub fn export(record: &NarrationRecord, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(record.file_name());
        record
            .audio
            .write_to_path(&path)
            .with_context(|| format!("Failed to write narration to {path:?}"))?;
        tracing::info!(id = %record.id, path = ?path, "narration exported");
        Ok(path)
    }
}
