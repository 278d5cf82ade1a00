use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::persona::{find_preset, ClonedVoice, VoicePersona, PRESETS};

/// The user's saved voice clones, persisted as a JSON array.
///
/// The whole file is rewritten after every mutation. If a write fails the
/// in-memory list is rolled back so memory and disk stay in agreement.
#[derive(Debug)]
pub struct VoiceLibrary {
    path: PathBuf,
    clones: Vec<ClonedVoice>,
}

impl VoiceLibrary {
    /// Get the default library path (~/.voxmystic/voices.json)
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Failed to get home directory")?;
        Ok(home.join(".voxmystic").join("voices.json"))
    }

    /// Load the library at `path`. A missing file is an empty library. A file
    /// that cannot be read or parsed is moved aside to `<path>.backup` and
    /// treated as empty; none of these stop the studio from starting.
    pub fn load(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            return Ok(Self {
                path,
                clones: Vec::new(),
            });
        }

        let clones = match read_clones(&path) {
            Ok(clones) => clones,
            Err(e) => {
                let backup_path = backup_path(&path);
                tracing::warn!(
                    "Voice library {:?} is unusable, moving it to {:?}: {:#}",
                    path,
                    backup_path,
                    e
                );
                if let Err(e) = fs::rename(&path, &backup_path) {
                    tracing::warn!("Failed to back up voice library to {backup_path:?}: {e}");
                }
                Vec::new()
            }
        };

        tracing::debug!(path = ?path, clones = clones.len(), "voice library loaded");
        Ok(Self { path, clones })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Saved clones, newest first
    pub fn clones(&self) -> &[ClonedVoice] {
        &self.clones
    }

    pub fn len(&self) -> usize {
        self.clones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clones.is_empty()
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {parent:?}"))?;
        }
        let json =
            serde_json::to_string_pretty(&self.clones).context("Failed to serialize voices")?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write voice library to {:?}", self.path))
    }

    /// Add a clone at the front of the list and persist
    pub fn add(&mut self, clone: ClonedVoice) -> Result<()> {
        self.clones.insert(0, clone);
        if let Err(e) = self.save() {
            self.clones.remove(0);
            return Err(e);
        }
        tracing::info!(name = %self.clones[0].name, "voice clone saved");
        Ok(())
    }

    /// Remove the clone with `id` together with every clone sharing its
    /// persona instruction, then persist. Returns the removed clones, or an
    /// empty list when `id` is unknown.
    pub fn remove(&mut self, id: &str) -> Result<Vec<ClonedVoice>> {
        let Some(instruction) = self
            .clones
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.persona_instruction.clone())
        else {
            return Ok(Vec::new());
        };

        let previous = self.clones.clone();
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.clones)
            .into_iter()
            .partition(|c| c.persona_instruction == instruction);
        self.clones = kept;

        if let Err(e) = self.save() {
            self.clones = previous;
            return Err(e);
        }
        for clone in &removed {
            tracing::info!(name = %clone.name, "voice clone deleted");
        }
        Ok(removed)
    }

    /// Find a clone by id, or by name ignoring case
    pub fn find(&self, name_or_id: &str) -> Option<&ClonedVoice> {
        self.clones
            .iter()
            .find(|c| c.id == name_or_id)
            .or_else(|| {
                self.clones
                    .iter()
                    .find(|c| c.name.eq_ignore_ascii_case(name_or_id))
            })
    }

    pub fn find_by_instruction(&self, instruction: &str) -> Option<&ClonedVoice> {
        self.clones
            .iter()
            .find(|c| c.persona_instruction == instruction)
    }

    /// Resolve a voice by name. Saved clones shadow presets of the same name.
    pub fn resolve(&self, name: &str) -> Option<VoicePersona> {
        self.find(name)
            .cloned()
            .map(VoicePersona::Clone)
            .or_else(|| find_preset(name).map(VoicePersona::Preset))
    }

    /// Every selectable voice: clones first, then presets
    pub fn personas(&self) -> Vec<VoicePersona> {
        self.clones
            .iter()
            .cloned()
            .map(VoicePersona::Clone)
            .chain(PRESETS.iter().map(VoicePersona::Preset))
            .collect()
    }
}

fn read_clones(path: &Path) -> Result<Vec<ClonedVoice>> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {path:?}"))?;
    let json = std::str::from_utf8(&bytes).context("Voice library is not UTF-8")?;
    serde_json::from_str(json).context("Voice library is not a JSON list of clones")
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".backup");
    PathBuf::from(name)
}
