use crate::settings::config::Settings;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Owns the settings file. Edits made through [`SettingsManager::settings_mut`]
/// stay in memory until [`SettingsManager::save`].
#[derive(Debug, Clone)]
pub struct SettingsManager {
    path: PathBuf,
    settings: Settings,
}

impl SettingsManager {
    /// Open the settings at ~/.voxmystic/settings.toml
    pub fn new() -> Result<Self> {
        Self::from_path(Self::default_settings_path()?)
    }

    /// Open the settings at `path`. A missing file is created with defaults;
    /// an unparseable one is set aside as `settings.toml.backup` and replaced.
    pub fn from_path(path: PathBuf) -> Result<Self> {
        let settings = if path.exists() {
            load_or_reset(&path)?
        } else {
            let defaults = Settings::default();
            write_settings(&path, &defaults)?;
            defaults
        };

        Ok(Self { path, settings })
    }

    pub fn default_settings_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Failed to get home directory")?;
        Ok(home.join(".voxmystic").join("settings.toml"))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Write `settings` to disk, then adopt them
    pub fn store(&mut self, settings: Settings) -> Result<()> {
        write_settings(&self.path, &settings)?;
        self.settings = settings;
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        write_settings(&self.path, &self.settings)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn load_or_reset(path: &Path) -> Result<Settings> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("Failed to read settings {path:?}"))?;

    let error = match toml::from_str(&contents) {
        Ok(settings) => return Ok(settings),
        Err(e) => e,
    };

    let backup = path.with_extension("toml.backup");
    tracing::warn!(?path, ?backup, "settings are unparseable, resetting: {error}");
    fs::rename(path, &backup)
        .with_context(|| format!("Failed to move corrupted settings to {backup:?}"))?;

    let defaults = Settings::default();
    write_settings(path, &defaults)?;
    Ok(defaults)
}

fn write_settings(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("Failed to create {parent:?}"))?;
    }
    let contents = toml::to_string_pretty(settings).context("Failed to serialize settings")?;
    fs::write(path, contents).with_context(|| format!("Failed to write settings {path:?}"))
}
