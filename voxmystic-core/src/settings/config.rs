use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::inference::gemini::{
    DEFAULT_ANALYSIS_MODEL, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, DEFAULT_TTS_MODEL,
};
use crate::inference::{
    GeminiConfig, GeminiProvider, InferenceError, InferenceProvider, MockBehavior, MockProvider,
};
use crate::voices::VoiceLibrary;

/// Environment variables consulted, in order, when no API key is configured
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

pub const DEFAULT_PROVIDER: &str = "gemini";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ProviderConfig {
    #[serde(rename = "gemini")]
    Gemini {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        api_key: Option<String>,
        #[serde(default = "default_tts_model")]
        tts_model: String,
        #[serde(default = "default_analysis_model")]
        analysis_model: String,
        #[serde(default = "default_base_url")]
        base_url: String,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
    #[serde(rename = "mock")]
    Mock {
        #[serde(default)]
        behavior: MockBehavior,
    },
}

fn default_tts_model() -> String {
    DEFAULT_TTS_MODEL.to_string()
}

fn default_analysis_model() -> String {
    DEFAULT_ANALYSIS_MODEL.to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_voice_name() -> String {
    "Julian".to_string()
}

fn default_autoplay() -> bool {
    true
}

impl ProviderConfig {
    pub fn gemini_defaults() -> Self {
        ProviderConfig::Gemini {
            api_key: None,
            tts_model: default_tts_model(),
            analysis_model: default_analysis_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Instantiate the provider, resolving the API key from the process
    /// environment when the configuration leaves it out
    pub fn build(&self) -> Result<Arc<dyn InferenceProvider>, InferenceError> {
        self.build_with_env(|name| std::env::var(name).ok())
    }

    pub fn build_with_env<F>(&self, env: F) -> Result<Arc<dyn InferenceProvider>, InferenceError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match self {
            ProviderConfig::Gemini {
                api_key,
                tts_model,
                analysis_model,
                base_url,
                timeout_secs,
            } => {
                let api_key = resolve_api_key(api_key.as_deref(), env).ok_or_else(|| {
                    InferenceError::Configuration(format!(
                        "No Gemini API key configured; set api_key in settings or export {}",
                        API_KEY_ENV_VARS.join(" or ")
                    ))
                })?;
                let config = GeminiConfig {
                    api_key,
                    base_url: base_url.clone(),
                    tts_model: tts_model.clone(),
                    analysis_model: analysis_model.clone(),
                    timeout: Duration::from_secs(*timeout_secs),
                };
                Ok(Arc::new(GeminiProvider::new(config)?))
            }
            ProviderConfig::Mock { behavior } => Ok(Arc::new(MockProvider::new(behavior.clone()))),
        }
    }
}

/// Configured key if non-blank, else the first non-blank environment variable
pub fn resolve_api_key<F>(configured: Option<&str>, env: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(key) = configured.map(str::trim).filter(|k| !k.is_empty()) {
        return Some(key.to_string());
    }
    API_KEY_ENV_VARS
        .iter()
        .filter_map(|name| env(name))
        .map(|key| key.trim().to_string())
        .find(|key| !key.is_empty())
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// The name of the currently active provider
    #[serde(default)]
    pub active_provider: Option<String>,

    /// Map of provider name to configuration
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// Voice selected at startup
    #[serde(default = "default_voice_name")]
    pub default_voice: String,

    /// Where exported narrations go; the working directory when unset
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    /// Voice library location; ~/.voxmystic/voices.json when unset
    #[serde(default)]
    pub voices_path: Option<PathBuf>,

    /// Play each narration as soon as it is rendered
    #[serde(default = "default_autoplay")]
    pub autoplay: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            active_provider: Some(DEFAULT_PROVIDER.to_string()),
            providers: HashMap::from([(
                DEFAULT_PROVIDER.to_string(),
                ProviderConfig::gemini_defaults(),
            )]),
            default_voice: default_voice_name(),
            output_dir: None,
            voices_path: None,
            autoplay: default_autoplay(),
        }
    }
}

impl Settings {
    /// Get the active provider configuration
    pub fn active_provider(&self) -> Option<&ProviderConfig> {
        let provider = self.active_provider.as_ref()?;
        self.providers.get(provider)
    }

    /// Set the active provider (returns error if provider doesn't exist)
    pub fn set_active_provider(&mut self, name: &str) -> Result<(), String> {
        if self.providers.contains_key(name) {
            self.active_provider = Some(name.to_string());
            Ok(())
        } else {
            Err(format!("Provider '{name}' not found"))
        }
    }

    /// Add or update a provider configuration
    pub fn add_provider(&mut self, name: String, config: ProviderConfig) {
        self.providers.insert(name, config);
    }

    /// List all provider names
    pub fn list_providers(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn build_provider(&self) -> Result<Arc<dyn InferenceProvider>, InferenceError> {
        let config = self.active_provider().ok_or_else(|| {
            InferenceError::Configuration(match &self.active_provider {
                Some(name) => format!("Provider '{name}' not found"),
                None => "No active provider configured".to_string(),
            })
        })?;
        config.build()
    }

    pub fn voices_path(&self) -> Result<PathBuf> {
        match &self.voices_path {
            Some(path) => Ok(path.clone()),
            None => VoiceLibrary::default_path(),
        }
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
