pub mod config;
pub mod manager;

#[cfg(test)]
mod tests;

pub use config::{resolve_api_key, ProviderConfig, Settings, API_KEY_ENV_VARS};
pub use manager::SettingsManager;
