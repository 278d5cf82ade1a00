use crate::inference::{InferenceError, MockBehavior};
use crate::settings::manager::SettingsManager;
use crate::settings::{resolve_api_key, ProviderConfig, Settings};
use std::collections::HashMap;
use tempfile::TempDir;

fn env_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name| vars.get(name).cloned()
}

#[test]
fn test_missing_settings_file_is_created_with_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let settings_path = temp_dir.path().join("nested").join("settings.toml");

    let manager = SettingsManager::from_path(settings_path.clone()).unwrap();

    assert!(settings_path.exists());
    let settings = manager.settings();
    assert_eq!(settings.active_provider.as_deref(), Some("gemini"));
    assert_eq!(settings.default_voice, "Julian");
    assert!(settings.autoplay);
    assert_eq!(
        settings.active_provider(),
        Some(&ProviderConfig::gemini_defaults())
    );
}

#[test]
fn test_corrupted_settings_are_backed_up() {
    let temp_dir = TempDir::new().unwrap();
    let settings_path = temp_dir.path().join("settings.toml");
    std::fs::write(&settings_path, "active_provider = [unterminated").unwrap();

    let manager = SettingsManager::from_path(settings_path.clone()).unwrap();

    let backup_path = temp_dir.path().join("settings.toml.backup");
    assert_eq!(
        std::fs::read_to_string(backup_path).unwrap(),
        "active_provider = [unterminated"
    );
    assert_eq!(manager.settings().default_voice, "Julian");
    let rewritten: Settings =
        toml::from_str(&std::fs::read_to_string(&settings_path).unwrap()).unwrap();
    assert_eq!(rewritten.default_voice, "Julian");
}

#[test]
fn test_settings_round_trip_through_save() {
    let temp_dir = TempDir::new().unwrap();
    let settings_path = temp_dir.path().join("settings.toml");

    let mut manager = SettingsManager::from_path(settings_path.clone()).unwrap();
    let settings = manager.settings_mut();
    settings.default_voice = "Puck".to_string();
    settings.autoplay = false;
    settings.add_provider(
        "offline".to_string(),
        ProviderConfig::Mock {
            behavior: MockBehavior::NoAudio,
        },
    );
    settings.set_active_provider("offline").unwrap();

    // Nothing reaches disk until saved
    let on_disk = SettingsManager::from_path(settings_path.clone()).unwrap();
    assert_eq!(on_disk.settings().default_voice, "Julian");

    manager.save().unwrap();

    let reloaded = SettingsManager::from_path(settings_path)
        .unwrap()
        .settings()
        .clone();
    assert_eq!(reloaded.default_voice, "Puck");
    assert!(!reloaded.autoplay);
    assert_eq!(reloaded.list_providers(), vec!["gemini", "offline"]);
    assert_eq!(
        reloaded.active_provider(),
        Some(&ProviderConfig::Mock {
            behavior: MockBehavior::NoAudio
        })
    );
}

#[test]
fn test_unknown_settings_ignored() {
    let temp_dir = TempDir::new().unwrap();
    let settings_path = temp_dir.path().join("settings.toml");

    let toml_content = r#"
default_voice = "Zephyr"
unknown_field = "this should be ignored"

[providers.local]
type = "mock"

[unknown_section]
foo = "bar"
    "#;

    std::fs::write(&settings_path, toml_content).unwrap();

    let manager = SettingsManager::from_path(settings_path).unwrap();
    let settings = manager.settings();

    assert_eq!(settings.default_voice, "Zephyr");
    assert_eq!(settings.active_provider, None);
    assert_eq!(
        settings.providers.get("local"),
        Some(&ProviderConfig::Mock {
            behavior: MockBehavior::Success
        })
    );
}

#[test]
fn test_gemini_fields_default_when_omitted() {
    let settings: Settings = toml::from_str(
        r#"
active_provider = "g"

[providers.g]
type = "gemini"
api_key = "abc"
timeout_secs = 5
"#,
    )
    .unwrap();

    match settings.active_provider().unwrap() {
        ProviderConfig::Gemini {
            api_key,
            tts_model,
            timeout_secs,
            ..
        } => {
            assert_eq!(api_key.as_deref(), Some("abc"));
            assert_eq!(tts_model, "gemini-2.5-flash-preview-tts");
            assert_eq!(*timeout_secs, 5);
        }
        other => panic!("unexpected provider {other:?}"),
    }
}

#[test]
fn test_api_key_resolution_order() {
    let both = env_from(&[("GEMINI_API_KEY", "from-gemini"), ("API_KEY", "from-generic")]);
    let generic = env_from(&[("API_KEY", "from-generic")]);
    let blank = env_from(&[("GEMINI_API_KEY", "  "), ("API_KEY", "from-generic")]);
    let none = env_from(&[]);

    assert_eq!(
        resolve_api_key(Some("configured"), &both).as_deref(),
        Some("configured")
    );
    assert_eq!(
        resolve_api_key(None, &both).as_deref(),
        Some("from-gemini")
    );
    assert_eq!(
        resolve_api_key(Some(""), &generic).as_deref(),
        Some("from-generic")
    );
    assert_eq!(
        resolve_api_key(None, &blank).as_deref(),
        Some("from-generic")
    );
    assert_eq!(resolve_api_key(None, &none), None);
}

#[test]
fn test_gemini_without_key_is_configuration_error() {
    let result = ProviderConfig::gemini_defaults().build_with_env(env_from(&[]));
    assert!(matches!(result, Err(InferenceError::Configuration(_))));

    let provider = ProviderConfig::gemini_defaults()
        .build_with_env(env_from(&[("API_KEY", "k")]))
        .unwrap();
    assert_eq!(provider.name(), "gemini");
}

#[test]
fn test_missing_active_provider_is_reported() {
    let mut settings = Settings::default();
    settings.active_provider = Some("missing".to_string());
    assert!(matches!(
        settings.build_provider(),
        Err(InferenceError::Configuration(msg)) if msg.contains("missing")
    ));
}
