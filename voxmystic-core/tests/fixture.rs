use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;
use voxmystic_core::{
    capture::CapturedAudio,
    inference::{MockBehavior, MockProvider},
    settings::{ProviderConfig, Settings, SettingsManager},
    Studio, VoiceLibrary,
};

pub struct Fixture {
    pub studio: Studio,
    pub workspace_dir: TempDir,
    mock_provider: MockProvider,
}

impl Fixture {
    #[allow(dead_code)]
    pub fn new() -> Self {
        Self::with_mock_behavior(MockBehavior::Success)
    }

    pub fn with_mock_behavior(behavior: MockBehavior) -> Self {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let workspace_dir = TempDir::new().unwrap();

        // Isolated settings so the user's real ~/.voxmystic is never touched
        let settings_path = workspace_dir.path().join(".voxmystic").join("settings.toml");
        let mut settings_manager = SettingsManager::from_path(settings_path).unwrap();

        let mut settings = Settings::default();
        settings.add_provider(
            "mock".to_string(),
            ProviderConfig::Mock {
                behavior: behavior.clone(),
            },
        );
        settings.active_provider = Some("mock".to_string());
        settings.voices_path = Some(workspace_dir.path().join(".voxmystic").join("voices.json"));
        settings.output_dir = Some(workspace_dir.path().join("out"));
        settings_manager.store(settings).unwrap();

        // Clones share the same internal state, so the test can inspect
        // requests the studio made
        let mock_provider = MockProvider::new(behavior);
        let studio = Self::open_studio(settings_manager.settings(), mock_provider.clone());

        Fixture {
            studio,
            workspace_dir,
            mock_provider,
        }
    }

    fn open_studio(settings: &Settings, provider: MockProvider) -> Studio {
        let library = VoiceLibrary::load(settings.voices_path().unwrap()).unwrap();
        Studio::new(Arc::new(provider), library)
    }

    /// Simulate an application restart against the same workspace
    #[allow(dead_code)]
    pub fn reopen(&mut self) {
        let settings = self.settings();
        self.studio = Self::open_studio(&settings, self.mock_provider.clone());
    }

    #[allow(dead_code)]
    pub fn settings(&self) -> Settings {
        SettingsManager::from_path(self.settings_path())
            .unwrap()
            .settings()
            .clone()
    }

    #[allow(dead_code)]
    pub fn settings_path(&self) -> PathBuf {
        self.workspace_dir
            .path()
            .join(".voxmystic")
            .join("settings.toml")
    }

    #[allow(dead_code)]
    pub fn voices_path(&self) -> PathBuf {
        self.settings().voices_path().unwrap()
    }

    #[allow(dead_code)]
    pub fn output_dir(&self) -> PathBuf {
        self.settings().output_dir()
    }

    #[allow(dead_code)]
    pub fn set_mock_behavior(&self, behavior: MockBehavior) {
        self.mock_provider.set_behavior(behavior);
    }

    #[allow(dead_code)]
    pub fn provider(&self) -> &MockProvider {
        &self.mock_provider
    }

    #[allow(dead_code)]
    pub fn voice_sample(&self) -> CapturedAudio {
        CapturedAudio::new(vec![0x1a, 0x45, 0xdf, 0xa3, 0, 0, 0, 0], "audio/webm")
    }
}

#[allow(dead_code)]
pub fn run<F, Fut>(test_fn: F)
where
    F: FnOnce(Fixture) -> Fut,
    Fut: std::future::Future<Output = ()>,
{
    run_with_behavior(MockBehavior::Success, test_fn)
}

#[allow(dead_code)]
pub fn run_with_behavior<F, Fut>(behavior: MockBehavior, test_fn: F)
where
    F: FnOnce(Fixture) -> Fut,
    Fut: std::future::Future<Output = ()>,
{
    use tokio::time::{timeout, Duration};

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to create tokio runtime");

    let local = tokio::task::LocalSet::new();

    runtime.block_on(local.run_until(async {
        let fixture = Fixture::with_mock_behavior(behavior);
        let test_future = test_fn(fixture);
        timeout(Duration::from_secs(30), test_future)
            .await
            .expect("Test timed out after 30 seconds");
    }));
}
