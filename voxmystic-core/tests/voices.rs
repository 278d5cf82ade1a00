use voxmystic_core::inference::mock::{MOCK_PERSONA, MOCK_SIGNATURE};
use voxmystic_core::inference::{MockBehavior, FALLBACK_PERSONA, FALLBACK_SIGNATURE};
use voxmystic_core::voices::{CLONE_BASE_VOICE, RESTORED_PERSONA_NAME};
use voxmystic_core::{AppStatus, VoicePersona};

mod fixture;

#[test]
fn test_clone_is_selected_and_persisted() {
    fixture::run(|mut fixture| async move {
        let sample = fixture.voice_sample();
        let clone = fixture
            .studio
            .clone_voice(sample.clone(), Some("Grandpa".to_string()))
            .await
            .unwrap();

        assert_eq!(clone.name, "Grandpa");
        assert_eq!(clone.voice_id, CLONE_BASE_VOICE);
        assert_eq!(clone.persona_instruction, MOCK_PERSONA);
        assert_eq!(clone.description, "calm, low, and measured voice");
        assert_eq!(clone.visual_signature.as_deref(), Some(MOCK_SIGNATURE));
        assert_eq!(fixture.studio.status(), AppStatus::Idle);
        assert_eq!(
            fixture.studio.selected_voice(),
            &VoicePersona::Clone(clone.clone())
        );
        assert_eq!(fixture.provider().analyzed_samples(), vec![sample]);

        fixture.reopen();
        assert_eq!(fixture.studio.library().clones(), &[clone.clone()]);

        // Narrating with the clone sends its instruction on the base voice
        fixture.studio.select_voice("grandpa").unwrap();
        fixture.studio.narrate("Back in my day.").await.unwrap();
        let request = fixture.provider().last_synthesis_request().unwrap();
        assert_eq!(request.voice_id, "Kore");
        assert_eq!(request.persona_instruction.as_deref(), Some(MOCK_PERSONA));
    });
}

#[test]
fn test_unnamed_clones_are_numbered() {
    fixture::run(|mut fixture| async move {
        let first = fixture
            .studio
            .clone_voice(fixture.voice_sample(), None)
            .await
            .unwrap();
        let second = fixture
            .studio
            .clone_voice(fixture.voice_sample(), Some("   ".to_string()))
            .await
            .unwrap();

        assert_eq!(first.name, "Neural Clone 1");
        assert_eq!(second.name, "Neural Clone 2");
        let names: Vec<_> = fixture
            .studio
            .library()
            .clones()
            .iter()
            .map(|c| c.name.clone())
            .collect();
        assert_eq!(names, vec!["Neural Clone 2", "Neural Clone 1"]);
    });
}

#[test]
fn test_partial_analysis_uses_fallbacks() {
    fixture::run_with_behavior(MockBehavior::PartialAnalysis, |mut fixture| async move {
        let clone = fixture
            .studio
            .clone_voice(fixture.voice_sample(), None)
            .await
            .unwrap();

        assert_eq!(clone.persona_instruction, FALLBACK_PERSONA);
        assert_eq!(clone.description, "natural voice");
        assert_eq!(clone.visual_signature.as_deref(), Some(FALLBACK_SIGNATURE));
    });
}

#[test]
fn test_failed_analysis_reports_fixed_message() {
    fixture::run_with_behavior(MockBehavior::AnalysisError, |mut fixture| async move {
        let result = fixture
            .studio
            .clone_voice(fixture.voice_sample(), None)
            .await;

        assert!(result.is_err());
        assert_eq!(fixture.studio.status(), AppStatus::Error);
        assert_eq!(
            fixture.studio.error_message(),
            Some(
                "Failed to capture voice signature. Ensure your sample is clear and at least 5 seconds long."
            )
        );
        assert!(fixture.studio.library().is_empty());
        assert!(!fixture.voices_path().exists());
        assert_eq!(fixture.studio.selected_voice().name(), "Julian");
    });
}

#[test]
fn test_deleting_selected_clone_resets_selection() {
    fixture::run(|mut fixture| async move {
        let keep = fixture
            .studio
            .clone_voice(fixture.voice_sample(), Some("Keep".to_string()))
            .await
            .unwrap();
        fixture.set_mock_behavior(MockBehavior::PartialAnalysis);
        fixture
            .studio
            .clone_voice(fixture.voice_sample(), Some("Drop".to_string()))
            .await
            .unwrap();
        assert_eq!(fixture.studio.selected_voice().name(), "Drop");

        let removed = fixture.studio.delete_voice("drop").unwrap();
        assert_eq!(removed.name, "Drop");
        assert_eq!(fixture.studio.selected_voice().name(), "Julian");

        // Deleting an unselected clone leaves the selection alone
        fixture.studio.select_voice("Zephyr").unwrap();
        fixture.studio.delete_voice(&keep.id).unwrap();
        assert_eq!(fixture.studio.selected_voice().name(), "Zephyr");

        fixture.reopen();
        assert!(fixture.studio.library().is_empty());
    });
}

#[test]
fn test_corrupt_library_is_treated_as_empty() {
    fixture::run(|mut fixture| async move {
        let path = fixture.voices_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "[{\"id\": 1").unwrap();

        fixture.reopen();
        assert!(fixture.studio.library().is_empty());

        let mut backup = path.clone().into_os_string();
        backup.push(".backup");
        assert!(std::path::Path::new(&backup).exists());

        // The library is usable again and rewritten in full
        fixture
            .studio
            .clone_voice(fixture.voice_sample(), None)
            .await
            .unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 1);
    });
}

#[test]
fn test_restore_preset_narration() {
    fixture::run(|mut fixture| async move {
        fixture.studio.select_voice("Puck").unwrap();
        fixture.studio.narrate("A mischievous line.").await.unwrap();
        let id = fixture.studio.history().latest().unwrap().id.clone();

        fixture.studio.select_voice("Charon").unwrap();
        fixture.studio.set_draft("something else");

        let voice = fixture.studio.restore(&id).unwrap().clone();
        assert_eq!(voice.name(), "Puck");
        assert_eq!(fixture.studio.draft(), "A mischievous line.");

        // A preset carrying its own instruction comes back as itself
        fixture.studio.select_voice("Orion").unwrap();
        fixture.studio.narrate("To the stars.").await.unwrap();
        let id = fixture.studio.history().latest().unwrap().id.clone();
        fixture.studio.select_voice("Kore").unwrap();
        assert_eq!(fixture.studio.restore(&id).unwrap().name(), "Orion");
    });
}

#[test]
fn test_restore_clone_narration() {
    fixture::run(|mut fixture| async move {
        let clone = fixture
            .studio
            .clone_voice(fixture.voice_sample(), Some("Echo".to_string()))
            .await
            .unwrap();
        fixture.studio.narrate("Hello again.").await.unwrap();
        let id = fixture.studio.history().latest().unwrap().id.clone();

        fixture.studio.select_voice("Aoede").unwrap();
        let restored = fixture.studio.restore(&id).unwrap().clone();
        assert_eq!(restored, VoicePersona::Clone(clone.clone()));

        // Once the clone is gone, the persona is rebuilt from the record
        // and saved so it can be selected again later
        fixture.studio.delete_voice("Echo").unwrap();
        let rebuilt = fixture.studio.restore(&id).unwrap().clone();
        assert_eq!(rebuilt.name(), RESTORED_PERSONA_NAME);
        assert_eq!(rebuilt.voice_id(), "Kore");
        assert_eq!(rebuilt.persona_instruction(), Some(MOCK_PERSONA));
        assert_eq!(fixture.studio.library().len(), 1);

        // Restoring again reuses the saved persona instead of adding another
        fixture.studio.restore(&id).unwrap();
        assert_eq!(fixture.studio.library().len(), 1);

        fixture.reopen();
        let VoicePersona::Clone(saved) = &rebuilt else {
            panic!("restored persona should be a clone");
        };
        assert_eq!(fixture.studio.library().clones(), std::slice::from_ref(saved));
        fixture.studio.select_voice(RESTORED_PERSONA_NAME).unwrap();
        fixture.studio.delete_voice(RESTORED_PERSONA_NAME).unwrap();
        assert!(fixture.studio.library().is_empty());
    });
}

#[test]
fn test_deleting_a_clone_removes_clones_sharing_its_persona() {
    fixture::run(|mut fixture| async move {
        let first = fixture
            .studio
            .clone_voice(fixture.voice_sample(), Some("Twin A".to_string()))
            .await
            .unwrap();
        fixture
            .studio
            .clone_voice(fixture.voice_sample(), Some("Twin B".to_string()))
            .await
            .unwrap();
        fixture.set_mock_behavior(MockBehavior::PartialAnalysis);
        fixture
            .studio
            .clone_voice(fixture.voice_sample(), Some("Loner".to_string()))
            .await
            .unwrap();
        fixture.studio.select_voice("Twin B").unwrap();

        let removed = fixture.studio.delete_voice(&first.id).unwrap();
        assert_eq!(removed.name, "Twin A");
        assert_eq!(fixture.studio.selected_voice().name(), "Julian");

        fixture.reopen();
        let names: Vec<_> = fixture
            .studio
            .library()
            .clones()
            .iter()
            .map(|c| c.name.clone())
            .collect();
        assert_eq!(names, vec!["Loner"]);
    });
}

#[test]
fn test_restore_unknown_record() {
    fixture::run(|mut fixture| async move {
        assert!(fixture.studio.restore("missing").is_err());
        assert_eq!(fixture.studio.status(), AppStatus::Error);
    });
}
