use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use voxmystic_core::capture::CaptureError;
use voxmystic_core::{CapturedAudio, Settings, Studio, StudioError};

use crate::commands::{handle_local_command, parse_action, Action, LocalCommandResult};
use crate::formatter::{preview, Formatter};

pub struct InteractiveApp {
    studio: Studio,
    settings: Settings,
    formatter: Formatter,
}

impl InteractiveApp {
    pub fn new(studio: Studio, settings: Settings) -> Self {
        let formatter = Formatter::new();
        formatter.print_system(&format!(
            "Narrating as {} via {}. Type /help for commands, /quit to exit",
            studio.selected_voice().name(),
            studio.provider_name()
        ));

        Self {
            studio,
            settings,
            formatter,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut rl = DefaultEditor::new()?;

        loop {
            let line = match rl.readline(&self.formatter.prompt()) {
                Ok(line) => line,
                Err(err) => match err {
                    ReadlineError::Interrupted => {
                        continue;
                    }
                    _ => break,
                },
            };

            let input = line.trim();
            if input.is_empty() {
                continue;
            }

            match handle_local_command(&self.studio, &self.formatter, input) {
                LocalCommandResult::Handled { msg } => {
                    self.formatter.print_system(&msg);
                    continue;
                }
                LocalCommandResult::Exit => break,
                LocalCommandResult::Unhandled => (),
            }

            rl.add_history_entry(&line)?;
            match parse_action(input) {
                Ok(action) => self.execute(action).await,
                Err(msg) => self.formatter.print_error(&msg),
            }
        }

        println!("\nGoodbye!");
        Ok(())
    }

    async fn execute(&mut self, action: Action) {
        tracing::debug!(?action, "executing");
        match action {
            Action::Narrate(text) => self.narrate(text).await,
            Action::Use(name) => match self.studio.select_voice(&name) {
                Ok(voice) => {
                    let msg = format!("Voice: {} ({})", voice.name(), voice.description());
                    self.formatter.print_system(&msg);
                }
                Err(e) => self.report(e),
            },
            Action::Clone { path, name } => match CapturedAudio::from_file(&path).await {
                Ok(sample) => self.clone_sample(sample, name).await,
                Err(e) => {
                    let e = self.studio.fail(e.into());
                    self.report(e);
                }
            },
            Action::Record { name } => self.record(name).await,
            Action::Delete(name) => match self.studio.delete_voice(&name) {
                Ok(removed) => {
                    let msg = format!(
                        "Deleted {}. Voice: {}",
                        removed.name,
                        self.studio.selected_voice().name()
                    );
                    self.formatter.print_system(&msg);
                }
                Err(e) => self.report(e),
            },
            Action::Play(id) => self.play(id.as_deref()).await,
            Action::Save { id, dir } => {
                let dir = dir.unwrap_or_else(|| self.settings.output_dir());
                match self.studio.export(Some(&id), &dir) {
                    Ok(path) => self
                        .formatter
                        .print_system(&format!("Saved {}", path.display())),
                    Err(e) => self.report(e),
                }
            }
            Action::Restore(id) => match self.studio.restore(&id) {
                Ok(voice) => {
                    let name = voice.name().to_string();
                    let msg = format!(
                        "Restored {name} with \"{}\". Use /narrate to render it again",
                        preview(self.studio.draft(), 48)
                    );
                    self.formatter.print_system(&msg);
                }
                Err(e) => self.report(e),
            },
            Action::Clear => {
                self.studio.clear_history();
                self.formatter.print_system("History cleared");
            }
        }
    }

    async fn narrate(&mut self, text: Option<String>) {
        let text = match text {
            Some(text) => {
                self.studio.set_draft(text.clone());
                text
            }
            None => self.studio.draft().to_string(),
        };
        if text.trim().is_empty() {
            self.formatter.print_system("Nothing to narrate");
            return;
        }

        let spinner = self.formatter.spinner(&format!(
            "{} is narrating...",
            self.studio.selected_voice().name()
        ));
        let result = self.studio.narrate(&text).await;
        spinner.finish_and_clear();

        let rendered = match result {
            Ok(Some(record)) => {
                self.formatter.print_narration(record);
                true
            }
            Ok(None) => false,
            Err(e) => {
                self.report(e);
                false
            }
        };

        if rendered && self.settings.autoplay {
            self.play(None).await;
        }
    }

    async fn clone_sample(&mut self, sample: CapturedAudio, name: Option<String>) {
        let spinner = self.formatter.spinner("Analyzing voice sample...");
        let result = self.studio.clone_voice(sample, name).await;
        spinner.finish_and_clear();

        match result {
            Ok(clone) => {
                let mut msg = format!("Cloned {}: {}", clone.name, clone.description);
                if let Some(signature) = &clone.visual_signature {
                    msg.push_str(&format!("\n  Signature: {signature}"));
                }
                self.formatter.print_system(&msg);
            }
            Err(e) => self.report(e),
        }
    }

    #[cfg(feature = "devices")]
    async fn record(&mut self, name: Option<String>) {
        use std::time::Duration;
        use voxmystic_core::capture::microphone::Microphone;
        use voxmystic_core::capture::{level_bar, LevelMeter, RecordingSession};

        self.studio.begin_recording();
        let stream = match Microphone::open().and_then(Microphone::start) {
            Ok(stream) => stream,
            Err(e) => {
                let e = self.studio.fail(e.into());
                self.report(e);
                return;
            }
        };

        let session = RecordingSession::new(stream);
        let bar = self.formatter.spinner("Recording, press Enter to stop");
        let meter = LevelMeter::spawn(session.levels(), Duration::from_millis(80), {
            let bar = bar.clone();
            move |frame| {
                bar.set_message(format!(
                    "Recording [{}] press Enter to stop",
                    level_bar(frame, 24)
                ))
            }
        });

        let result = session.record_until(wait_for_enter()).await;
        drop(meter);
        bar.finish_and_clear();

        match result {
            Ok(sample) => self.clone_sample(sample, name).await,
            Err(e) => {
                let e = self.studio.fail(e.into());
                self.report(e);
            }
        }
    }

    #[cfg(not(feature = "devices"))]
    async fn record(&mut self, _name: Option<String>) {
        let e = self.studio.fail(
            CaptureError::PermissionDenied {
                reason: "built without audio device support".into(),
            }
            .into(),
        );
        self.report(e);
        self.formatter
            .print_system("Use /clone <file> to clone from a recording instead");
    }

    #[cfg(feature = "devices")]
    async fn play(&mut self, id: Option<&str>) {
        use voxmystic_core::capture::playback::AudioPlayer;

        let audio = match self.studio.begin_playback(id) {
            Ok(audio) => audio,
            Err(e) => return self.report(e),
        };

        match AudioPlayer::new().and_then(|player| player.play(&audio)) {
            Ok(playback) => {
                tokio::select! {
                    _ = playback.wait() => {}
                    _ = tokio::signal::ctrl_c() => {
                        self.formatter.print_system("Playback stopped");
                    }
                }
                self.studio.finish_playback();
            }
            Err(e) => {
                let e = self
                    .studio
                    .fail(CaptureError::Device(format!("{e:#}")).into());
                self.report(e);
            }
        }
    }

    #[cfg(not(feature = "devices"))]
    async fn play(&mut self, id: Option<&str>) {
        let audio = match self.studio.begin_playback(id) {
            Ok(audio) => audio,
            Err(e) => return self.report(e),
        };
        self.formatter.print_system(&format!(
            "{:.1}s of audio ready. This build has no speaker output, use /save to write it to disk",
            audio.duration().as_secs_f32()
        ));
        self.studio.finish_playback();
    }

    fn report(&self, error: StudioError) {
        self.formatter.print_error(&error.to_string());
    }
}

#[cfg(feature = "devices")]
async fn wait_for_enter() {
    let read = tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        std::io::stdin().read_line(&mut line)
    });
    if let Err(e) = read.await {
        tracing::warn!("stdin reader failed: {e}");
    }
}
