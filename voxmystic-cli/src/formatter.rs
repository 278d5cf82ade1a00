use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use voxmystic_core::history::NarrationRecord;
use voxmystic_core::studio::Studio;
use voxmystic_core::VoicePersona;

#[derive(Clone)]
pub struct Formatter {
    use_colors: bool,
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new()
    }
}

impl Formatter {
    pub fn new() -> Self {
        Self { use_colors: true }
    }

    pub fn print_system(&self, msg: &str) {
        if self.use_colors {
            println!("\x1b[33m[System]\x1b[0m {msg}");
        } else {
            println!("[System] {msg}");
        }
    }

    pub fn print_error(&self, msg: &str) {
        if self.use_colors {
            eprintln!("\x1b[31m[Error]\x1b[0m {msg}");
        } else {
            eprintln!("[Error] {msg}");
        }
    }

    pub fn prompt(&self) -> String {
        if self.use_colors {
            "\x1b[35m>\x1b[0m ".to_string()
        } else {
            "> ".to_string()
        }
    }

    pub fn print_narration(&self, record: &NarrationRecord) {
        let seconds = record.audio.duration().as_secs_f32();
        if self.use_colors {
            println!(
                "\x1b[32m[{}]\x1b[0m \x1b[90m{} · {seconds:.1}s\x1b[0m {}",
                record.voice_name, record.id, record.text
            );
        } else {
            println!(
                "[{}] {} · {seconds:.1}s {}",
                record.voice_name, record.id, record.text
            );
        }
    }

    pub fn voice_line(&self, voice: &VoicePersona, selected: bool) -> String {
        let marker = if selected { "*" } else { " " };
        let kind = if voice.is_clone() { "clone" } else { "preset" };
        if self.use_colors && selected {
            format!(
                "{marker} \x1b[1;36m{:<16}\x1b[0m \x1b[90m{kind:<6}\x1b[0m {}",
                voice.name(),
                voice.description()
            )
        } else {
            format!(
                "{marker} {:<16} {kind:<6} {}",
                voice.name(),
                voice.description()
            )
        }
    }

    pub fn voices_listing(&self, studio: &Studio) -> String {
        let selected = studio.selected_voice();
        let is_selected = |voice: &VoicePersona| {
            voice.name() == selected.name()
                && voice.persona_instruction() == selected.persona_instruction()
        };

        let mut lines = vec!["Voices:".to_string()];
        for voice in &studio.voices() {
            lines.push(self.voice_line(voice, is_selected(voice)));
        }
        lines.join("\n")
    }

    pub fn history_listing(&self, studio: &Studio) -> String {
        if studio.history().is_empty() {
            return "No narrations yet".to_string();
        }
        let mut lines = vec!["History (newest first):".to_string()];
        for record in studio.history().records() {
            let local = record.timestamp.with_timezone(&chrono::Local);
            lines.push(format!(
                "  {}  {}  {:<16} {}",
                record.id,
                local.format("%H:%M:%S"),
                record.voice_name,
                preview(&record.text, 48)
            ));
        }
        lines.join("\n")
    }

    pub fn status_report(&self, studio: &Studio) -> String {
        let mut lines = vec![
            format!("Status: {}", studio.status()),
            format!("Voice: {}", studio.selected_voice().name()),
            format!("Provider: {}", studio.provider_name()),
            format!("Narrations: {}", studio.history().len()),
        ];
        if let Some(audio) = studio.current_audio() {
            lines.push(format!(
                "Current audio: {:.1}s",
                audio.duration().as_secs_f32()
            ));
        }
        if !studio.draft().is_empty() {
            lines.push(format!("Draft: {}", preview(studio.draft(), 60)));
        }
        if let Some(error) = studio.error_message() {
            lines.push(format!("Last error: {error}"));
        }
        lines.join("\n")
    }

    /// Spinner shown while waiting on the model
    pub fn spinner(&self, msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.magenta} {msg} [{elapsed}]") {
            pb.set_style(style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }
}

/// First `max` characters of `text` on a single line
pub fn preview(text: &str, max: usize) -> String {
    let flat = text.replace(['\r', '\n'], " ");
    if flat.chars().count() > max {
        let truncated: String = flat.chars().take(max).collect();
        format!("{truncated}...")
    } else {
        flat
    }
}
