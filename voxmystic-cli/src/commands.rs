use std::path::PathBuf;

use voxmystic_core::Studio;

use crate::formatter::Formatter;

pub const HELP_TEXT: &str = "\
Type any text to narrate it with the selected voice.

  /voices                 list presets and saved clones
  /use <voice>            select a voice by name
  /narrate [text]         narrate text, or the current draft
  /clone <file> [name]    clone a voice from an audio file
  /record [name]          record a sample from the microphone and clone it
  /delete <voice>         delete a saved clone
  /history                list this session's narrations
  /play [id]              play a narration (latest by default)
  /save <id> [dir]        write a narration as voxmystic-<id>.wav
  /restore <id>           bring back a narration's text and voice
  /clear                  clear the history
  /status                 show studio status
  /help                   show this help
  /quit                   exit";

pub enum LocalCommandResult {
    Handled {
        msg: String,
    },

    /// A command to exit the app was detected
    Exit,

    /// The command was not processed locally (and should be run against the studio).
    Unhandled,
}

/// Read-only commands answered straight from studio state
pub fn handle_local_command(
    studio: &Studio,
    formatter: &Formatter,
    input: &str,
) -> LocalCommandResult {
    match input.trim() {
        "/help" => LocalCommandResult::Handled {
            msg: HELP_TEXT.to_string(),
        },
        "/voices" => LocalCommandResult::Handled {
            msg: formatter.voices_listing(studio),
        },
        "/history" => LocalCommandResult::Handled {
            msg: formatter.history_listing(studio),
        },
        "/status" => LocalCommandResult::Handled {
            msg: formatter.status_report(studio),
        },
        "/exit" | "/quit" => LocalCommandResult::Exit,
        _ => LocalCommandResult::Unhandled,
    }
}

/// Commands that change studio state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Narrate(Option<String>),
    Use(String),
    Clone { path: PathBuf, name: Option<String> },
    Record { name: Option<String> },
    Delete(String),
    Play(Option<String>),
    Save { id: String, dir: Option<PathBuf> },
    Restore(String),
    Clear,
}

/// Parse a line of input. Lines that are not commands narrate their text.
pub fn parse_action(input: &str) -> Result<Action, String> {
    let input = input.trim();
    let Some(command) = input.strip_prefix('/') else {
        return Ok(Action::Narrate(Some(input.to_string())));
    };

    let (name, rest) = match command.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (command, ""),
    };
    let rest = (!rest.is_empty()).then(|| rest.to_string());

    match name {
        "narrate" => Ok(Action::Narrate(rest)),
        "use" => rest.map(Action::Use).ok_or_else(|| usage("/use <voice>")),
        "clone" => {
            let rest = rest.ok_or_else(|| usage("/clone <file> [name]"))?;
            let (path, name) = split_first(&rest);
            Ok(Action::Clone {
                path: PathBuf::from(path),
                name,
            })
        }
        "record" => Ok(Action::Record { name: rest }),
        "delete" => rest.map(Action::Delete).ok_or_else(|| usage("/delete <voice>")),
        "play" => Ok(Action::Play(rest)),
        "save" => {
            let rest = rest.ok_or_else(|| usage("/save <id> [dir]"))?;
            let (id, dir) = split_first(&rest);
            Ok(Action::Save {
                id,
                dir: dir.map(PathBuf::from),
            })
        }
        "restore" => rest
            .map(Action::Restore)
            .ok_or_else(|| usage("/restore <id>")),
        "clear" => Ok(Action::Clear),
        other => Err(format!("Unknown command: /{other}. Type /help for commands")),
    }
}

fn usage(form: &str) -> String {
    format!("Usage: {form}")
}

/// Split off the first whitespace separated word, returning the remainder
fn split_first(input: &str) -> (String, Option<String>) {
    match input.split_once(char::is_whitespace) {
        Some((first, rest)) => {
            let rest = rest.trim();
            (
                first.to_string(),
                (!rest.is_empty()).then(|| rest.to_string()),
            )
        }
        None => (input.to_string(), None),
    }
}
