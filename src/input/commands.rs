//! Console command bindings
//!
//! Lines starting with `:` are commands; anything else is text for the
//! editor. Each command name (and its short alias) maps to an action.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Prefix that marks a line as a command
pub const COMMAND_PREFIX: char = ':';

/// Action identifier for command bindings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandAction {
    Speak,
    TogglePause,
    Stop,
    Clear,
    Paste,
    Load,
    Speed,
    Pitch,
    Voice,
    Show,
    Status,
    Help,
    Quit,
}

/// One line of console input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Text to add to the editor
    Text(String),
    /// A command with its (possibly empty) argument
    Command(CommandAction, String),
    /// A `:word` that isn't a command
    Unknown(String),
}

static COMMANDS: Lazy<HashMap<&'static str, CommandAction>> = Lazy::new(create_default_commands);

/// Create the default command table
pub fn create_default_commands() -> HashMap<&'static str, CommandAction> {
    let mut map = HashMap::new();

    // Playback
    map.insert("speak", CommandAction::Speak);
    map.insert("s", CommandAction::Speak);
    map.insert("pause", CommandAction::TogglePause);
    map.insert("resume", CommandAction::TogglePause);
    map.insert("p", CommandAction::TogglePause);
    map.insert("stop", CommandAction::Stop);
    map.insert("x", CommandAction::Stop);

    // Editor
    map.insert("clear", CommandAction::Clear);
    map.insert("c", CommandAction::Clear);
    map.insert("paste", CommandAction::Paste);
    map.insert("v", CommandAction::Paste);
    map.insert("load", CommandAction::Load);
    map.insert("open", CommandAction::Load);
    map.insert("show", CommandAction::Show);

    // Settings
    map.insert("speed", CommandAction::Speed);
    map.insert("rate", CommandAction::Speed);
    map.insert("pitch", CommandAction::Pitch);
    map.insert("voice", CommandAction::Voice);

    // Misc
    map.insert("status", CommandAction::Status);
    map.insert("help", CommandAction::Help);
    map.insert("h", CommandAction::Help);
    map.insert("quit", CommandAction::Quit);
    map.insert("q", CommandAction::Quit);
    map.insert("exit", CommandAction::Quit);

    map
}

/// Classify a line of console input
///
/// `::text` escapes a line of text that starts with a colon.
pub fn parse_line(line: &str) -> Input {
    let trimmed = line.trim_end_matches(['\r', '\n']);

    let Some(rest) = trimmed.trim_start().strip_prefix(COMMAND_PREFIX) else {
        return Input::Text(trimmed.to_string());
    };
    if let Some(escaped) = rest.strip_prefix(COMMAND_PREFIX) {
        return Input::Text(format!("{}{}", COMMAND_PREFIX, escaped));
    }

    let rest = rest.trim();
    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    match COMMANDS.get(name.to_lowercase().as_str()) {
        Some(action) => Input::Command(*action, arg.to_string()),
        None => Input::Unknown(name.to_string()),
    }
}

/// Usage text for `:help`
pub const HELP: &str = "\
Type or paste text, then:
  :speak  (:s)          read the text aloud
  :pause  (:p)          pause / resume
  :stop   (:x)          stop immediately
  :clear  (:c)          clear the text
  :paste  (:v)          paste from the clipboard
  :load PATH...         replace the text with file contents
  :speed 80-300         words per minute
  :pitch 0-100          voice pitch
  :voice zira|david     female or male voice
  :show                 print the current text
  :status               show backend and settings
  :quit   (:q)          exit
Start a text line with '::' to type a literal ':'.";
