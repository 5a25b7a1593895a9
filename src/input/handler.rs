//! Console input handler
//!
//! Turns each line typed at the console into editor text or a command run
//! against the application state.

use super::commands::{parse_line, CommandAction, Input, HELP};
use crate::state::settings::{Voice, MAX_PITCH, MAX_SPEED, MIN_SPEED};
use crate::state::State;
use crate::Result;
use log::debug;

/// Action to take after processing a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerAction {
    /// Line was handled, keep reading
    Handled,
    /// Leave the program
    Quit,
}

/// Default handler for console lines
#[derive(Debug, Default)]
pub struct CommandHandler;

impl CommandHandler {
    pub fn new() -> Self {
        Self
    }

    /// Process one line of input
    pub fn process(&mut self, line: &str, state: &mut State) -> Result<HandlerAction> {
        match parse_line(line) {
            Input::Text(text) => {
                state.document.push_line(&text);
                Ok(HandlerAction::Handled)
            }
            Input::Unknown(name) => {
                state.set_status(format!("Unknown command :{}  —  :help lists commands", name));
                Ok(HandlerAction::Handled)
            }
            Input::Command(action, arg) => {
                debug!("Command {:?} {:?}", action, arg);
                self.run(action, &arg, state)
            }
        }
    }

    fn run(&mut self, action: CommandAction, arg: &str, state: &mut State) -> Result<HandlerAction> {
        match action {
            CommandAction::Speak => state.speak(),
            CommandAction::TogglePause => state.toggle_pause(),
            CommandAction::Stop => state.stop(),
            CommandAction::Clear => {
                state.document.clear();
                state.set_status("Cleared");
            }
            CommandAction::Paste => match state.document.paste_clipboard() {
                Ok(n) => state.set_status(format!("Pasted {} chars", n)),
                Err(e) => state.set_status(format!("Paste failed: {}", e)),
            },
            CommandAction::Load => {
                if arg.is_empty() {
                    state.set_status("Usage: :load PATH...");
                } else {
                    state.load_files(arg);
                }
            }
            CommandAction::Speed => match arg.parse::<i64>() {
                Ok(wpm) => state.set_speed(wpm),
                Err(_) => state.set_status(format!(
                    "Usage: :speed {}-{}  (now {} wpm)",
                    MIN_SPEED,
                    MAX_SPEED,
                    state.settings().speed
                )),
            },
            CommandAction::Pitch => match arg.parse::<i64>() {
                Ok(pitch) => state.set_pitch(pitch),
                Err(_) => state.set_status(format!(
                    "Usage: :pitch 0-{}  (now {})",
                    MAX_PITCH,
                    state.settings().pitch
                )),
            },
            CommandAction::Voice => match Voice::parse(arg) {
                Some(voice) => state.set_voice(voice),
                None => state.set_status(format!(
                    "Usage: :voice zira|david  (now {})",
                    state.settings().voice
                )),
            },
            CommandAction::Show => {
                let text = if state.document.is_empty() {
                    "(empty)".to_string()
                } else {
                    state.document.text().to_string()
                };
                state.print(text);
            }
            CommandAction::Status => {
                let summary = state.summary();
                state.print(summary);
            }
            CommandAction::Help => state.print(HELP),
            CommandAction::Quit => {
                state.stop();
                return Ok(HandlerAction::Quit);
            }
        }

        Ok(HandlerAction::Handled)
    }
}
