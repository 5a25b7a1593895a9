//! Console input handling
//!
//! Every line read from the console is either text for the editor or a
//! `:command` bound in the command table.

pub mod commands;
pub mod handler;

pub use commands::{create_default_commands, parse_line, CommandAction, Input};
pub use handler::{CommandHandler, HandlerAction};
