//! Clipboard integration

use crate::{Result, WspeechError};
use arboard::Clipboard;
use log::debug;

/// Get text from system clipboard
///
/// Backs the Paste command of the editor.
pub fn get_from_clipboard() -> Result<String> {
    debug!("Getting text from clipboard");

    let mut clipboard = Clipboard::new()
        .map_err(|e| WspeechError::Clipboard(format!("Failed to open clipboard: {}", e)))?;

    clipboard
        .get_text()
        .map_err(|e| WspeechError::Clipboard(format!("Failed to get from clipboard: {}", e)))
}
