//! Error types for wspeech

use std::io;
use thiserror::Error;

/// Main error type for wspeech
#[derive(Error, Debug)]
pub enum WspeechError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Speech synthesis error: {0}")]
    Speech(String),

    #[error("Audio error: {0}")]
    Audio(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Clipboard error: {0}")]
    Clipboard(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

/// Result type alias for wspeech operations
pub type Result<T> = std::result::Result<T, WspeechError>;

impl From<String> for WspeechError {
    fn from(s: String) -> Self {
        WspeechError::Other(s)
    }
}

impl From<&str> for WspeechError {
    fn from(s: &str) -> Self {
        WspeechError::Other(s.to_string())
    }
}
