//! wSpeech - console text-to-speech reader
//!
//! Reads pasted, typed or loaded text aloud. Text is split into sentence
//! chunks which are synthesized by the best available backend (Google TTS,
//! the platform speech engine, or espeak-ng) and played in order, with
//! pause, resume, stop and live speed changes.

pub mod clipboard;
pub mod document;
pub mod error;
pub mod input;
pub mod launcher;
pub mod platform;
pub mod speech;
pub mod state;
pub mod text;

pub use error::{Result, WspeechError};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = "wSpeech";
