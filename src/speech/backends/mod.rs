//! Speech backends, best first

// Google Translate TTS over HTTPS
pub mod cloud;

// Native TTS backend using the tts crate (cross-platform)
pub mod native;

// espeak-ng on the command line, last resort
pub mod espeak;
