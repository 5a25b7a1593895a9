//! Application state management
//!
//! The State struct is the central data structure of the reader: the
//! editor contents, the persisted voice settings, the player driving the
//! speech backends, and the status line shown to the user.

pub mod settings;

use crate::document::{Document, DropReport};
use crate::speech::{Player, SessionEvent};
use log::{info, warn};
use settings::{Settings, SettingsStore, Voice};
use std::path::PathBuf;

/// Status shown when idle
pub const READY_STATUS: &str = "Ready  —  paste text and press Speak";

/// Main application state
pub struct State {
    /// Speed, pitch and voice, saved on every change
    pub settings: SettingsStore,

    /// Text to be read
    pub document: Document,

    /// Speech session control
    pub player: Player,

    /// Description of the active backend for the header
    backend_label: String,

    /// Current status line
    status: String,

    /// Lines waiting to be shown on the console
    output: Vec<String>,
}

impl State {
    pub fn new(settings: SettingsStore, player: Player, backend_label: impl Into<String>) -> Self {
        info!("Settings: {:?}", settings.settings());
        Self {
            settings,
            document: Document::new(),
            player,
            backend_label: backend_label.into(),
            status: READY_STATUS.to_string(),
            output: Vec::new(),
        }
    }

    pub fn settings(&self) -> Settings {
        self.settings.settings()
    }

    pub fn backend_label(&self) -> &str {
        &self.backend_label
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// Replace the status line and queue it for display
    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status = msg.into();
        self.output.push(format!("[{}]", self.status));
    }

    /// Queue free-form output (help, text dumps)
    pub fn print(&mut self, text: impl Into<String>) {
        self.output.push(text.into());
    }

    /// Take everything queued for display
    pub fn drain_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.output)
    }

    /// Start reading the editor contents
    pub fn speak(&mut self) {
        if self.document.is_empty() {
            self.set_status("Please enter some text first.");
            return;
        }
        if !self.player.has_backend() {
            self.set_status("No TTS backend available.  Install:  sudo apt install espeak-ng");
            return;
        }

        let text = self.document.text().to_string();
        let settings = self.settings();
        match self.player.start(&text, settings) {
            Ok(chunks) => info!("Speaking {} chars in {} chunks", text.len(), chunks),
            Err(e) => self.set_status(format!("Error: {}", e)),
        }
    }

    pub fn toggle_pause(&mut self) {
        if self.player.toggle_pause().is_none() {
            self.set_status("Nothing is playing");
        }
    }

    pub fn stop(&mut self) {
        self.player.stop();
    }

    /// Change speed; the running session picks it up at the next chunk
    pub fn set_speed(&mut self, wpm: i64) {
        let settings = self.settings().with_speed(wpm);
        self.apply_settings(settings);
        self.set_status(format!("Speed: {} wpm", settings.speed));
    }

    pub fn set_pitch(&mut self, pitch: i64) {
        let settings = self.settings().with_pitch(pitch);
        self.apply_settings(settings);
        self.set_status(format!("Pitch: {}", settings.pitch));
    }

    pub fn set_voice(&mut self, voice: Voice) {
        let settings = Settings {
            voice,
            ..self.settings()
        };
        self.apply_settings(settings);
        self.set_status(format!("Voice: {}", voice));
    }

    fn apply_settings(&mut self, settings: Settings) {
        self.player.update_settings(settings);
        if let Err(e) = self.settings.update(settings) {
            // The change still applies for this run
            warn!("Failed to save settings: {}", e);
        }
    }

    /// Replace the editor contents with dropped/loaded files
    pub fn load_files(&mut self, payload: &str) {
        let report = self.document.load_drop(payload);
        self.apply_report(report);
    }

    /// Replace the editor contents with files named on the command line
    pub fn load_paths(&mut self, paths: &[PathBuf]) {
        let report = self.document.load_paths(paths);
        self.apply_report(report);
    }

    fn apply_report(&mut self, report: DropReport) {
        for error in &report.errors {
            warn!("{}", error);
        }
        self.set_status(report.status());
    }

    /// Update the status line from a session event
    pub fn handle_event(&mut self, event: &SessionEvent) {
        if let SessionEvent::Started { backend, total } = event {
            info!("Session started on {} ({} chunks)", backend, total);
        }
        self.set_status(event.to_string());
    }

    /// Backend and settings overview for `:status`
    pub fn summary(&self) -> String {
        let settings = self.settings();
        let state = if self.player.is_paused() {
            "paused"
        } else if self.player.is_active() {
            "speaking"
        } else {
            "idle"
        };
        format!(
            "Backend: {}\nFallbacks: {}\nSpeed: {} wpm   Pitch: {}   Voice: {}\nText: {} chars   State: {}\nSettings file: {}",
            self.backend_label,
            self.player.backend_names().join(" → "),
            settings.speed,
            settings.pitch,
            settings.voice,
            self.document.char_count(),
            state,
            self.settings.path().display(),
        )
    }
}
