//! Persistent voice settings
//!
//! Speed, pitch and voice are stored as a flat JSON object in
//! `~/.config/wspeech/settings.json`. A missing or unreadable file never
//! stops the program: every key that can't be used keeps its default.

use crate::{Result, WspeechError};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Slowest selectable speed in words per minute
pub const MIN_SPEED: u16 = 80;
/// Fastest selectable speed in words per minute
pub const MAX_SPEED: u16 = 300;
/// Speed at which synthesized audio is played unmodified
pub const BASE_SPEED: u16 = 160;
/// Highest pitch value
pub const MAX_PITCH: u8 = 100;
/// Neutral pitch
pub const DEFAULT_PITCH: u8 = 50;

/// Voice selection
///
/// Serialized with the labels shown to the user so existing settings files
/// stay readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Voice {
    #[default]
    #[serde(rename = "Zira (Female EN)")]
    Zira,
    #[serde(rename = "David (Male EN)")]
    David,
}

impl Voice {
    /// Label stored in the settings file
    pub fn label(&self) -> &'static str {
        match self {
            Voice::Zira => "Zira (Female EN)",
            Voice::David => "David (Male EN)",
        }
    }

    pub fn is_female(&self) -> bool {
        matches!(self, Voice::Zira)
    }

    /// Parse a stored label or a short name typed by the user
    pub fn parse(name: &str) -> Option<Self> {
        let lower = name.trim().to_lowercase();
        match lower.as_str() {
            "zira (female en)" | "zira" | "female" | "f" => Some(Voice::Zira),
            "david (male en)" | "david" | "male" | "m" => Some(Voice::David),
            _ => None,
        }
    }
}

impl fmt::Display for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Voice parameters used for synthesis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Words per minute (80-300)
    pub speed: u16,
    /// Pitch (0-100, 50 is neutral)
    pub pitch: u8,
    pub voice: Voice,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            speed: BASE_SPEED,
            pitch: DEFAULT_PITCH,
            voice: Voice::Zira,
        }
    }
}

impl Settings {
    /// Playback speed ratio relative to the base speed (160 wpm = 1.0)
    pub fn speed_ratio(&self) -> f32 {
        self.speed as f32 / BASE_SPEED as f32
    }

    /// Return a copy with speed clamped into range
    pub fn with_speed(mut self, speed: i64) -> Self {
        self.speed = speed.clamp(MIN_SPEED as i64, MAX_SPEED as i64) as u16;
        self
    }

    /// Return a copy with pitch clamped into range
    pub fn with_pitch(mut self, pitch: i64) -> Self {
        self.pitch = pitch.clamp(0, MAX_PITCH as i64) as u8;
        self
    }

    /// Build settings from a parsed JSON document
    ///
    /// Keys are read one at a time so a single bad value doesn't discard
    /// the rest.
    fn from_json(value: &Value) -> Self {
        let mut settings = Settings::default();

        if let Some(speed) = value.get("speed").and_then(json_int) {
            settings = settings.with_speed(speed);
        }
        if let Some(pitch) = value.get("pitch").and_then(json_int) {
            settings = settings.with_pitch(pitch);
        }
        if let Some(voice) = value.get("voice").and_then(Value::as_str) {
            match Voice::parse(voice) {
                Some(v) => settings.voice = v,
                None => warn!("Unknown voice {:?} in settings, using default", voice),
            }
        }

        settings
    }
}

/// Accept integers and floats (sliders may have written either)
fn json_int(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f.round() as i64))
}

/// Settings bound to the file they are persisted in
pub struct SettingsStore {
    path: PathBuf,
    settings: Settings,
}

impl SettingsStore {
    /// Load settings from the default location
    pub fn load() -> Self {
        Self::load_from(Self::default_path())
    }

    /// Load settings from `path`, falling back to defaults
    pub fn load_from(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        debug!("Loading settings from {:?}", path);
        let settings = Self::read(&path).unwrap_or_else(|e| {
            info!("Using default settings ({})", e);
            Settings::default()
        });

        Self { path, settings }
    }

    fn read(path: &Path) -> Result<Settings> {
        let contents = fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&contents)?;
        if !value.is_object() {
            return Err(WspeechError::Config(
                "settings file is not a JSON object".to_string(),
            ));
        }
        Ok(Settings::from_json(&value))
    }

    /// Settings file path (~/.config/wspeech/settings.json)
    pub fn default_path() -> PathBuf {
        crate::platform::config_dir().join("settings.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    /// Replace the settings and persist them
    pub fn update(&mut self, settings: Settings) -> Result<()> {
        self.settings = settings;
        self.save()
    }

    /// Save settings to disk
    pub fn save(&self) -> Result<()> {
        debug!("Saving settings to {:?}", self.path);
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string(&self.settings)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.speed, 160);
        assert_eq!(s.pitch, 50);
        assert_eq!(s.voice, Voice::Zira);
        assert_eq!(s.speed_ratio(), 1.0);
    }

    #[test]
    fn test_voice_labels() {
        assert_eq!(
            serde_json::to_value(Voice::David).unwrap(),
            json!("David (Male EN)")
        );
        assert_eq!(Voice::parse("Zira (Female EN)"), Some(Voice::Zira));
        assert_eq!(Voice::parse("male"), Some(Voice::David));
        assert_eq!(Voice::parse("Bob"), None);
    }

    #[test]
    fn test_from_json_clamps_values() {
        let s = Settings::from_json(&json!({"speed": 1000, "pitch": -4}));
        assert_eq!(s.speed, MAX_SPEED);
        assert_eq!(s.pitch, 0);
    }

    #[test]
    fn test_from_json_keeps_good_keys() {
        let s = Settings::from_json(&json!({
            "speed": "fast",
            "pitch": 70.4,
            "voice": "Robot"
        }));
        assert_eq!(s.speed, BASE_SPEED);
        assert_eq!(s.pitch, 70);
        assert_eq!(s.voice, Voice::Zira);
    }
}
