//! Native TTS backend using the tts crate
//!
//! This backend uses the `tts` crate which provides a unified interface to:
//! - Speech Dispatcher on Linux (via native bindings)
//! - AVFoundation on macOS/iOS (via native bindings)
//! - Various other platforms
//!
//! The engine has no pause, so pausing takes effect at the next chunk.

use crate::speech::Synth;
use crate::state::settings::{
    Settings, Voice, BASE_SPEED, DEFAULT_PITCH, MAX_PITCH, MAX_SPEED, MIN_SPEED,
};
use crate::{Result, WspeechError};
use log::{debug, error, warn};
use tts::{Gender, Tts as TtsCrate};

/// Native TTS backend using the tts crate
pub struct NativeSynth {
    tts: TtsCrate,

    /// Voice currently selected on the engine
    voice: Option<Voice>,
}

impl NativeSynth {
    /// Create a new native TTS synthesizer
    ///
    /// Initializes the platform-appropriate TTS backend
    pub fn new() -> Result<Self> {
        debug!("Creating native TTS backend");

        let tts = TtsCrate::default()
            .map_err(|e| WspeechError::Speech(format!("Failed to initialize TTS: {}", e)))?;

        debug!("Native TTS backend created successfully");

        Ok(Self { tts, voice: None })
    }

    /// Pick the engine voice closest to the requested one
    fn select_voice(&mut self, voice: Voice) -> Result<()> {
        if self.voice == Some(voice) {
            return Ok(());
        }
        self.voice = Some(voice);

        if !self.tts.supported_features().voice {
            debug!("Voice selection not supported on this platform");
            return Ok(());
        }

        let voices = self
            .tts
            .voices()
            .map_err(|e| WspeechError::Speech(format!("Failed to get voices: {}", e)))?;

        let found = voices.iter().find(|v| {
            let female = v.gender().map(|g| matches!(g, Gender::Female));
            voice_matches(&v.name(), &v.id(), female, voice.is_female())
        });

        match found {
            Some(v) => {
                debug!("Selecting voice: {}", v.name());
                self.tts
                    .set_voice(v)
                    .map_err(|e| WspeechError::Speech(format!("Failed to set voice: {}", e)))?;
            }
            None => warn!("No engine voice matches {}", voice),
        }

        Ok(())
    }
}

/// Map a speed ratio (1.0 = 160 wpm) onto the engine's rate range
///
/// The slowest speed lands on `min`, the fastest on `max` and 160 wpm on
/// `normal`, whatever scale the engine uses (Speech Dispatcher is -100..100).
fn map_rate(ratio: f32, min: f32, normal: f32, max: f32) -> f32 {
    let slowest = MIN_SPEED as f32 / BASE_SPEED as f32;
    let fastest = MAX_SPEED as f32 / BASE_SPEED as f32;
    let rate = if ratio <= 1.0 {
        normal - (normal - min) * ((1.0 - ratio) / (1.0 - slowest))
    } else {
        normal + (max - normal) * ((ratio - 1.0) / (fastest - 1.0))
    };
    rate.clamp(min, max)
}

/// Map pitch 0..=100 onto the engine's range with 50 at the normal pitch
fn map_pitch(pitch: u8, min: f32, normal: f32, max: f32) -> f32 {
    let pitch = pitch.min(MAX_PITCH) as f32;
    let mid = DEFAULT_PITCH as f32;
    if pitch <= mid {
        min + (normal - min) * (pitch / mid)
    } else {
        normal + (max - normal) * ((pitch - mid) / (MAX_PITCH as f32 - mid))
    }
}

/// Decide whether an engine voice fits the requested gender
///
/// Engines that report a gender are trusted; otherwise the name and id are
/// searched for the usual hints (espeak variants use f3/f4 and m3).
fn voice_matches(name: &str, id: &str, female: Option<bool>, want_female: bool) -> bool {
    if let Some(female) = female {
        return female == want_female;
    }

    let name = name.to_lowercase();
    let id = id.to_lowercase();
    if want_female {
        name.contains("female") || name.contains("zira") || id.contains("f4") || id.contains("f3")
    } else {
        (name.contains("male") && !name.contains("female"))
            || name.contains("david")
            || id.contains("m3")
    }
}

impl Synth for NativeSynth {
    fn name(&self) -> &str {
        "speech engine"
    }

    fn configure(&mut self, settings: &Settings) -> Result<()> {
        let features = self.tts.supported_features();

        if features.rate {
            let rate = map_rate(
                settings.speed_ratio(),
                self.tts.min_rate(),
                self.tts.normal_rate(),
                self.tts.max_rate(),
            );
            debug!("Setting rate to {}", rate);
            self.tts
                .set_rate(rate)
                .map_err(|e| WspeechError::Speech(format!("Failed to set rate: {}", e)))?;
        } else {
            warn!("Rate control not supported on this platform");
        }

        if features.pitch {
            let pitch = map_pitch(
                settings.pitch,
                self.tts.min_pitch(),
                self.tts.normal_pitch(),
                self.tts.max_pitch(),
            );
            debug!("Setting pitch to {}", pitch);
            self.tts
                .set_pitch(pitch)
                .map_err(|e| WspeechError::Speech(format!("Failed to set pitch: {}", e)))?;
        }

        self.select_voice(settings.voice)
    }

    fn speak(&mut self, text: &str) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }

        debug!("Speaking: {}", text);
        self.tts.speak(text, false).map_err(|e| {
            error!("Failed to speak: {}", e);
            WspeechError::Speech(format!("Speak failed: {}", e))
        })?;

        Ok(())
    }

    fn is_speaking(&mut self) -> Result<bool> {
        if !self.tts.supported_features().is_speaking {
            return Ok(false);
        }
        self.tts
            .is_speaking()
            .map_err(|e| WspeechError::Speech(format!("Failed to query engine: {}", e)))
    }

    fn cancel(&mut self) -> Result<()> {
        debug!("Canceling speech");
        self.tts.stop().map_err(|e| {
            error!("Failed to cancel speech: {}", e);
            WspeechError::Speech(format!("Cancel failed: {}", e))
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_synth() {
        // May fail without speech-dispatcher or in CI without audio
        match NativeSynth::new() {
            Ok(_) => println!("✓ Native TTS backend initialized successfully"),
            Err(e) => println!("⚠ TTS initialization failed (may be expected in CI): {}", e),
        }
    }

    fn rate_at(wpm: u16, min: f32, normal: f32, max: f32) -> f32 {
        let settings = Settings::default().with_speed(wpm as i64);
        map_rate(settings.speed_ratio(), min, normal, max)
    }

    #[test]
    fn test_rate_mapping_speech_dispatcher_range() {
        assert_eq!(rate_at(80, -100.0, 0.0, 100.0), -100.0);
        assert_eq!(rate_at(160, -100.0, 0.0, 100.0), 0.0);
        assert_eq!(rate_at(300, -100.0, 0.0, 100.0), 100.0);
        assert_eq!(rate_at(120, -100.0, 0.0, 100.0), -50.0);
        let fast = rate_at(240, -100.0, 0.0, 100.0);
        assert!(fast > 50.0 && fast < 60.0, "240 wpm mapped to {}", fast);
    }

    #[test]
    fn test_rate_mapping_multiplier_range() {
        let close = |a: f32, b: f32| (a - b).abs() < 1e-4;
        assert!(close(rate_at(80, 0.1, 1.0, 10.0), 0.1));
        assert!(close(rate_at(160, 0.1, 1.0, 10.0), 1.0));
        assert!(close(rate_at(300, 0.1, 1.0, 10.0), 10.0));
        assert_eq!(map_rate(50.0, 0.1, 1.0, 10.0), 10.0);
        assert_eq!(map_rate(0.0, 0.1, 1.0, 10.0), 0.1);
    }

    #[test]
    fn test_pitch_mapping() {
        assert_eq!(map_pitch(0, 0.0, 1.0, 2.0), 0.0);
        assert_eq!(map_pitch(50, 0.0, 1.0, 2.0), 1.0);
        assert_eq!(map_pitch(100, 0.0, 1.0, 2.0), 2.0);
        assert_eq!(map_pitch(75, -100.0, 0.0, 100.0), 50.0);
    }

    #[test]
    fn test_voice_matching() {
        assert!(voice_matches("Microsoft Zira", "zira", None, true));
        assert!(voice_matches("english", "en-us+f3", None, true));
        assert!(!voice_matches("female 1", "x", None, false));
        assert!(voice_matches("male 1", "x", None, false));
        assert!(voice_matches("anything", "x", Some(true), true));
        assert!(!voice_matches("Zira", "x", Some(false), true));
    }
}
