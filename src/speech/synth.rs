//! Speech backend abstraction and selection
//!
//! Two kinds of backends exist. A [`Synth`] speaks text itself (the platform
//! speech engine, espeak-ng). An [`AudioFetcher`] only produces encoded audio
//! which the session filters and plays locally (the cloud service).
//! Backends are tried in priority order; the session falls through to the
//! next one when a backend fails.

use super::backends::cloud::{CloudBackend, GoogleTts};
use super::backends::espeak::EspeakSynth;
use super::backends::native::NativeSynth;
use super::cancel::PlaybackControl;
use super::output::RodioOutput;
use super::tempo::FfmpegTempo;
use crate::state::settings::{Settings, Voice};
use crate::Result;
use log::{info, warn};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// A backend that speaks text directly
pub trait Synth: Send {
    /// Short name for status messages
    fn name(&self) -> &str;

    /// Apply speed, pitch and voice before the next utterance
    fn configure(&mut self, settings: &Settings) -> Result<()>;

    /// Start speaking `text` without waiting for it to finish
    fn speak(&mut self, text: &str) -> Result<()>;

    /// Whether the last utterance is still playing
    fn is_speaking(&mut self) -> Result<bool>;

    /// Pause mid-utterance; returns false if the backend can't
    fn pause(&mut self) -> Result<bool> {
        Ok(false)
    }

    fn resume(&mut self) -> Result<()> {
        Ok(())
    }

    /// Silence current speech immediately
    fn cancel(&mut self) -> Result<()>;
}

/// A backend that turns text into encoded audio
pub trait AudioFetcher: Send + Sync {
    fn name(&self) -> &str;

    /// Synthesize `text`, giving up early if the session is cancelled
    fn fetch(&self, text: &str, voice: Voice, control: &PlaybackControl) -> Result<Vec<u8>>;
}

/// Backend families, in default priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Cloud,
    Native,
    Espeak,
}

impl BackendKind {
    pub const PRIORITY: [BackendKind; 3] =
        [BackendKind::Cloud, BackendKind::Native, BackendKind::Espeak];

    /// Human-readable description shown in the header
    pub fn label(&self) -> &'static str {
        match self {
            BackendKind::Cloud => "Google TTS  (online · chunked)",
            BackendKind::Native => "Speech engine  (offline)",
            BackendKind::Espeak => "espeak-ng  (offline)",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackendKind::Cloud => "cloud",
            BackendKind::Native => "native",
            BackendKind::Espeak => "espeak",
        };
        f.write_str(name)
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cloud" | "gtts" | "google" => Ok(BackendKind::Cloud),
            "native" | "engine" | "speech-dispatcher" => Ok(BackendKind::Native),
            "espeak" | "espeak-ng" => Ok(BackendKind::Espeak),
            other => Err(format!("unknown backend '{}'", other)),
        }
    }
}

/// An initialized backend
pub enum Backend {
    Cloud(CloudBackend),
    Speaker(Box<dyn Synth>),
}

impl Backend {
    pub fn name(&self) -> &str {
        match self {
            Backend::Cloud(cloud) => cloud.name(),
            Backend::Speaker(synth) => synth.name(),
        }
    }
}

/// Options controlling backend detection
#[derive(Debug, Clone, Copy, Default)]
pub struct BackendOptions {
    /// Start the chain at this backend instead of the best one
    pub prefer: Option<BackendKind>,
    /// Skip the cloud backend
    pub offline: bool,
}

impl BackendOptions {
    /// Backend kinds to try, best first
    pub fn candidates(&self) -> Vec<BackendKind> {
        let skip = self
            .prefer
            .and_then(|p| BackendKind::PRIORITY.iter().position(|k| *k == p))
            .unwrap_or(0);

        BackendKind::PRIORITY
            .iter()
            .skip(skip)
            .copied()
            .filter(|k| !(self.offline && *k == BackendKind::Cloud))
            .collect()
    }
}

/// Detect every usable backend, best first
///
/// Mirrors the priority order:
/// 1. Google TTS (needs network and an audio output device)
/// 2. The platform speech engine (Speech Dispatcher on Linux)
/// 3. espeak-ng on the command line
///
/// An empty list means nothing can speak; the caller reports that.
pub fn create_backends(options: &BackendOptions) -> Vec<(BackendKind, Backend)> {
    let mut backends = Vec::new();

    for kind in options.candidates() {
        info!("Trying {} backend...", kind);
        match create_backend(kind) {
            Ok(backend) => {
                info!("✓ Successfully initialized {} backend", kind);
                backends.push((kind, backend));
            }
            Err(e) => {
                info!("✗ {} backend unavailable: {}", kind, e);
            }
        }
    }

    if backends.is_empty() {
        warn!("No speech backend available. Install: sudo apt install espeak-ng");
    }

    backends
}

fn create_backend(kind: BackendKind) -> Result<Backend> {
    match kind {
        BackendKind::Cloud => {
            RodioOutput::probe()?;
            let tempo = FfmpegTempo::new();
            if !tempo.is_available() {
                warn!("ffmpeg not found, speed changes won't apply to cloud audio");
            }
            Ok(Backend::Cloud(CloudBackend::new(
                Arc::new(GoogleTts::new()?),
                Arc::new(tempo),
                RodioOutput::factory(),
            )))
        }
        BackendKind::Native => Ok(Backend::Speaker(Box::new(NativeSynth::new()?))),
        BackendKind::Espeak => Ok(Backend::Speaker(Box::new(EspeakSynth::new()?))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kind() {
        assert_eq!("cloud".parse::<BackendKind>(), Ok(BackendKind::Cloud));
        assert_eq!("espeak-ng".parse::<BackendKind>(), Ok(BackendKind::Espeak));
        assert!("festival".parse::<BackendKind>().is_err());
    }

    #[test]
    fn test_default_candidates() {
        let options = BackendOptions::default();
        assert_eq!(
            options.candidates(),
            vec![BackendKind::Cloud, BackendKind::Native, BackendKind::Espeak]
        );
    }

    #[test]
    fn test_offline_skips_cloud() {
        let options = BackendOptions {
            prefer: None,
            offline: true,
        };
        assert_eq!(
            options.candidates(),
            vec![BackendKind::Native, BackendKind::Espeak]
        );
    }

    #[test]
    fn test_preferred_backend_starts_chain() {
        let options = BackendOptions {
            prefer: Some(BackendKind::Native),
            offline: false,
        };
        assert_eq!(
            options.candidates(),
            vec![BackendKind::Native, BackendKind::Espeak]
        );
    }
}
