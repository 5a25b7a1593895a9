//! Tempo adjustment of synthesized audio through ffmpeg's `atempo` filter
//!
//! Cloud audio is always fetched at normal speed; the user's speed is applied
//! afterwards. `atempo` only accepts ratios in [0.5, 2.0], so extreme ratios
//! are expressed as a chain of stages.

use super::cancel::PlaybackControl;
use crate::{Result, WspeechError};
use log::{debug, warn};
use std::fs;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

/// Ratios this close to 1.0 are played unmodified
pub const RATIO_TOLERANCE: f32 = 0.04;

const CHILD_POLL: Duration = Duration::from_millis(10);

/// Post-processing applied to fetched audio before playback
pub trait AudioFilter: Send + Sync {
    /// Return `audio` played back at `ratio` times normal speed
    fn apply(&self, audio: &[u8], ratio: f32, control: &PlaybackControl) -> Result<Vec<u8>>;
}

/// Whether a ratio needs any processing at all
pub fn needs_tempo(ratio: f32) -> bool {
    (ratio - 1.0).abs() >= RATIO_TOLERANCE
}

/// Build the `atempo` filter chain for a ratio
///
/// Each stage stays within [0.5, 2.0]; the final stage carries the remainder.
pub fn atempo_chain(ratio: f32) -> String {
    let mut ratio = ratio as f64;
    let mut filters = Vec::new();

    while ratio > 2.0 {
        filters.push("atempo=2.0".to_string());
        ratio /= 2.0;
    }
    while ratio < 0.5 {
        filters.push("atempo=0.5".to_string());
        ratio /= 0.5;
    }
    filters.push(format!("atempo={:.4}", ratio));

    filters.join(",")
}

/// Tempo filter backed by the ffmpeg command-line tool
pub struct FfmpegTempo {
    program: String,
}

impl FfmpegTempo {
    pub fn new() -> Self {
        Self {
            program: "ffmpeg".to_string(),
        }
    }

    /// Use a specific ffmpeg binary
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn is_available(&self) -> bool {
        crate::platform::program_available(&self.program, "-version")
    }

    fn run(&self, audio: &[u8], ratio: f32, control: &PlaybackControl) -> Result<Vec<u8>> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("in.mp3");
        let output = dir.path().join("out.mp3");
        fs::write(&input, audio)?;

        let chain = atempo_chain(ratio);
        debug!("Applying tempo {:.2} ({})", ratio, chain);

        let child = Command::new(&self.program)
            .arg("-y")
            .arg("-i")
            .arg(&input)
            .arg("-filter:a")
            .arg(&chain)
            .arg("-q:a")
            .arg("2")
            .arg(&output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| WspeechError::Audio(format!("Failed to start ffmpeg: {}", e)))?;

        let status = wait_cancellable(child, control)?;
        if !status.success() {
            return Err(WspeechError::Audio(format!("ffmpeg exited with {}", status)));
        }

        Ok(fs::read(&output)?)
    }
}

impl Default for FfmpegTempo {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioFilter for FfmpegTempo {
    fn apply(&self, audio: &[u8], ratio: f32, control: &PlaybackControl) -> Result<Vec<u8>> {
        if !needs_tempo(ratio) {
            return Ok(audio.to_vec());
        }

        match self.run(audio, ratio, control) {
            Ok(processed) => Ok(processed),
            Err(WspeechError::Cancelled) => Err(WspeechError::Cancelled),
            Err(e) => {
                // Unmodified speech beats no speech
                warn!("Tempo filter failed, playing at normal speed: {}", e);
                Ok(audio.to_vec())
            }
        }
    }
}

/// Wait for a child process, killing it if the session is cancelled
pub fn wait_cancellable(mut child: Child, control: &PlaybackControl) -> Result<ExitStatus> {
    loop {
        if control.is_cancelled() {
            debug!("Killing subprocess {}", child.id());
            let _ = child.kill();
            let _ = child.wait();
            return Err(WspeechError::Cancelled);
        }
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        thread::sleep(CHILD_POLL);
    }
}
