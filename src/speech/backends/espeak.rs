//! espeak-ng command-line backend
//!
//! The last-resort offline backend: each chunk is spoken by a fresh
//! `espeak-ng` process. Pausing stops the process with SIGSTOP and resuming
//! continues it with SIGCONT, so pauses take effect mid-sentence.
//!
//! On WSL with WSLg the PulseAudio server is auto-detected so espeak-ng can
//! reach the Windows audio stack.

use crate::platform::{is_wsl, program_available};
use crate::speech::Synth;
use crate::state::settings::{Settings, Voice};
use crate::{Result, WspeechError};
use log::{debug, error, info, warn};
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::process::{Child, Command, Stdio};

/// espeak-ng backend
pub struct EspeakSynth {
    /// Currently running espeak-ng process
    current_process: Option<Child>,

    settings: Settings,

    /// Path to espeak-ng
    espeak_path: String,
}

impl EspeakSynth {
    /// Setup PulseAudio server environment
    ///
    /// Auto-detects the WSLG PulseAudio server and sets PULSE_SERVER if needed.
    fn setup_pulseaudio() {
        const WSLG_PULSE_PATH: &str = "/mnt/wslg/PulseServer";

        if std::env::var("PULSE_SERVER").is_ok() {
            debug!("PULSE_SERVER already set via environment");
            return;
        }

        if is_wsl() {
            if std::path::Path::new(WSLG_PULSE_PATH).exists() {
                info!("Auto-detected WSLG PulseAudio server at {}", WSLG_PULSE_PATH);
                std::env::set_var("PULSE_SERVER", WSLG_PULSE_PATH);
            } else {
                warn!("WSLG PulseAudio server not found at {}", WSLG_PULSE_PATH);
                warn!("Set PULSE_SERVER if espeak-ng produces no sound");
            }
        }
    }

    /// Create a new espeak-ng synthesizer
    ///
    /// Fails if espeak-ng is not installed
    pub fn new() -> Result<Self> {
        debug!("Creating espeak-ng backend");

        Self::setup_pulseaudio();

        let espeak_path = Self::find_espeak()?;
        debug!("Found espeak-ng at: {}", espeak_path);

        Ok(Self {
            current_process: None,
            settings: Settings::default(),
            espeak_path,
        })
    }

    /// Find espeak-ng executable
    fn find_espeak() -> Result<String> {
        ["espeak-ng", "/usr/bin/espeak-ng"]
            .into_iter()
            .find(|path| program_available(path, "--version"))
            .map(str::to_string)
            .ok_or_else(|| {
                WspeechError::Speech(
                    "espeak-ng not found. Install with: sudo apt install espeak-ng".to_string(),
                )
            })
    }

    /// espeak-ng voice variant for a voice selection
    fn voice_variant(voice: Voice) -> &'static str {
        match voice {
            Voice::Zira => "en-us+f3",
            Voice::David => "en-us+m3",
        }
    }

    /// Command-line arguments for speaking `text`
    fn build_args(settings: &Settings, text: &str) -> Vec<String> {
        vec![
            "-v".to_string(),
            Self::voice_variant(settings.voice).to_string(),
            "-s".to_string(),
            settings.speed.to_string(),
            "-p".to_string(),
            settings.pitch.to_string(),
            text.to_string(),
        ]
    }

    fn signal_process(&self, signal: Signal) -> Result<()> {
        if let Some(child) = &self.current_process {
            let pid = Pid::from_raw(child.id() as i32);
            kill(pid, signal)
                .map_err(|e| WspeechError::Speech(format!("Failed to send {:?}: {}", signal, e)))?;
        }
        Ok(())
    }

    /// Cancel any currently running speech process
    fn cancel_process(&mut self) {
        if let Some(mut child) = self.current_process.take() {
            debug!("Killing espeak-ng process");
            // A stopped process must be continued before it can exit cleanly
            let _ = kill(Pid::from_raw(child.id() as i32), Signal::SIGCONT);
            match child.kill() {
                Ok(_) => {
                    let _ = child.wait();
                }
                Err(e) => {
                    debug!("Failed to kill espeak-ng process: {}", e);
                }
            }
        }
    }
}

impl Synth for EspeakSynth {
    fn name(&self) -> &str {
        "espeak-ng"
    }

    fn configure(&mut self, settings: &Settings) -> Result<()> {
        debug!("espeak-ng settings: {:?}", settings);
        self.settings = *settings;
        Ok(())
    }

    fn speak(&mut self, text: &str) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }

        self.cancel_process();
        debug!("Speaking: {}", text);

        let child = Command::new(&self.espeak_path)
            .args(Self::build_args(&self.settings, text))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                error!("Failed to spawn espeak-ng: {}", e);
                WspeechError::Speech(format!("Failed to start espeak-ng: {}", e))
            })?;

        self.current_process = Some(child);
        Ok(())
    }

    fn is_speaking(&mut self) -> Result<bool> {
        let Some(child) = self.current_process.as_mut() else {
            return Ok(false);
        };

        match child.try_wait()? {
            None => Ok(true),
            Some(status) => {
                self.current_process = None;
                if status.success() {
                    Ok(false)
                } else {
                    Err(WspeechError::Speech(format!("espeak-ng exited with {}", status)))
                }
            }
        }
    }

    fn pause(&mut self) -> Result<bool> {
        debug!("Pausing espeak-ng");
        self.signal_process(Signal::SIGSTOP)?;
        Ok(true)
    }

    fn resume(&mut self) -> Result<()> {
        debug!("Resuming espeak-ng");
        self.signal_process(Signal::SIGCONT)
    }

    fn cancel(&mut self) -> Result<()> {
        debug!("Canceling speech");
        self.cancel_process();
        Ok(())
    }
}

impl Drop for EspeakSynth {
    fn drop(&mut self) {
        debug!("Shutting down espeak-ng backend");
        self.cancel_process();
    }
}
