//! Platform detection utilities

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// Detect if running in WSL (Windows Subsystem for Linux)
///
/// Checks for WSL-specific indicators in /proc/version and environment variables.
pub fn is_wsl() -> bool {
    if let Ok(contents) = fs::read_to_string("/proc/version") {
        let lower = contents.to_lowercase();
        if lower.contains("microsoft") || lower.contains("wsl") {
            return true;
        }
    }

    std::env::var("WSL_DISTRO_NAME").is_ok()
}

/// Check whether an external program can be launched
///
/// Runs `<program> <probe_arg>` with output discarded and reports whether it
/// exited successfully.
pub fn program_available(program: &str, probe_arg: &str) -> bool {
    Command::new(program)
        .arg(probe_arg)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// The user's home directory, falling back to the current directory
pub fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// Directory holding wspeech's own files (~/.config/wspeech)
pub fn config_dir() -> PathBuf {
    home_dir().join(".config").join("wspeech")
}

/// Directory where the desktop launcher is written (~/Desktop)
pub fn desktop_dir() -> PathBuf {
    home_dir().join("Desktop")
}
