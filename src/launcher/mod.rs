//! Desktop launcher
//!
//! Every run (re)writes `~/Desktop/wSpeech.desktop` pointing at the current
//! executable, so the launcher follows the binary if it moves.

pub mod icon;

use crate::Result;
use log::{debug, info};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// File name of the generated launcher
pub const DESKTOP_FILE: &str = "wSpeech.desktop";

/// Render the desktop entry for an executable and icon
pub fn desktop_entry(exec: &Path, icon: &Path) -> String {
    format!(
        "[Desktop Entry]\n\
         Version={version}\n\
         Name=wSpeech\n\
         GenericName=Text to Speech\n\
         Comment=Listen to any text — Zira-style female voice\n\
         Exec={exec}\n\
         Icon={icon}\n\
         Terminal=true\n\
         Type=Application\n\
         Categories=Utility;Audio;Accessibility;\n\
         Keywords=tts;speech;text;voice;zira;\n\
         StartupNotify=true\n",
        version = crate::VERSION,
        exec = exec.display(),
        icon = icon.display(),
    )
}

/// Write the launcher into `desktop_dir` and make it executable
pub fn install(desktop_dir: &Path, exec: &Path, icon: &Path) -> Result<PathBuf> {
    fs::create_dir_all(desktop_dir)?;
    let path = desktop_dir.join(DESKTOP_FILE);

    fs::write(&path, desktop_entry(exec, icon))?;

    let mut perms = fs::metadata(&path)?.permissions();
    perms.set_mode(perms.mode() | 0o111);
    fs::set_permissions(&path, perms)?;

    debug!("Desktop launcher written to {:?}", path);
    Ok(path)
}

/// Generate the icon if needed and install the launcher on the user's desktop
pub fn install_default() -> Result<PathBuf> {
    let icon_path = crate::platform::config_dir().join(icon::ICON_FILE);
    if !icon_path.exists() {
        icon::write_icon(&icon_path)?;
        info!("Icon saved to {:?}", icon_path);
    }

    let exec = std::env::current_exe()?;
    install(&crate::platform::desktop_dir(), &exec, &icon_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_desktop_entry_fields() {
        let entry = desktop_entry(Path::new("/usr/bin/wspeech"), Path::new("/tmp/icon.png"));
        assert!(entry.starts_with("[Desktop Entry]\n"));
        assert!(entry.contains("Exec=/usr/bin/wspeech\n"));
        assert!(entry.contains("Icon=/tmp/icon.png\n"));
        assert!(entry.contains("Type=Application\n"));
        assert!(entry.ends_with("StartupNotify=true\n"));
    }

    #[test]
    fn test_install_marks_executable() {
        let dir = tempfile::tempdir().unwrap();
        let desktop = dir.path().join("Desktop");
        let path = install(&desktop, Path::new("/usr/bin/wspeech"), Path::new("icon.png")).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0o111);
        assert!(fs::read_to_string(&path).unwrap().contains("Name=wSpeech"));
    }
}
