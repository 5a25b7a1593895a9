//! Settings persistence tests
//!
//! Settings must survive a save/load cycle and a broken or missing file
//! must never stop the program from starting.

use std::fs;
use wspeech::state::settings::{Settings, SettingsStore, Voice, MAX_SPEED, MIN_SPEED};

#[test]
fn test_saved_settings_load_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("settings.json");

    let mut store = SettingsStore::load_from(&path);
    assert_eq!(store.settings(), Settings::default());

    let changed = Settings {
        speed: 220,
        pitch: 70,
        voice: Voice::David,
    };
    store.update(changed).expect("save should create the directory");

    let reloaded = SettingsStore::load_from(&path);
    assert_eq!(reloaded.settings(), changed);
}

#[test]
fn test_file_uses_display_labels() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");

    let mut store = SettingsStore::load_from(&path);
    store
        .update(Settings {
            voice: Voice::David,
            ..Settings::default()
        })
        .unwrap();

    let contents = fs::read_to_string(&path).unwrap();
    assert!(contents.contains("\"David (Male EN)\""));
    assert!(contents.contains("\"speed\":160"));
}

#[test]
fn test_missing_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let store = SettingsStore::load_from(dir.path().join("absent.json"));
    assert_eq!(store.settings(), Settings::default());
}

#[test]
fn test_corrupt_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    fs::write(&path, "{ speed: fast").unwrap();

    let store = SettingsStore::load_from(&path);
    assert_eq!(store.settings(), Settings::default());

    // Still writable afterwards
    store.save().unwrap();
    assert_eq!(SettingsStore::load_from(&path).settings(), Settings::default());
}

#[test]
fn test_out_of_range_values_are_clamped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    fs::write(&path, r#"{"speed": 900, "pitch": -4, "voice": "Zira (Female EN)"}"#).unwrap();

    let settings = SettingsStore::load_from(&path).settings();
    assert_eq!(settings.speed, MAX_SPEED);
    assert_eq!(settings.pitch, 0);

    fs::write(&path, r#"{"speed": 10}"#).unwrap();
    assert_eq!(SettingsStore::load_from(&path).settings().speed, MIN_SPEED);
}

#[test]
fn test_bad_key_keeps_the_others() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    fs::write(&path, r#"{"speed": 240.0, "pitch": "high", "voice": "Robot"}"#).unwrap();

    let settings = SettingsStore::load_from(&path).settings();
    assert_eq!(settings.speed, 240);
    assert_eq!(settings.pitch, Settings::default().pitch);
    assert_eq!(settings.voice, Voice::Zira);
}
