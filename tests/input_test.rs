//! Console command tests
//!
//! Run lines through the command handler against a state with no speech
//! backends and a settings file in a temporary directory.

use std::fs;
use std::sync::mpsc;
use wspeech::input::{CommandHandler, HandlerAction};
use wspeech::speech::Player;
use wspeech::state::settings::{SettingsStore, Voice, MAX_SPEED};
use wspeech::state::State;

fn test_state(dir: &tempfile::TempDir) -> State {
    let (tx, _rx) = mpsc::channel();
    let settings = SettingsStore::load_from(dir.path().join("settings.json"));
    State::new(settings, Player::new(Vec::new(), tx), "test backend")
}

fn run(state: &mut State, lines: &[&str]) -> HandlerAction {
    let mut handler = CommandHandler::new();
    let mut last = HandlerAction::Handled;
    for line in lines {
        last = handler.process(line, state).expect("command failed");
    }
    last
}

#[test]
fn test_text_lines_fill_the_editor() {
    let dir = tempfile::tempdir().unwrap();
    let mut state = test_state(&dir);

    run(&mut state, &["Hello there.", "::colon first", "  "]);
    assert_eq!(state.document.text(), "Hello there.\n:colon first");

    run(&mut state, &[":clear"]);
    assert!(state.document.is_empty());
    assert_eq!(state.status(), "Cleared");
}

#[test]
fn test_settings_commands_persist() {
    let dir = tempfile::tempdir().unwrap();
    let mut state = test_state(&dir);

    run(&mut state, &[":speed 250", ":pitch 65", ":voice male"]);
    assert_eq!(state.status(), "Voice: David (Male EN)");

    let reloaded = SettingsStore::load_from(dir.path().join("settings.json")).settings();
    assert_eq!(reloaded.speed, 250);
    assert_eq!(reloaded.pitch, 65);
    assert_eq!(reloaded.voice, Voice::David);

    run(&mut state, &[":rate 5000"]);
    assert_eq!(state.settings().speed, MAX_SPEED);
    assert_eq!(state.status(), format!("Speed: {} wpm", MAX_SPEED));
}

#[test]
fn test_bad_arguments_show_usage() {
    let dir = tempfile::tempdir().unwrap();
    let mut state = test_state(&dir);

    run(&mut state, &[":speed fast"]);
    assert!(state.status().starts_with("Usage: :speed"));
    run(&mut state, &[":voice robot"]);
    assert!(state.status().starts_with("Usage: :voice"));
    run(&mut state, &[":load"]);
    assert!(state.status().starts_with("Usage: :load"));

    // Nothing was saved
    assert!(!dir.path().join("settings.json").exists());
}

#[test]
fn test_speak_needs_text_and_backend() {
    let dir = tempfile::tempdir().unwrap();
    let mut state = test_state(&dir);

    run(&mut state, &[":speak"]);
    assert_eq!(state.status(), "Please enter some text first.");

    run(&mut state, &["Some text.", ":s"]);
    assert!(state.status().starts_with("No TTS backend available"));

    run(&mut state, &[":pause"]);
    assert_eq!(state.status(), "Nothing is playing");
}

#[test]
fn test_load_replaces_text() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("my notes.txt");
    fs::write(&file, "From a file.").unwrap();

    let mut state = test_state(&dir);
    run(&mut state, &["typed text"]);
    run(
        &mut state,
        &[format!(":load {{{}}}", file.display()).as_str()],
    );

    assert_eq!(state.document.text(), "From a file.");
    assert!(state.status().starts_with("Loaded: my notes.txt"));

    run(&mut state, &[":load /no/such/file.txt"]);
    assert_eq!(state.document.text(), "From a file.");
    assert!(state.status().starts_with("Drop failed"));
}

#[test]
fn test_output_commands_and_quit() {
    let dir = tempfile::tempdir().unwrap();
    let mut state = test_state(&dir);

    run(&mut state, &[":nonsense"]);
    assert!(state.status().starts_with("Unknown command :nonsense"));

    state.drain_output();
    run(&mut state, &["Read me.", ":show", ":status"]);
    let output = state.drain_output();
    assert_eq!(output[0], "Read me.");
    assert!(output[1].contains("Backend: test backend"));
    assert!(output[1].contains("State: idle"));

    assert_eq!(run(&mut state, &[":q"]), HandlerAction::Quit);
}

#[test]
fn test_command_line_paths_load_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("notes {draft}.txt");
    fs::write(&file, "Draft text.").unwrap();

    let mut state = test_state(&dir);
    state.load_paths(&[file]);

    assert_eq!(state.document.text(), "Draft text.");
    assert!(state.status().starts_with("Loaded: notes {draft}.txt"));
}
