//! wSpeech main entry point
//!
//! The main loop watches two sources:
//! 1. console lines (text for the editor or `:commands`) read on a thread
//! 2. session events from the speech worker, shown as status lines

use log::{debug, error, info, warn};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;
use wspeech::input::{CommandHandler, HandlerAction};
use wspeech::speech::session::SHUTDOWN_GRACE;
use wspeech::speech::{create_backends, BackendKind, BackendOptions, Player, SessionEvent};
use wspeech::state::settings::SettingsStore;
use wspeech::state::State;
use wspeech::Result;

/// How long the main loop waits for console input before checking events
const TICK: Duration = Duration::from_millis(50);

const USAGE: &str = "\
Usage: wspeech [OPTIONS] [FILE...]

Options:
  -d, --debug         write a debug log to wspeech.log
      --backend NAME  start with backend cloud, native or espeak
      --offline       never use the cloud backend
      --no-launcher   don't write the desktop launcher
      --speak         read the given files aloud and exit
  -h, --help          show this help
  -V, --version       show the version";

/// Command line options
#[derive(Debug, Default)]
struct Options {
    debug: bool,
    backend: BackendOptions,
    no_launcher: bool,
    speak: bool,
    files: Vec<PathBuf>,
}

fn parse_args(args: impl Iterator<Item = String>) -> std::result::Result<Options, String> {
    let mut options = Options::default();
    let mut args = args.peekable();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--debug" | "-d" => options.debug = true,
            "--offline" => options.backend.offline = true,
            "--no-launcher" => options.no_launcher = true,
            "--speak" => options.speak = true,
            "--backend" => {
                let name = args.next().ok_or("--backend needs a value")?;
                options.backend.prefer = Some(name.parse::<BackendKind>()?);
            }
            "--help" | "-h" => {
                println!("{}", USAGE);
                process::exit(0);
            }
            "--version" | "-V" => {
                println!("{} {}", wspeech::APP_NAME, wspeech::VERSION);
                process::exit(0);
            }
            "--" => options.files.extend(args.by_ref().map(PathBuf::from)),
            other if other.starts_with('-') && other.len() > 1 => {
                return Err(format!("unknown option '{}'", other));
            }
            _ => options.files.push(PathBuf::from(arg)),
        }
    }

    Ok(options)
}

fn main() {
    let options = match parse_args(std::env::args().skip(1)) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("{}", USAGE);
            process::exit(2);
        }
    };

    init_logging(options.debug);

    if let Err(e) = run(options) {
        error!("Fatal error: {}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_logging(debug_mode: bool) {
    if debug_mode {
        use std::fs::OpenOptions;
        match OpenOptions::new()
            .create(true)
            .append(true)
            .open("wspeech.log")
        {
            Ok(log_file) => {
                env_logger::Builder::new()
                    .filter_level(log::LevelFilter::Debug)
                    .target(env_logger::Target::Pipe(Box::new(log_file)))
                    .init();
            }
            Err(e) => {
                eprintln!("Warning: Failed to open wspeech.log for debug logging: {}", e);
                env_logger::Builder::new()
                    .filter_level(log::LevelFilter::Warn)
                    .init();
            }
        }

        info!(
            "wSpeech version {} starting (debug mode, logging to wspeech.log)",
            wspeech::VERSION
        );
    } else {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Warn)
            .parse_default_env()
            .init();
    }
}

fn run(options: Options) -> Result<()> {
    debug!("Options: {:?}", options);

    let settings = SettingsStore::load();
    info!("Settings loaded from {:?}", settings.path());

    if !options.no_launcher {
        match wspeech::launcher::install_default() {
            Ok(path) => info!("Desktop launcher at {:?}", path),
            Err(e) => warn!("Could not create desktop launcher: {}", e),
        }
    }

    let backends = create_backends(&options.backend);
    let label = backends
        .first()
        .map(|(kind, _)| kind.label().to_string())
        .unwrap_or_else(|| "⚠ No TTS backend found".to_string());
    let backends = backends.into_iter().map(|(_, backend)| backend).collect();

    let (event_tx, event_rx) = mpsc::channel();
    let player = Player::new(backends, event_tx);
    let mut state = State::new(settings, player, label);

    println!(
        "🔊  {}  v{}   ·   {}",
        wspeech::APP_NAME,
        wspeech::VERSION,
        state.backend_label()
    );

    if !options.files.is_empty() {
        state.load_paths(&options.files);
    }

    if options.speak {
        state.speak();
        flush_output(&mut state)?;
        wait_for_session(&mut state, &event_rx)?;
        return Ok(());
    }

    println!("Paste or type text to speak  ·  :load a file  ·  :help for commands");
    state.set_status(wspeech::state::READY_STATUS);
    flush_output(&mut state)?;

    let lines = spawn_stdin_reader();
    let mut handler = CommandHandler::new();

    loop {
        for event in event_rx.try_iter() {
            state.handle_event(&event);
        }
        flush_output(&mut state)?;

        match lines.recv_timeout(TICK) {
            Ok(Some(line)) => {
                if handler.process(&line, &mut state)? == HandlerAction::Quit {
                    info!("Quit requested");
                    break;
                }
            }
            Ok(None) | Err(RecvTimeoutError::Disconnected) => {
                // Input closed: let a running session finish first
                debug!("Console input closed");
                wait_for_session(&mut state, &event_rx)?;
                break;
            }
            Err(RecvTimeoutError::Timeout) => {}
        }
    }

    state.stop();
    // Let the backend kill its speech process before the program exits
    if !state.player.wait(SHUTDOWN_GRACE) {
        warn!("Speech worker did not stop in time");
    }
    flush_output(&mut state)?;
    Ok(())
}

/// Read console lines on a thread; `None` marks end of input
fn spawn_stdin_reader() -> Receiver<Option<String>> {
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(Some(line)).is_err() {
                        return;
                    }
                }
                Err(e) => {
                    error!("stdin error: {}", e);
                    break;
                }
            }
        }
        let _ = tx.send(None);
    });

    rx
}

/// Print session events until the current session ends
fn wait_for_session(state: &mut State, events: &Receiver<SessionEvent>) -> Result<()> {
    loop {
        match events.recv_timeout(TICK) {
            Ok(event) => {
                state.handle_event(&event);
                flush_output(state)?;
                if matches!(
                    event,
                    SessionEvent::Finished | SessionEvent::Stopped | SessionEvent::Failed(_)
                ) {
                    return Ok(());
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                if !state.player.is_active() {
                    // Drain whatever the worker sent last
                    for event in events.try_iter() {
                        state.handle_event(&event);
                    }
                    return flush_output(state);
                }
            }
            Err(RecvTimeoutError::Disconnected) => return Ok(()),
        }
    }
}

fn flush_output(state: &mut State) -> Result<()> {
    let mut stdout = io::stdout().lock();
    for line in state.drain_output() {
        writeln!(stdout, "{}", line)?;
    }
    stdout.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn test_parse_flags_and_files() {
        let options = parse_args(args(&["--offline", "-d", "a.txt", "--speak", "b.txt"])).unwrap();
        assert!(options.debug);
        assert!(options.speak);
        assert!(options.backend.offline);
        assert_eq!(options.files, vec![PathBuf::from("a.txt"), PathBuf::from("b.txt")]);
    }

    #[test]
    fn test_parse_backend() {
        let options = parse_args(args(&["--backend", "espeak"])).unwrap();
        assert_eq!(options.backend.prefer, Some(BackendKind::Espeak));
        assert!(parse_args(args(&["--backend"])).is_err());
        assert!(parse_args(args(&["--backend", "festival"])).is_err());
    }

    #[test]
    fn test_unknown_option() {
        assert!(parse_args(args(&["--loud"])).is_err());
        let options = parse_args(args(&["--", "--odd-name.txt"])).unwrap();
        assert_eq!(options.files, vec![PathBuf::from("--odd-name.txt")]);
    }
}
