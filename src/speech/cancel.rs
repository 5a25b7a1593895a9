//! Shared playback control: stop flag, pause gate and live settings
//!
//! One `PlaybackControl` is created per session and shared between the
//! front end and the worker threads. The front end flips flags; workers
//! observe them between reads, polls and chunks.

use crate::state::settings::Settings;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex, RwLock};
use std::time::Duration;

/// How often workers re-check the flags while waiting
pub const POLL_INTERVAL: Duration = Duration::from_millis(40);

pub struct PlaybackControl {
    cancelled: AtomicBool,
    paused: Mutex<bool>,
    resumed: Condvar,
    settings: RwLock<Settings>,
}

impl PlaybackControl {
    pub fn new(settings: Settings) -> Self {
        Self {
            cancelled: AtomicBool::new(false),
            paused: Mutex::new(false),
            resumed: Condvar::new(),
            settings: RwLock::new(settings),
        }
    }

    /// Request the session to stop and wake anything waiting on the pause gate
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        if let Ok(mut paused) = self.paused.lock() {
            *paused = false;
        }
        self.resumed.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn set_paused(&self, value: bool) {
        if let Ok(mut paused) = self.paused.lock() {
            *paused = value;
        }
        if !value {
            self.resumed.notify_all();
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused.lock().map(|p| *p).unwrap_or(false)
    }

    /// Block while paused; returns false if the session was cancelled
    pub fn wait_while_paused(&self) -> bool {
        let Ok(mut paused) = self.paused.lock() else {
            return !self.is_cancelled();
        };
        while *paused && !self.is_cancelled() {
            paused = match self.resumed.wait_timeout(paused, POLL_INTERVAL) {
                Ok((guard, _)) => guard,
                Err(_) => return !self.is_cancelled(),
            };
        }
        !self.is_cancelled()
    }

    /// Current settings snapshot
    pub fn settings(&self) -> Settings {
        self.settings
            .read()
            .map(|s| *s)
            .unwrap_or_default()
    }

    /// Replace the settings used by chunks that haven't started yet
    pub fn update_settings(&self, settings: Settings) {
        if let Ok(mut current) = self.settings.write() {
            *current = settings;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn test_cancel_releases_pause() {
        let control = Arc::new(PlaybackControl::new(Settings::default()));
        control.set_paused(true);

        let waiter = {
            let control = Arc::clone(&control);
            thread::spawn(move || control.wait_while_paused())
        };

        thread::sleep(Duration::from_millis(50));
        let start = Instant::now();
        control.cancel();
        assert!(!waiter.join().unwrap());
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[test]
    fn test_not_paused_passes_through() {
        let control = PlaybackControl::new(Settings::default());
        assert!(control.wait_while_paused());
    }
}
