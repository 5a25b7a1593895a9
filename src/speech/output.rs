//! Audio output for fetched speech
//!
//! Cloud backends produce encoded audio (MP3) that has to be decoded and
//! played locally. The player thread drives an [`AudioOutput`] one chunk at a
//! time and polls it for completion.

use crate::{Result, WspeechError};
use log::debug;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use std::io::Cursor;

/// Something that can play one encoded audio clip at a time
///
/// Implementations are created on the thread that uses them, so they need
/// not be `Send`.
pub trait AudioOutput {
    /// Start playing a clip, replacing anything currently playing
    fn play(&mut self, audio: Vec<u8>) -> Result<()>;

    fn pause(&mut self);

    fn resume(&mut self);

    /// Stop playback and drop the current clip
    fn stop(&mut self);

    /// True once the current clip has played to the end
    fn is_finished(&self) -> bool;
}

/// Creates an output on the calling thread
pub type OutputFactory = std::sync::Arc<dyn Fn() -> Result<Box<dyn AudioOutput>> + Send + Sync>;

/// Output through the default sound device via rodio
pub struct RodioOutput {
    // Dropping the stream silences the sink
    _stream: OutputStream,
    handle: OutputStreamHandle,
    sink: Option<Sink>,
}

impl RodioOutput {
    /// Open the default output device
    pub fn new() -> Result<Self> {
        let (stream, handle) = OutputStream::try_default()
            .map_err(|e| WspeechError::Audio(format!("No audio output device: {}", e)))?;

        Ok(Self {
            _stream: stream,
            handle,
            sink: None,
        })
    }

    /// Check whether an output device can be opened at all
    pub fn probe() -> Result<()> {
        Self::new().map(|_| ())
    }

    /// Factory creating a fresh rodio output on the worker thread
    pub fn factory() -> OutputFactory {
        std::sync::Arc::new(|| Ok(Box::new(RodioOutput::new()?) as Box<dyn AudioOutput>))
    }
}

impl AudioOutput for RodioOutput {
    fn play(&mut self, audio: Vec<u8>) -> Result<()> {
        self.stop();

        let source = Decoder::new(Cursor::new(audio))
            .map_err(|e| WspeechError::Audio(format!("Cannot decode audio: {}", e)))?;
        let sink = Sink::try_new(&self.handle)
            .map_err(|e| WspeechError::Audio(format!("Cannot open sink: {}", e)))?;
        sink.append(source);
        debug!("Playback started");

        self.sink = Some(sink);
        Ok(())
    }

    fn pause(&mut self) {
        if let Some(sink) = &self.sink {
            sink.pause();
        }
    }

    fn resume(&mut self) {
        if let Some(sink) = &self.sink {
            sink.play();
        }
    }

    fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }

    fn is_finished(&self) -> bool {
        self.sink.as_ref().map_or(true, Sink::empty)
    }
}
