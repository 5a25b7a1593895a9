//! Cloud backend using the Google Translate speech endpoint
//!
//! Produces MP3 audio for each chunk. Audio is fetched at normal speed and
//! played locally, with speed applied afterwards by the tempo filter.
//! The endpoint only accepts short requests, so longer chunks are sent as
//! several requests whose MP3 streams are concatenated.

use crate::speech::cancel::PlaybackControl;
use crate::speech::output::OutputFactory;
use crate::speech::tempo::AudioFilter;
use crate::speech::AudioFetcher;
use crate::state::settings::Voice;
use crate::text::pack_words;
use crate::{Result, WspeechError};
use log::debug;
use reqwest::blocking::Client;
use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

const ENDPOINT: &str = "https://translate.google.com/translate_tts";
/// Longest text accepted by one request
pub const MAX_REQUEST_CHARS: usize = 100;
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/120.0 Safari/537.36";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);
const READ_BUF: usize = 8 * 1024;

/// Google Translate TTS client
///
/// The service has a single English voice, so the voice selection only
/// affects the offline backends.
pub struct GoogleTts {
    client: Client,
    endpoint: String,
    lang: String,
}

impl GoogleTts {
    pub fn new() -> Result<Self> {
        Self::with_endpoint(ENDPOINT)
    }

    /// Client talking to a different endpoint (used by tests and mirrors)
    pub fn with_endpoint(endpoint: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            lang: "en".to_string(),
        })
    }

    /// Query parameters for one request
    fn query(&self, text: &str, idx: usize, total: usize) -> Vec<(&'static str, String)> {
        vec![
            ("ie", "UTF-8".to_string()),
            ("q", text.to_string()),
            ("tl", self.lang.clone()),
            ("client", "tw-ob".to_string()),
            ("ttsspeed", "1".to_string()),
            ("total", total.to_string()),
            ("idx", idx.to_string()),
            ("textlen", text.chars().count().to_string()),
        ]
    }

    /// Fetch one request worth of audio, appending it to `out`
    fn fetch_piece(
        &self,
        text: &str,
        idx: usize,
        total: usize,
        control: &PlaybackControl,
        out: &mut Vec<u8>,
    ) -> Result<()> {
        let mut response = self
            .client
            .get(&self.endpoint)
            .query(&self.query(text, idx, total))
            .send()?
            .error_for_status()?;

        let mut buf = [0u8; READ_BUF];
        loop {
            if control.is_cancelled() {
                debug!("Cloud fetch aborted");
                return Err(WspeechError::Cancelled);
            }
            let n = response.read(&mut buf)?;
            if n == 0 {
                return Ok(());
            }
            out.extend_from_slice(&buf[..n]);
        }
    }
}

impl AudioFetcher for GoogleTts {
    fn name(&self) -> &str {
        "Google TTS"
    }

    fn fetch(&self, text: &str, _voice: Voice, control: &PlaybackControl) -> Result<Vec<u8>> {
        let pieces = pack_words(text, MAX_REQUEST_CHARS);
        let mut audio = Vec::new();

        for (idx, piece) in pieces.iter().enumerate() {
            if control.is_cancelled() {
                return Err(WspeechError::Cancelled);
            }
            debug!("Fetching piece {}/{} ({} chars)", idx + 1, pieces.len(), piece.len());
            self.fetch_piece(piece, idx, pieces.len(), control, &mut audio)?;
        }

        if audio.is_empty() {
            return Err(WspeechError::Speech("empty audio from cloud service".to_string()));
        }

        Ok(audio)
    }
}

/// Everything the session needs to run the fetch → tempo → play pipeline
pub struct CloudBackend {
    pub fetcher: Arc<dyn AudioFetcher>,
    pub filter: Arc<dyn AudioFilter>,
    pub output: OutputFactory,
}

impl CloudBackend {
    pub fn new(
        fetcher: Arc<dyn AudioFetcher>,
        filter: Arc<dyn AudioFilter>,
        output: OutputFactory,
    ) -> Self {
        Self {
            fetcher,
            filter,
            output,
        }
    }

    pub fn name(&self) -> &str {
        self.fetcher.name()
    }
}
