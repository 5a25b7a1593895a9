//! Sentence chunking
//!
//! Text is split at sentence ends and packed into chunks small enough to
//! synthesize quickly (a cloud request for one chunk takes a second or two).

use once_cell::sync::Lazy;
use regex::Regex;

/// Maximum characters per chunk
pub const CHUNK_SIZE: usize = 180;

/// Sentence terminator followed by whitespace
static SENTENCE_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]\s+").expect("sentence regex is valid"));

/// Split text into sentences, keeping the terminator with its sentence
pub fn split_sentences(text: &str) -> Vec<&str> {
    let text = text.trim();
    let mut sentences = Vec::new();
    let mut start = 0;

    for m in SENTENCE_END.find_iter(text) {
        // Terminator is a single ASCII byte
        let end = m.start() + 1;
        sentences.push(text[start..end].trim());
        start = m.end();
    }
    if start < text.len() {
        sentences.push(text[start..].trim());
    }

    sentences.retain(|s| !s.is_empty());
    sentences
}

/// Split text into chunks of at most [`CHUNK_SIZE`] characters
///
/// Short sentences are joined into a single chunk. A sentence longer than the
/// limit is broken at word boundaries. Every word of the input appears
/// exactly once, in order.
pub fn split_chunks(text: &str) -> Vec<String> {
    split_chunks_with(text, CHUNK_SIZE)
}

/// [`split_chunks`] with an explicit limit
pub fn split_chunks_with(text: &str, limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for sentence in split_sentences(text) {
        let sentence_len = char_len(sentence);

        if char_len(&current) + sentence_len + 1 <= limit {
            append_word(&mut current, sentence);
            continue;
        }

        if !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }

        if sentence_len > limit {
            chunks.extend(pack_words(sentence, limit));
        } else {
            current = sentence.to_string();
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Pack whitespace-separated words into pieces of at most `limit` characters
///
/// A single word longer than `limit` becomes a piece of its own.
pub fn pack_words(text: &str, limit: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut buf = String::new();

    for word in text.split_whitespace() {
        if char_len(&buf) + char_len(word) + 1 <= limit {
            append_word(&mut buf, word);
        } else {
            if !buf.is_empty() {
                pieces.push(std::mem::take(&mut buf));
            }
            buf = word.to_string();
        }
    }

    if !buf.is_empty() {
        pieces.push(buf);
    }

    pieces
}

fn append_word(buf: &mut String, word: &str) {
    if !buf.is_empty() {
        buf.push(' ');
    }
    buf.push_str(word);
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}
