//! Chunking tests
//!
//! Chunks must cover the text exactly: no word lost, none repeated, order
//! kept, and no chunk above the limit unless a single word is.

use wspeech::text::chunker::split_chunks_with;
use wspeech::text::{split_chunks, CHUNK_SIZE};

fn words(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

fn chunk_words(chunks: &[String]) -> Vec<String> {
    chunks
        .iter()
        .flat_map(|c| c.split_whitespace().map(str::to_string))
        .collect()
}

const ARTICLE: &str = "The quick brown fox jumps over the lazy dog. \
    Is that really all there is to it? No! There is a great deal more, \
    including a rather long sentence that keeps going well past the point \
    where any reasonable chunk would have ended, because it lists apples, \
    pears, plums, cherries, apricots, peaches, grapes, melons and figs \
    without ever taking a breath or reaching a full stop until right here. \
    Short one. Another.";

#[test]
fn test_words_are_preserved_in_order() {
    let chunks = split_chunks(ARTICLE);
    assert_eq!(chunk_words(&chunks), words(ARTICLE));
}

#[test]
fn test_chunks_respect_limit() {
    for limit in [20, 50, 100, CHUNK_SIZE] {
        let chunks = split_chunks_with(ARTICLE, limit);
        assert_eq!(chunk_words(&chunks), words(ARTICLE), "limit {}", limit);
        for chunk in &chunks {
            assert!(
                chunk.chars().count() <= limit,
                "chunk of {} chars over limit {}: {:?}",
                chunk.chars().count(),
                limit,
                chunk
            );
            assert!(!chunk.trim().is_empty());
        }
    }
}

#[test]
fn test_oversized_word_is_kept_whole() {
    let long = "x".repeat(30);
    let text = format!("Start {} end.", long);
    let chunks = split_chunks_with(&text, 10);
    assert!(chunks.contains(&long));
    assert_eq!(chunk_words(&chunks), words(&text));
}

#[test]
fn test_multibyte_text_measured_in_chars() {
    let text = "Über naïve café déjà vu. Ünïcödé wörds everywhere here.";
    let chunks = split_chunks_with(text, 30);
    assert_eq!(chunk_words(&chunks), words(text));
    assert!(chunks.iter().all(|c| c.chars().count() <= 30));
}

#[test]
fn test_blank_text_has_no_chunks() {
    assert!(split_chunks("").is_empty());
    assert!(split_chunks("   \n\t ").is_empty());
}
