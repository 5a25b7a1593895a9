//! Text preparation for synthesis

pub mod chunker;

pub use chunker::{pack_words, split_chunks, split_sentences, CHUNK_SIZE};
