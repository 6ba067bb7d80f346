//! Text primitives shared by every matcher.
//!
//! - `tokenizer`: lossless split of script/utterance text into words and delimiters
//! - `similarity`: edit distance and the normalized similarity ratio built on it
//!
//! The reference script and each recognized utterance go through the same
//! functions so their word sequences are directly comparable.

mod similarity;
mod tokenizer;

pub use similarity::{edit_distance, similarity};
pub use tokenizer::{join_words, tokenize, word_tokens, ElementKind, TextElement};
