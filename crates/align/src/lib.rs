//! Position search over a tokenized reference script.
//!
//! Two strategies share the similarity core from `prompter-text`:
//! - `find_local_match`: forward-only search in a short window after the
//!   last committed word. Cheap, runs on every accepted utterance.
//! - `find_global_position`: coarse-then-fine scan of the whole script,
//!   biased toward a hint position. Used to (re)establish position.
//!
//! Both take the recognized utterance already split with
//! `prompter_text::word_tokens` so the caller tokenizes once per utterance.

mod global;
mod local;
mod settings;

pub use global::{find_global_position, GlobalMatch, MIN_GLOBAL_WORDS};
pub use local::{find_local_match, LocalMatch};
pub use settings::{GlobalSearchSettings, MatchSettings};

use serde::{Deserialize, Serialize};

/// Output of a single scoring pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub word_index: usize,
    /// Similarity in `[0, 1]`.
    pub confidence: f32,
}
