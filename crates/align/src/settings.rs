use serde::{Deserialize, Serialize};

/// Tuning for forward-only local search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchSettings {
    /// Reference words examined after the search start (look-ahead).
    pub window_size: usize,
    /// Minimum confidence for a candidate to move the position.
    pub confidence_threshold: f32,
    /// Largest forward advance a single match may produce; larger jumps are truncated.
    pub max_jump_distance: usize,
    /// Trailing recognized words used for the confidence check.
    pub confidence_tail_words: usize,
    /// Reference words on each side of the candidate considered for confidence.
    pub confidence_context: usize,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            window_size: 8,
            confidence_threshold: 0.5,
            max_jump_distance: 6,
            confidence_tail_words: 3,
            confidence_context: 3,
        }
    }
}

/// Tuning for whole-document relocalization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalSearchSettings {
    /// Minimum coarse window length; utterances longer than this use their own length.
    pub window_size: usize,
    /// Minimum similarity for a window to survive either pass.
    pub confidence_threshold: f32,
    /// Weight of nearness to the hint position when ranking survivors.
    pub proximity_weight: f32,
    /// Target number of coarse windows; the coarse step is `len / coarse_samples`.
    pub coarse_samples: usize,
    /// Trailing recognized words compared against the script.
    pub max_utterance_words: usize,
}

impl Default for GlobalSearchSettings {
    fn default() -> Self {
        Self {
            window_size: 8,
            confidence_threshold: 0.6,
            proximity_weight: 0.1,
            coarse_samples: 400,
            max_utterance_words: 12,
        }
    }
}
