//! Forward-only windowed matching.

use prompter_text::{edit_distance, join_words, similarity};

use crate::{MatchCandidate, MatchSettings};

/// Result of a local search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalMatch {
    /// Position to move to. Equals the search start unless `accepted`.
    pub index: usize,
    /// Best-aligned end word before thresholding and jump capping.
    pub candidate: MatchCandidate,
    /// Whether the candidate cleared the confidence threshold.
    pub accepted: bool,
}

impl LocalMatch {
    fn hold(from_index: usize, candidate: MatchCandidate) -> Self {
        Self {
            index: from_index,
            candidate,
            accepted: false,
        }
    }

    /// Words advanced past the search start.
    pub fn advance(&self, from_index: usize) -> usize {
        self.index.saturating_sub(from_index)
    }
}

/// Find where the speaker is within `reference[from_index..from_index + window_size]`.
///
/// Every prefix of the window is compared with the trailing recognized words;
/// the prefix with the smallest edit distance gives the candidate end word.
/// Confidence only looks at the last few recognized words around that
/// candidate, so a long utterance that drifted early does not inflate it.
///
/// The returned index is never below `from_index` and never more than
/// `max_jump_distance` past it.
pub fn find_local_match(
    recognized: &[String],
    reference: &[String],
    from_index: usize,
    settings: &MatchSettings,
) -> LocalMatch {
    let no_candidate = MatchCandidate {
        word_index: from_index,
        confidence: 0.0,
    };
    if recognized.is_empty() || settings.window_size == 0 || from_index >= reference.len() {
        return LocalMatch::hold(from_index, no_candidate);
    }

    let window_end = (from_index + settings.window_size).min(reference.len());
    let window = &reference[from_index..window_end];

    let tail_start = recognized.len().saturating_sub(settings.window_size);
    let spoken = join_words(&recognized[tail_start..]);

    let mut best_distance = usize::MAX;
    let mut best_len = 1;
    let mut prefix = String::new();
    for (i, word) in window.iter().enumerate() {
        if i > 0 {
            prefix.push(' ');
        }
        prefix.push_str(word);

        let distance = edit_distance(&spoken, &prefix);
        tracing::trace!(prefix_len = i + 1, distance, "local_prefix_scored");
        if distance < best_distance {
            best_distance = distance;
            best_len = i + 1;
        }
    }

    let candidate_index = from_index + best_len - 1;
    let candidate = MatchCandidate {
        word_index: candidate_index,
        confidence: tail_confidence(recognized, reference, candidate_index, settings),
    };

    tracing::debug!(
        from_index,
        candidate = candidate_index,
        distance = best_distance,
        confidence = candidate.confidence,
        "local_match_scored"
    );

    if candidate.confidence < settings.confidence_threshold || candidate_index < from_index {
        return LocalMatch::hold(from_index, candidate);
    }

    let advance = (candidate_index - from_index).min(settings.max_jump_distance);
    LocalMatch {
        index: from_index + advance,
        candidate,
        accepted: true,
    }
}

/// Best similarity between the last recognized words and equally long
/// reference spans ending within `confidence_context` words of `candidate`.
fn tail_confidence(
    recognized: &[String],
    reference: &[String],
    candidate: usize,
    settings: &MatchSettings,
) -> f32 {
    let tail_len = settings.confidence_tail_words.clamp(1, recognized.len());
    let tail = join_words(&recognized[recognized.len() - tail_len..]);

    let lo = candidate.saturating_sub(settings.confidence_context);
    let hi = (candidate + settings.confidence_context).min(reference.len() - 1);

    (lo..=hi)
        .map(|end| {
            let start = (end + 1).saturating_sub(tail_len);
            similarity(&tail, &join_words(&reference[start..=end]))
        })
        .fold(0.0, f32::max)
}
