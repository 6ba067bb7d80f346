//! Whole-document relocalization.

use prompter_text::{join_words, similarity};

use crate::GlobalSearchSettings;

/// Fewer recognized words than this carry too little signal to place globally.
pub const MIN_GLOBAL_WORDS: usize = 2;

/// Winning window of a global search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobalMatch {
    /// First reference word of the matched span.
    pub word_index: usize,
    /// Similarity of the span to the utterance.
    pub confidence: f32,
    /// `confidence` plus the proximity bonus used for ranking.
    pub score: f32,
}

/// Locate the utterance anywhere in `reference`, preferring spans near `hint`.
///
/// Only the trailing `max_utterance_words` recognized words take part, so the
/// cost stays flat however long the utterance grows. The returned index is
/// the first reference word of the span matching those words.
///
/// A coarse pass samples windows across the document at a step proportional
/// to its length; each window is scored by its best utterance-length sub-span,
/// and windows reach far enough that every reference start belongs to one.
/// Surviving windows are refined with a step-1 search around them, then
/// ranked by confidence plus a bonus for nearness to `hint`.
///
/// Returns `None` when the utterance has fewer than [`MIN_GLOBAL_WORDS`]
/// words or nothing clears the confidence threshold.
pub fn find_global_position(
    recognized: &[String],
    reference: &[String],
    hint: usize,
    settings: &GlobalSearchSettings,
) -> Option<GlobalMatch> {
    if recognized.len() < MIN_GLOBAL_WORDS || reference.is_empty() {
        return None;
    }

    let tail_len = settings.max_utterance_words.max(MIN_GLOBAL_WORDS);
    let recognized = &recognized[recognized.len().saturating_sub(tail_len)..];
    let word_count = recognized.len();
    let spoken = join_words(recognized);
    let len = reference.len();
    let window = word_count.max(settings.window_size);
    let step = (len / settings.coarse_samples.max(1)).clamp(1, window);

    let span_score = |start: usize| -> f32 {
        let end = (start + word_count).min(len);
        similarity(&spoken, &join_words(&reference[start..end]))
    };

    // Sub-span starts scored per coarse window; at least `step` so that no
    // start falls between two windows.
    let reach = (window - word_count).max(step - 1);
    let last_possible = len.saturating_sub(word_count);

    let mut anchors = Vec::new();
    for window_start in (0..len).step_by(step) {
        let last_start = (window_start + reach).min(last_possible).max(window_start);
        let best = (window_start..=last_start)
            .map(|start| (start, span_score(start)))
            .fold((window_start, 0.0f32), |best, scored| {
                if scored.1 > best.1 {
                    scored
                } else {
                    best
                }
            });
        if best.1 >= settings.confidence_threshold {
            anchors.push(best.0);
        }
    }

    tracing::debug!(
        words = word_count,
        reference_len = len,
        step,
        anchors = anchors.len(),
        "global_coarse_pass"
    );

    let mut refined: Vec<(usize, f32)> = Vec::new();
    for anchor in anchors {
        let lo = anchor.saturating_sub(step);
        let hi = (anchor + step).min(len - 1);
        let mut best = (anchor, span_score(anchor));
        for start in lo..=hi {
            let score = span_score(start);
            if score > best.1 {
                best = (start, score);
            }
        }
        if best.1 >= settings.confidence_threshold && !refined.iter().any(|r| r.0 == best.0) {
            refined.push(best);
        }
    }

    let winner = refined
        .into_iter()
        .map(|(word_index, confidence)| GlobalMatch {
            word_index,
            confidence,
            score: confidence + settings.proximity_weight * proximity(word_index, hint, len),
        })
        .fold(None, |best: Option<GlobalMatch>, candidate| match best {
            Some(b) if b.score >= candidate.score => Some(b),
            _ => Some(candidate),
        });

    match winner {
        Some(m) => tracing::debug!(
            word_index = m.word_index,
            confidence = m.confidence,
            score = m.score,
            hint,
            "global_match_found"
        ),
        None => tracing::debug!(hint, "global_match_none"),
    }

    winner
}

/// 1 at the hint, falling linearly to 0 at a full document away.
fn proximity(index: usize, hint: usize, len: usize) -> f32 {
    let distance = index.abs_diff(hint) as f32;
    (1.0 - distance / len as f32).clamp(0.0, 1.0)
}
