//! Per-session mutable state. Owned exclusively by `AlignmentService`.

use prompter_turn::{TurnController, TurnSettings};
use serde::Serialize;
use uuid::Uuid;

/// Diagnostic counters for one tracking session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AlignmentStats {
    pub utterances_received: u64,
    pub utterances_processed: u64,
    pub local_accepted: u64,
    pub local_rejected: u64,
    pub global_searches: u64,
    pub global_matches: u64,
    pub commits: u64,
    /// Accepted candidates that did not advance past the committed word.
    pub no_progress: u64,
}

#[derive(Debug)]
pub(crate) struct Session {
    pub id: Uuid,
    /// Last committed word. Only moves backward on global relocalization or
    /// an explicit reposition.
    pub current_word_index: usize,
    pub consecutive_failed_matches: u32,
    pub needs_global_search: bool,
    pub has_committed: bool,
    pub turn: TurnController,
    pub stats: AlignmentStats,
}

impl Session {
    pub fn new(turn: TurnSettings, start_index: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            current_word_index: start_index,
            consecutive_failed_matches: 0,
            needs_global_search: true,
            has_committed: false,
            turn: TurnController::new(turn),
            stats: AlignmentStats::default(),
        }
    }

    /// Whether the next processed utterance should search the whole script.
    pub fn wants_global_search(&self, failure_limit: u32) -> bool {
        self.needs_global_search || self.consecutive_failed_matches > failure_limit
    }

    pub fn commit(&mut self, word_index: usize) {
        self.current_word_index = word_index;
        self.consecutive_failed_matches = 0;
        self.needs_global_search = false;
        self.has_committed = true;
        self.stats.commits += 1;
    }

    pub fn stats(&self) -> AlignmentStats {
        AlignmentStats {
            no_progress: self.turn.no_progress_count(),
            ..self.stats
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_requires_global_search() {
        let session = Session::new(TurnSettings::default(), 0);
        assert!(session.wants_global_search(8));
        assert!(!session.has_committed);
        assert!(!session.turn.is_in_turn());
    }

    #[test]
    fn test_failures_escalate_past_limit() {
        let mut session = Session::new(TurnSettings::default(), 0);
        session.commit(3);
        session.consecutive_failed_matches = 8;
        assert!(!session.wants_global_search(8));
        session.consecutive_failed_matches = 9;
        assert!(session.wants_global_search(8));
    }

    #[test]
    fn test_commit_resets_failures() {
        let mut session = Session::new(TurnSettings::default(), 0);
        session.consecutive_failed_matches = 4;
        session.commit(7);
        assert_eq!(session.current_word_index, 7);
        assert_eq!(session.consecutive_failed_matches, 0);
        assert_eq!(session.stats().commits, 1);
    }

    #[test]
    fn test_sessions_get_distinct_ids() {
        let a = Session::new(TurnSettings::default(), 0);
        let b = Session::new(TurnSettings::default(), 0);
        assert_ne!(a.id, b.id);
    }
}
