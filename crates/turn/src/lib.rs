//! Speech-turn tracking and debouncing of noisy match candidates.
//!
//! A turn starts with any recognition event and ends after
//! `pause_threshold_ms` without one. Candidates are only collected inside a
//! turn, and a scroll decision is released only when the last few agree, so
//! a single wild match can never move the script on its own.

mod accumulator;

pub use accumulator::{AccumulatorOutcome, MatchAccumulator};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnSettings {
    /// Silence that ends a turn.
    pub pause_threshold_ms: u64,
    /// Minimum interval between processed partial results.
    pub update_frequency_ms: u64,
    /// Partial results shorter than this are ignored.
    pub min_partial_words: usize,
    /// Candidates that must agree before a decision is released.
    pub accumulator_capacity: usize,
    /// Largest `max - min` among agreeing candidates.
    pub max_spread: usize,
    /// Smallest advance counted as forward progress.
    pub min_jump: usize,
}

impl Default for TurnSettings {
    fn default() -> Self {
        Self {
            pause_threshold_ms: 1200,
            update_frequency_ms: 300,
            min_partial_words: 3,
            accumulator_capacity: 3,
            max_spread: 5,
            min_jump: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    InTurn {
        last_activity_ms: u64,
        last_processed_ms: Option<u64>,
        accumulator: MatchAccumulator,
    },
}

/// Whether a recognition event should be run through the matchers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecognitionGate {
    Process,
    /// Partial arrived within `update_frequency_ms` of the last processed one.
    Throttled,
    /// Partial with fewer than `min_partial_words` words.
    TooShort,
}

impl RecognitionGate {
    pub fn should_process(self) -> bool {
        self == RecognitionGate::Process
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnDecision {
    /// Recent candidates agree; move to this word.
    Commit(usize),
    /// Candidate buffered, waiting for agreement.
    Pending,
    /// Candidate did not move forward; not buffered.
    NoProgress,
}

#[derive(Debug)]
pub struct TurnController {
    settings: TurnSettings,
    state: TurnState,
    no_progress_count: u64,
}

impl TurnController {
    pub fn new(settings: TurnSettings) -> Self {
        Self {
            settings,
            state: TurnState::Idle,
            no_progress_count: 0,
        }
    }

    pub fn settings(&self) -> TurnSettings {
        self.settings
    }

    /// Takes effect for the next turn.
    pub fn set_settings(&mut self, settings: TurnSettings) {
        self.settings = settings;
    }

    pub fn state(&self) -> &TurnState {
        &self.state
    }

    pub fn is_in_turn(&self) -> bool {
        matches!(self.state, TurnState::InTurn { .. })
    }

    pub fn accumulator(&self) -> Option<&MatchAccumulator> {
        match &self.state {
            TurnState::InTurn { accumulator, .. } => Some(accumulator),
            TurnState::Idle => None,
        }
    }

    /// Candidates that did not advance, for diagnostics.
    pub fn no_progress_count(&self) -> u64 {
        self.no_progress_count
    }

    /// Register a recognition event and decide whether to process it.
    ///
    /// Starts a turn when idle and re-arms the silence deadline. A turn whose
    /// deadline already passed is closed first, so a late event starts fresh.
    pub fn on_recognition(&mut self, now_ms: u64, is_final: bool, word_count: usize) -> RecognitionGate {
        self.check_silence(now_ms);

        let settings = self.settings;
        let TurnState::InTurn {
            last_activity_ms,
            last_processed_ms,
            ..
        } = self.begin_turn(now_ms)
        else {
            return RecognitionGate::Process;
        };
        *last_activity_ms = now_ms;

        if is_final {
            *last_processed_ms = Some(now_ms);
            return RecognitionGate::Process;
        }

        if word_count < settings.min_partial_words {
            return RecognitionGate::TooShort;
        }

        if let Some(last) = *last_processed_ms {
            if now_ms.saturating_sub(last) < settings.update_frequency_ms {
                return RecognitionGate::Throttled;
            }
        }

        *last_processed_ms = Some(now_ms);
        RecognitionGate::Process
    }

    /// When the current turn ends if no further speech arrives.
    pub fn silence_deadline_ms(&self) -> Option<u64> {
        match self.state {
            TurnState::InTurn {
                last_activity_ms, ..
            } => Some(last_activity_ms + self.settings.pause_threshold_ms),
            TurnState::Idle => None,
        }
    }

    /// End the turn if the silence deadline has passed. Returns true on transition.
    pub fn check_silence(&mut self, now_ms: u64) -> bool {
        let Some(deadline) = self.silence_deadline_ms() else {
            return false;
        };
        if now_ms < deadline {
            return false;
        }

        let dropped = self.accumulator().map(MatchAccumulator::len).unwrap_or(0);
        tracing::debug!(now_ms, deadline, dropped_candidates = dropped, "turn_ended_on_silence");
        self.state = TurnState::Idle;
        true
    }

    /// Offer a matcher candidate relative to the committed position.
    ///
    /// `at_start` allows a candidate of 0 while nothing has been committed,
    /// so the opening word of the script can be confirmed.
    pub fn push_candidate(&mut self, candidate: usize, current: usize, at_start: bool) -> TurnDecision {
        let settings = self.settings;
        let forward = candidate >= current + settings.min_jump.max(1)
            || (at_start && candidate == 0 && current == 0);

        if !forward {
            self.no_progress_count += 1;
            tracing::trace!(candidate, current, no_progress = self.no_progress_count, "candidate_no_progress");
            return TurnDecision::NoProgress;
        }

        let TurnState::InTurn { accumulator, .. } = &mut self.state else {
            tracing::debug!(candidate, "candidate_outside_turn");
            return TurnDecision::Pending;
        };

        match accumulator.push(candidate, settings.max_spread) {
            AccumulatorOutcome::Consistent(median) => {
                tracing::debug!(median, current, "turn_candidates_agree");
                TurnDecision::Commit(median)
            }
            AccumulatorOutcome::Inconsistent { dropped, spread } => {
                tracing::debug!(dropped, spread, max_spread = settings.max_spread, "turn_candidates_disagree");
                TurnDecision::Pending
            }
            AccumulatorOutcome::Waiting => TurnDecision::Pending,
        }
    }

    /// Drop buffered candidates without ending the turn.
    pub fn clear_accumulator(&mut self) {
        if let TurnState::InTurn { accumulator, .. } = &mut self.state {
            accumulator.clear();
        }
    }

    /// Back to idle with counters cleared.
    pub fn reset(&mut self) {
        self.state = TurnState::Idle;
        self.no_progress_count = 0;
    }

    fn begin_turn(&mut self, now_ms: u64) -> &mut TurnState {
        if matches!(self.state, TurnState::Idle) {
            tracing::debug!(now_ms, "turn_started");
            self.state = TurnState::InTurn {
                last_activity_ms: now_ms,
                last_processed_ms: None,
                accumulator: MatchAccumulator::new(self.settings.accumulator_capacity),
            };
        }
        &mut self.state
    }
}

impl Default for TurnController {
    fn default() -> Self {
        Self::new(TurnSettings::default())
    }
}
