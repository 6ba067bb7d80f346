//! Alignment service: the one owner of tracking state.
//!
//! Wires the components together:
//! - tokenized script + `WordPositionProvider` (rebuilt on content/layout change)
//! - local and global position search
//! - `TurnController` for debouncing
//! - `ScrollAnimator` for the emitted scroll target
//!
//! All inputs carry an explicit `now_ms`, so the service itself never reads a
//! clock. `AlignmentDriver` supplies time and serializes inputs in production.

mod session;

pub use session::AlignmentStats;

use prompter_align::{find_global_position, find_local_match, GlobalMatch};
use prompter_events::{
    emit_event, event_names, EventBusRef, MatchSource, RecognizedTextEvent, RecognizerErrorEvent,
    ScrollFrameEvent, StatusChangedEvent, TrackingStatus, WordMatchEvent,
};
use prompter_scroll::{LayoutContext, ScrollAnimator, ScrollCommand, Viewport, WordPositionProvider};
use prompter_text::word_tokens;
use prompter_turn::{TurnDecision, TurnState};
use uuid::Uuid;

use crate::error::{AlignmentError, Result};
use crate::settings::AlignmentSettings;
use crate::speech::{RecognizerError, SpeechEvent, SpeechSource};
use session::Session;

struct Script {
    words: Vec<String>,
    positions: Box<dyn WordPositionProvider>,
}

pub struct AlignmentService {
    settings: AlignmentSettings,
    source: Box<dyn SpeechSource>,
    bus: EventBusRef,
    script: Option<Script>,
    viewport: Viewport,
    animator: ScrollAnimator,
    session: Session,
    status: TrackingStatus,
}

impl AlignmentService {
    pub fn new(settings: AlignmentSettings, source: Box<dyn SpeechSource>, bus: EventBusRef) -> Self {
        Self {
            session: Session::new(settings.turn, 0),
            animator: ScrollAnimator::new(settings.scroll),
            settings,
            source,
            bus,
            script: None,
            viewport: Viewport::default(),
            status: TrackingStatus::Off,
        }
    }

    // --- State queries ---

    pub fn settings(&self) -> &AlignmentSettings {
        &self.settings
    }

    pub fn status(&self) -> TrackingStatus {
        self.status
    }

    pub fn session_id(&self) -> Uuid {
        self.session.id
    }

    pub fn current_word_index(&self) -> usize {
        self.session.current_word_index
    }

    pub fn word_count(&self) -> usize {
        self.script.as_ref().map(|s| s.words.len()).unwrap_or(0)
    }

    pub fn needs_global_search(&self) -> bool {
        self.session.needs_global_search
    }

    pub fn consecutive_failed_matches(&self) -> u32 {
        self.session.consecutive_failed_matches
    }

    pub fn stats(&self) -> AlignmentStats {
        self.session.stats()
    }

    pub fn turn_state(&self) -> &TurnState {
        self.session.turn.state()
    }

    pub fn is_in_turn(&self) -> bool {
        self.session.turn.is_in_turn()
    }

    /// When the current speech turn ends if nothing else is heard.
    pub fn silence_deadline_ms(&self) -> Option<u64> {
        self.session.turn.silence_deadline_ms()
    }

    pub fn scroll_offset(&self) -> f64 {
        self.animator.current_offset()
    }

    pub fn is_animating(&self) -> bool {
        self.animator.is_animating()
    }

    /// Replace tuning. Turn settings apply from the next turn.
    pub fn set_settings(&mut self, settings: AlignmentSettings) -> Result<()> {
        settings.validate()?;
        self.settings = settings;
        self.session.turn.set_settings(settings.turn);
        self.animator.set_settings(settings.scroll);
        Ok(())
    }

    // --- Content and layout ---

    /// Load a new script. Discards the current session.
    pub fn initialize(&mut self, reference_text: &str, layout: LayoutContext, viewport: Viewport) {
        let words = word_tokens(reference_text);
        let positions = layout.into_provider(words.len());
        tracing::info!(words = words.len(), "script_initialized");

        self.script = Some(Script { words, positions });
        self.viewport = viewport;
        self.animator.set_current_offset(viewport.scroll_top);
        self.replace_session(self.hint_word());
    }

    /// Rebuild the word-position map after a re-render. Session state is kept.
    pub fn update_layout(&mut self, layout: LayoutContext) {
        if let Some(script) = &mut self.script {
            script.positions = layout.into_provider(script.words.len());
            tracing::debug!(words = script.words.len(), "layout_updated");
        }
    }

    /// Host scroll or resize. Adopted as the current offset unless a
    /// transition of ours is in flight.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        if !self.animator.is_animating() {
            self.animator.set_current_offset(viewport.scroll_top);
        }
    }

    // --- Lifecycle ---

    /// Start tracking with a fresh session that relocalizes on the first utterance.
    pub fn start(&mut self) -> Result<()> {
        if self.script.is_none() {
            return Err(AlignmentError::NotInitialized);
        }
        if self.status == TrackingStatus::Listening {
            return Ok(());
        }

        self.session = Session::new(self.settings.turn, self.hint_word());
        self.set_status(TrackingStatus::Initializing);

        match self.source.start() {
            Ok(()) => {
                tracing::info!(
                    source = self.source.name(),
                    session_id = %self.session.id,
                    start_index = self.session.current_word_index,
                    "tracking_started"
                );
                self.set_status(TrackingStatus::Listening);
                Ok(())
            }
            Err(e) => {
                self.set_status(TrackingStatus::Error);
                self.on_recognizer_error(&e);
                Err(e.into())
            }
        }
    }

    /// Stop tracking: cancel animation and the turn, require relocalization on restart.
    pub fn stop(&mut self) {
        if self.status == TrackingStatus::Off {
            return;
        }
        self.source.stop();
        self.animator.cancel();
        self.session.turn.reset();
        self.session.needs_global_search = true;

        tracing::info!(
            session_id = %self.session.id,
            word_index = self.session.current_word_index,
            "tracking_stopped"
        );
        self.set_status(TrackingStatus::Off);
    }

    pub fn toggle(&mut self) -> Result<TrackingStatus> {
        match self.status {
            TrackingStatus::Listening | TrackingStatus::Initializing => self.stop(),
            TrackingStatus::Off | TrackingStatus::Error => self.start()?,
        }
        Ok(self.status)
    }

    /// Back to the first word with all session state cleared.
    pub fn reset(&mut self, now_ms: u64) -> Option<WordMatchEvent> {
        let previous = self.session.current_word_index;
        self.replace_session(0);
        tracing::info!(previous, "tracking_reset");

        if self.word_count() == 0 {
            return None;
        }
        Some(self.scroll_and_emit(0, previous, MatchSource::Manual, now_ms))
    }

    /// Explicit reposition by the host (click-to-jump, manual scroll sync).
    pub fn jump_to_word(&mut self, word_index: usize, now_ms: u64) -> Option<WordMatchEvent> {
        let count = self.word_count();
        if count == 0 {
            return None;
        }
        let word_index = word_index.min(count - 1);
        let jump = word_index.abs_diff(self.session.current_word_index);

        self.session.turn.clear_accumulator();
        self.session.commit(word_index);
        Some(self.scroll_and_emit(word_index, jump, MatchSource::Manual, now_ms))
    }

    // --- Inputs ---

    pub fn on_speech_event(&mut self, event: SpeechEvent, now_ms: u64) -> Option<WordMatchEvent> {
        match event {
            SpeechEvent::Result { text, is_final } => self.on_recognition(&text, is_final, now_ms),
            SpeechEvent::Error(error) => {
                self.on_recognizer_error(&error);
                None
            }
        }
    }

    /// Process one recognizer result. Returns the committed position when
    /// this result caused one.
    pub fn on_recognition(&mut self, text: &str, is_final: bool, now_ms: u64) -> Option<WordMatchEvent> {
        if self.status != TrackingStatus::Listening {
            tracing::trace!(status = %self.status, "recognition_ignored");
            return None;
        }

        emit_event(
            self.bus.as_ref(),
            event_names::RECOGNIZED_TEXT,
            &RecognizedTextEvent {
                session_id: self.session.id,
                text: text.to_string(),
                is_final,
            },
        );
        self.session.stats.utterances_received += 1;

        let words = word_tokens(text);
        let gate = self.session.turn.on_recognition(now_ms, is_final, words.len());
        if !gate.should_process() || words.is_empty() {
            tracing::trace!(?gate, words = words.len(), is_final, "recognition_skipped");
            return None;
        }
        self.session.stats.utterances_processed += 1;

        if self
            .session
            .wants_global_search(self.settings.global_search_after_failures)
        {
            if let Some(found) = self.search_global(&words) {
                return Some(self.apply_global(found, now_ms));
            }
        }

        self.advance_local(&words, now_ms)
    }

    /// Forward an adapter failure unchanged.
    pub fn on_recognizer_error(&mut self, error: &RecognizerError) {
        tracing::warn!(
            source = self.source.name(),
            code = %error.code,
            message = %error.message,
            "recognizer_error"
        );
        emit_event(
            self.bus.as_ref(),
            event_names::RECOGNIZER_ERROR,
            &RecognizerErrorEvent {
                session_id: self.session.id,
                code: error.code,
                message: error.message.clone(),
            },
        );
    }

    /// Timer/frame callback: closes a silent turn and advances the scroll
    /// transition. Returns the new offset while animating.
    pub fn tick(&mut self, now_ms: u64) -> Option<f64> {
        if self.session.turn.check_silence(now_ms) {
            tracing::debug!(
                session_id = %self.session.id,
                word_index = self.session.current_word_index,
                "speech_turn_closed"
            );
        }

        let offset = self.animator.tick(now_ms)?;
        emit_event(
            self.bus.as_ref(),
            event_names::SCROLL_FRAME,
            &ScrollFrameEvent {
                session_id: self.session.id,
                offset,
            },
        );
        Some(offset)
    }

    // --- Private helpers ---

    fn search_global(&mut self, words: &[String]) -> Option<GlobalMatch> {
        let hint = self.hint_word();
        let script = self.script.as_ref()?;
        self.session.stats.global_searches += 1;

        let found = find_global_position(words, &script.words, hint, &self.settings.global_search);
        if found.is_none() {
            tracing::debug!(
                hint,
                words = words.len(),
                failures = self.session.consecutive_failed_matches,
                "global_search_failed"
            );
        }
        found
    }

    fn apply_global(&mut self, found: GlobalMatch, now_ms: u64) -> WordMatchEvent {
        let previous = self.session.current_word_index;
        tracing::info!(
            from = previous,
            to = found.word_index,
            confidence = found.confidence,
            "global_relocalized"
        );

        self.session.stats.global_matches += 1;
        self.session.turn.clear_accumulator();
        self.session.commit(found.word_index);
        self.scroll_and_emit(
            found.word_index,
            found.word_index.abs_diff(previous),
            MatchSource::Global,
            now_ms,
        )
    }

    fn advance_local(&mut self, words: &[String], now_ms: u64) -> Option<WordMatchEvent> {
        let current = self.session.current_word_index;
        let local = {
            let script = self.script.as_ref()?;
            find_local_match(words, &script.words, current, &self.settings.matching)
        };

        if !local.accepted {
            self.session.consecutive_failed_matches += 1;
            self.session.stats.local_rejected += 1;
            tracing::debug!(
                current,
                confidence = local.candidate.confidence,
                failures = self.session.consecutive_failed_matches,
                "local_match_rejected"
            );
            return None;
        }

        self.session.stats.local_accepted += 1;
        self.session.consecutive_failed_matches = 0;

        let at_start = !self.session.has_committed;
        match self.session.turn.push_candidate(local.index, current, at_start) {
            TurnDecision::Commit(word_index) => {
                self.session.commit(word_index);
                Some(self.scroll_and_emit(
                    word_index,
                    word_index.abs_diff(current),
                    MatchSource::Local,
                    now_ms,
                ))
            }
            TurnDecision::Pending | TurnDecision::NoProgress => None,
        }
    }

    fn scroll_and_emit(
        &mut self,
        word_index: usize,
        jump_words: usize,
        source: MatchSource,
        now_ms: u64,
    ) -> WordMatchEvent {
        let target = self
            .scroll_target(word_index)
            .unwrap_or_else(|| self.animator.current_offset());
        let command = self.animator.scroll_to(target, jump_words, now_ms);

        let event = WordMatchEvent {
            session_id: self.session.id,
            word_index,
            target_scroll_offset: target,
            source,
        };
        tracing::debug!(
            word_index,
            target = command.target(),
            animated = matches!(command, ScrollCommand::Animate(_)),
            jump_words,
            ?source,
            "word_match_committed"
        );
        emit_event(self.bus.as_ref(), event_names::WORD_MATCH, &event);
        event
    }

    fn scroll_target(&self, word_index: usize) -> Option<f64> {
        let offset = self.script.as_ref()?.positions.offset_of(word_index)?;
        Some(self.animator.target_for(offset, self.viewport.height))
    }

    /// Word at the reading line of the current viewport.
    fn hint_word(&self) -> usize {
        let Some(script) = &self.script else {
            return 0;
        };
        let reading_line = self.viewport.scroll_top
            + self.viewport.height * self.settings.scroll.scroll_position_percent;
        script
            .positions
            .word_at_offset(reading_line)
            .min(script.words.len().saturating_sub(1))
    }

    /// Swap in a fresh session. Live status is re-announced under the new id.
    fn replace_session(&mut self, start_index: usize) {
        self.session = Session::new(self.settings.turn, start_index);
        if self.status != TrackingStatus::Off {
            self.emit_status();
        }
    }

    fn set_status(&mut self, status: TrackingStatus) {
        if self.status == status {
            return;
        }
        tracing::debug!(from = %self.status, to = %status, "tracking_status_changed");
        self.status = status;
        self.emit_status();
    }

    fn emit_status(&self) {
        emit_event(
            self.bus.as_ref(),
            event_names::STATUS,
            &StatusChangedEvent {
                session_id: self.session.id,
                status: self.status,
            },
        );
    }
}

#[cfg(test)]
mod tests;
