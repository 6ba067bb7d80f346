use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use prompter_events::{event_names, InMemoryEventBus, MatchSource, TrackingStatus};
use prompter_scroll::{LayoutContext, Viewport, WordPosition};

use super::*;
use crate::speech::{ExternalSpeechSource, RecognizerErrorCode};

const SCRIPT: &str = "The quick brown fox jumps over the lazy dog.";

struct FailingSource;

impl SpeechSource for FailingSource {
    fn name(&self) -> &str {
        "failing"
    }

    fn start(&mut self) -> std::result::Result<(), RecognizerError> {
        Err(RecognizerError::new(
            RecognizerErrorCode::MicrophoneDenied,
            "permission refused",
        ))
    }

    fn stop(&mut self) {}
}

struct FlagSource(Arc<AtomicBool>);

impl SpeechSource for FlagSource {
    fn name(&self) -> &str {
        "flag"
    }

    fn start(&mut self) -> std::result::Result<(), RecognizerError> {
        self.0.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

fn estimated() -> LayoutContext {
    LayoutContext::Estimated {
        content_height: 900.0,
    }
}

fn viewport(scroll_top: f64) -> Viewport {
    Viewport {
        scroll_top,
        height: 100.0,
    }
}

fn service_with(settings: AlignmentSettings, source: Box<dyn SpeechSource>) -> (AlignmentService, Arc<InMemoryEventBus>) {
    let bus = Arc::new(InMemoryEventBus::new());
    let service = AlignmentService::new(settings, source, bus.clone());
    (service, bus)
}

fn listening() -> (AlignmentService, Arc<InMemoryEventBus>) {
    let (mut service, bus) = service_with(AlignmentSettings::default(), Box::new(ExternalSpeechSource::new()));
    service.initialize(SCRIPT, estimated(), viewport(0.0));
    service.start().unwrap();
    (service, bus)
}

fn statuses(bus: &InMemoryEventBus) -> Vec<String> {
    bus.payloads_for(event_names::STATUS)
        .iter()
        .map(|p| p["status"].as_str().unwrap_or_default().to_string())
        .collect()
}

#[test]
fn test_start_requires_script() {
    let (mut service, bus) = service_with(AlignmentSettings::default(), Box::new(ExternalSpeechSource::new()));
    assert!(matches!(service.start(), Err(AlignmentError::NotInitialized)));
    assert_eq!(service.status(), TrackingStatus::Off);
    assert!(bus.is_empty());
}

#[test]
fn test_start_emits_status_transitions() {
    let (service, bus) = listening();
    assert_eq!(service.status(), TrackingStatus::Listening);
    assert_eq!(statuses(&bus), vec!["initializing", "listening"]);
    assert!(service.needs_global_search());
    assert_eq!(service.word_count(), 9);
}

#[test]
fn test_start_failure_sets_error_and_forwards_code() {
    let (mut service, bus) = service_with(AlignmentSettings::default(), Box::new(FailingSource));
    service.initialize(SCRIPT, estimated(), viewport(0.0));

    let err = service.start().unwrap_err();
    assert!(matches!(err, AlignmentError::Recognizer(_)));
    assert_eq!(service.status(), TrackingStatus::Error);
    assert_eq!(statuses(&bus), vec!["initializing", "error"]);

    let errors = bus.payloads_for(event_names::RECOGNIZER_ERROR);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["code"], "microphone_denied");
    assert_eq!(errors[0]["message"], "permission refused");
}

#[test]
fn test_stop_and_toggle_drive_the_source() {
    let flag = Arc::new(AtomicBool::new(false));
    let (mut service, bus) = service_with(AlignmentSettings::default(), Box::new(FlagSource(flag.clone())));
    service.initialize(SCRIPT, estimated(), viewport(0.0));

    assert_eq!(service.toggle().unwrap(), TrackingStatus::Listening);
    assert!(flag.load(Ordering::SeqCst));

    assert_eq!(service.toggle().unwrap(), TrackingStatus::Off);
    assert!(!flag.load(Ordering::SeqCst));
    assert_eq!(statuses(&bus), vec!["initializing", "listening", "off"]);
}

#[test]
fn test_results_ignored_unless_listening() {
    let (mut service, bus) = service_with(AlignmentSettings::default(), Box::new(ExternalSpeechSource::new()));
    service.initialize(SCRIPT, estimated(), viewport(0.0));

    assert!(service.on_recognition("the quick brown", true, 0).is_none());
    assert!(bus.payloads_for(event_names::RECOGNIZED_TEXT).is_empty());
    assert!(!service.is_in_turn());
}

#[test]
fn test_first_utterance_relocalizes_globally() {
    let (mut service, bus) = listening();

    let event = service.on_recognition("the quick brown", true, 0).unwrap();
    assert_eq!(event.word_index, 0);
    assert_eq!(event.source, MatchSource::Global);
    assert!(!service.needs_global_search());

    let texts = bus.payloads_for(event_names::RECOGNIZED_TEXT);
    assert_eq!(texts[0]["text"], "the quick brown");
    assert_eq!(texts[0]["is_final"], true);
    assert_eq!(bus.payloads_for(event_names::WORD_MATCH)[0]["source"], "global");
}

#[test]
fn test_local_commit_waits_for_agreement() {
    let (mut service, bus) = listening();
    service.on_recognition("the quick brown", true, 0);

    assert!(service.on_recognition("the quick brown fox", true, 200).is_none());
    assert!(service.on_recognition("the quick brown fox jumps", true, 400).is_none());
    let event = service
        .on_recognition("the quick brown fox jumps over", true, 600)
        .unwrap();

    // Candidates 3, 4, 5 agree; the median wins.
    assert_eq!(event.word_index, 4);
    assert_eq!(event.source, MatchSource::Local);
    assert_eq!(event.target_scroll_offset, 380.0);
    assert_eq!(service.current_word_index(), 4);
    assert_eq!(bus.payloads_for(event_names::WORD_MATCH).len(), 2);

    let stats = service.stats();
    assert_eq!(stats.local_accepted, 3);
    assert_eq!(stats.commits, 2);
}

#[test]
fn test_tick_animates_and_emits_frames() {
    let (mut service, bus) = listening();
    service.on_recognition("the quick brown", true, 0);
    service.on_recognition("the quick brown fox", true, 200);
    service.on_recognition("the quick brown fox jumps", true, 400);
    service.on_recognition("the quick brown fox jumps over", true, 600);
    assert!(service.is_animating());

    // 300ms base + 4 words * 40ms.
    let mid = service.tick(830).unwrap();
    assert!(mid > 0.0 && mid < 380.0);
    assert_eq!(service.tick(1060), Some(380.0));
    assert!(!service.is_animating());
    assert_eq!(service.tick(1100), None);

    let frames = bus.payloads_for(event_names::SCROLL_FRAME);
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[1]["offset"], 380.0);
}

#[test]
fn test_silence_closes_turn() {
    let (mut service, _bus) = listening();
    service.on_recognition("the quick brown", true, 0);
    service.on_recognition("the quick brown fox", true, 200);
    assert_eq!(service.silence_deadline_ms(), Some(1400));

    service.tick(1399);
    assert!(service.is_in_turn());
    service.tick(1400);
    assert!(!service.is_in_turn());
    assert_eq!(service.turn_state(), &TurnState::Idle);
}

#[test]
fn test_short_partials_are_skipped() {
    let (mut service, bus) = listening();
    assert!(service.on_recognition("the quick", false, 0).is_none());
    assert_eq!(service.stats().utterances_received, 1);
    assert_eq!(service.stats().utterances_processed, 0);
    // Still forwarded for display.
    assert_eq!(bus.payloads_for(event_names::RECOGNIZED_TEXT).len(), 1);
}

#[test]
fn test_failures_escalate_to_global_search() {
    let settings = AlignmentSettings {
        global_search_after_failures: 2,
        ..AlignmentSettings::default()
    };
    let (mut service, _bus) = service_with(settings, Box::new(ExternalSpeechSource::new()));
    service.initialize(SCRIPT, estimated(), viewport(0.0));
    service.start().unwrap();
    service.on_recognition("the quick brown", true, 0);

    for (i, now) in [200, 400, 600].into_iter().enumerate() {
        assert!(service.on_recognition("zzz yyy xxx", true, now).is_none());
        assert_eq!(service.consecutive_failed_matches(), i as u32 + 1);
    }

    let event = service.on_recognition("the lazy dog", true, 800).unwrap();
    assert_eq!(event.source, MatchSource::Global);
    assert_eq!(event.word_index, 6);
    assert_eq!(service.consecutive_failed_matches(), 0);

    let stats = service.stats();
    assert_eq!(stats.local_rejected, 3);
    assert_eq!(stats.global_searches, 2);
    assert_eq!(stats.global_matches, 2);
}

#[test]
fn test_recognizer_error_passes_through() {
    let (mut service, bus) = listening();
    let error = RecognizerError::new(RecognizerErrorCode::MicrophoneMissing, "unplugged");
    assert!(service.on_speech_event(SpeechEvent::Error(error), 0).is_none());

    assert_eq!(service.status(), TrackingStatus::Listening);
    let errors = bus.payloads_for(event_names::RECOGNIZER_ERROR);
    assert_eq!(errors[0]["code"], "microphone_missing");
}

#[test]
fn test_stop_requires_relocalization() {
    let (mut service, _bus) = listening();
    service.on_recognition("the quick brown", true, 0);
    service.jump_to_word(8, 100);
    assert!(service.is_animating());

    service.stop();
    assert_eq!(service.status(), TrackingStatus::Off);
    assert!(service.needs_global_search());
    assert!(!service.is_animating());
    assert!(!service.is_in_turn());
    assert_eq!(service.current_word_index(), 8);
}

#[test]
fn test_jump_clamps_to_last_word() {
    let (mut service, bus) = listening();
    let event = service.jump_to_word(100, 0).unwrap();
    assert_eq!(event.word_index, 8);
    assert_eq!(event.source, MatchSource::Manual);
    assert_eq!(bus.payloads_for(event_names::WORD_MATCH)[0]["source"], "manual");
}

#[test]
fn test_reset_starts_new_session_at_top() {
    let (mut service, _bus) = listening();
    service.jump_to_word(5, 0);
    let before = service.session_id();

    let event = service.reset(10).unwrap();
    assert_eq!(event.word_index, 0);
    assert_eq!(event.target_scroll_offset, 0.0);
    assert_ne!(service.session_id(), before);
    assert_eq!(event.session_id, service.session_id());
    assert!(service.needs_global_search());
}

#[test]
fn test_start_seeds_position_from_viewport() {
    let (mut service, _bus) = service_with(AlignmentSettings::default(), Box::new(ExternalSpeechSource::new()));
    let positions = (0..9)
        .map(|i| WordPosition {
            word_index: i,
            visual_offset: i as f64 * 50.0,
            text: String::new(),
        })
        .collect();
    // Reading line at 300 + 0.2 * 100 = 320 falls on word 6.
    service.initialize(SCRIPT, LayoutContext::Measured { positions }, viewport(300.0));
    service.start().unwrap();
    assert_eq!(service.current_word_index(), 6);
}

#[test]
fn test_viewport_does_not_interrupt_animation() {
    let (mut service, _bus) = listening();
    service.jump_to_word(8, 0);
    assert!(service.is_animating());

    service.set_viewport(viewport(42.0));
    assert!(service.is_animating());

    service.tick(10_000);
    service.set_viewport(viewport(42.0));
    assert_eq!(service.scroll_offset(), 42.0);
}

#[test]
fn test_update_layout_keeps_position() {
    let (mut service, _bus) = listening();
    service.jump_to_word(4, 0);
    service.update_layout(LayoutContext::Estimated {
        content_height: 1800.0,
    });
    assert_eq!(service.current_word_index(), 4);

    let event = service.jump_to_word(4, 5_000).unwrap();
    // 4 * 1800 / 9 - 20
    assert_eq!(event.target_scroll_offset, 780.0);
}

#[test]
fn test_set_settings_rejects_invalid() {
    let (mut service, _bus) = listening();
    let mut settings = AlignmentSettings::default();
    settings.turn.accumulator_capacity = 0;
    assert!(service.set_settings(settings).is_err());
    assert_eq!(service.settings().turn.accumulator_capacity, 3);
}

#[test]
fn test_reload_while_listening_reannounces_status() {
    let (mut service, bus) = listening();
    let before = service.session_id();

    service.initialize("A different script entirely.", estimated(), viewport(0.0));
    let after = service.session_id();
    assert_ne!(before, after);

    let last = bus.payloads_for(event_names::STATUS).pop().unwrap();
    assert_eq!(last["status"], "listening");
    assert_eq!(last["session_id"], after.to_string());

    service.reset(0);
    let last = bus.payloads_for(event_names::STATUS).pop().unwrap();
    assert_eq!(last["session_id"], service.session_id().to_string());
}

#[test]
fn test_reload_while_off_stays_quiet() {
    let (mut service, bus) = service_with(AlignmentSettings::default(), Box::new(ExternalSpeechSource::new()));
    service.initialize(SCRIPT, estimated(), viewport(0.0));
    service.initialize(SCRIPT, estimated(), viewport(0.0));
    assert!(bus.payloads_for(event_names::STATUS).is_empty());
}
