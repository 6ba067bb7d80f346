//! Event contracts emitted by the alignment engine.
//!
//! Hosts subscribe through the `EventBus` trait; payloads are the serialized
//! DTOs below so field names stay in one place on both sides.
//!
//! Every payload carries the `session_id` of the tracking session that
//! produced it. A host that restarts tracking can drop late events from the
//! previous session by comparing ids.

mod bus;

pub use bus::{emit_event, EmittedEvent, EventBus, EventBusRef, InMemoryEventBus, NullEventBus};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which search produced a committed position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
    /// Turn controller released an agreed local candidate.
    Local,
    /// Whole-document relocalization.
    Global,
    /// Host repositioned explicitly.
    Manual,
}

/// Tracking lifecycle as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TrackingStatus {
    #[default]
    Off,
    Initializing,
    Listening,
    Error,
}

impl TrackingStatus {
    pub fn label(&self) -> &'static str {
        match self {
            TrackingStatus::Off => "off",
            TrackingStatus::Initializing => "initializing",
            TrackingStatus::Listening => "listening",
            TrackingStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for TrackingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Failure categories reported by speech recognizer adapters.
///
/// The engine forwards these unchanged; it never produces them itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecognizerErrorCode {
    ModelLoad,
    MicrophoneDenied,
    MicrophoneMissing,
    RecognitionFailed,
}

impl std::fmt::Display for RecognizerErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = match self {
            RecognizerErrorCode::ModelLoad => "model_load",
            RecognizerErrorCode::MicrophoneDenied => "microphone_denied",
            RecognizerErrorCode::MicrophoneMissing => "microphone_missing",
            RecognizerErrorCode::RecognitionFailed => "recognition_failed",
        };
        f.write_str(code)
    }
}

/// A new committed script position.
///
/// Producers: alignment service
/// Consumers: host view (scroll + highlight)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordMatchEvent {
    pub session_id: Uuid,
    pub word_index: usize,
    /// Scroll offset the view is animating toward.
    pub target_scroll_offset: f64,
    pub source: MatchSource,
}

/// Tracking status transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChangedEvent {
    pub session_id: Uuid,
    pub status: TrackingStatus,
}

/// Raw recognizer text, forwarded for optional display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognizedTextEvent {
    pub session_id: Uuid,
    pub text: String,
    pub is_final: bool,
}

/// Adapter failure, forwarded verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognizerErrorEvent {
    pub session_id: Uuid,
    pub code: RecognizerErrorCode,
    #[serde(default)]
    pub message: String,
}

/// One animation frame while a scroll transition is in flight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrollFrameEvent {
    pub session_id: Uuid,
    pub offset: f64,
}

/// Event names as constants to prevent typos.
pub mod event_names {
    pub const WORD_MATCH: &str = "prompter:word_match";
    pub const STATUS: &str = "prompter:status";
    pub const RECOGNIZED_TEXT: &str = "prompter:recognized_text";
    pub const RECOGNIZER_ERROR: &str = "prompter:recognizer_error";
    pub const SCROLL_FRAME: &str = "prompter:scroll_frame";
}
