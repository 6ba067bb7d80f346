//! Seam to the streaming speech recognizer.
//!
//! The recognizer itself (model loading, microphone capture, decoding) lives
//! in the host. The engine only starts and stops it and consumes its results.

pub use prompter_events::RecognizerErrorCode;

/// Failure reported by a recognizer adapter. Forwarded to the host unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct RecognizerError {
    pub code: RecognizerErrorCode,
    pub message: String,
}

impl RecognizerError {
    pub fn new(code: RecognizerErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Output of a recognizer adapter.
#[derive(Debug, Clone, PartialEq)]
pub enum SpeechEvent {
    /// Transcript of the current utterance. Partial results may be revised;
    /// a final result closes the utterance.
    Result { text: String, is_final: bool },
    Error(RecognizerError),
}

impl SpeechEvent {
    pub fn partial(text: impl Into<String>) -> Self {
        SpeechEvent::Result {
            text: text.into(),
            is_final: false,
        }
    }

    pub fn final_result(text: impl Into<String>) -> Self {
        SpeechEvent::Result {
            text: text.into(),
            is_final: true,
        }
    }
}

/// Control surface of a recognizer adapter.
pub trait SpeechSource: Send {
    fn name(&self) -> &str;

    /// Begin recognition. Model and microphone readiness are the adapter's
    /// concern; their failures come back here.
    fn start(&mut self) -> Result<(), RecognizerError>;

    fn stop(&mut self);
}

/// Adapter for hosts that run the recognizer themselves and only feed results in.
#[derive(Debug, Default)]
pub struct ExternalSpeechSource {
    running: bool,
}

impl ExternalSpeechSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl SpeechSource for ExternalSpeechSource {
    fn name(&self) -> &str {
        "external"
    }

    fn start(&mut self) -> Result<(), RecognizerError> {
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) {
        self.running = false;
    }
}
