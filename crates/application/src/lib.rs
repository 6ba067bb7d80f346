//! Teleprompter alignment engine.
//!
//! Follows a speaker through a script from streaming speech recognition
//! results and decides where the view should scroll.
//!
//! - [`AlignmentService`]: synchronous core, one tracking session per script
//! - [`AlignmentDriver`]: tokio task that feeds the service inputs, silence
//!   timers and animation frames
//! - [`SpeechSource`]: seam to the host's recognizer

mod constants;
mod driver;
mod error;
mod service;
mod settings;
mod speech;

pub use constants::*;
pub use driver::{AlignmentDriver, DriverInput};
pub use error::{AlignmentError, Result};
pub use service::{AlignmentService, AlignmentStats};
pub use settings::AlignmentSettings;
pub use speech::{ExternalSpeechSource, RecognizerError, RecognizerErrorCode, SpeechEvent, SpeechSource};
