//! Async driver: serializes host inputs, silence timers and animation frames
//! onto one `AlignmentService`.
//!
//! The service is synchronous and clock-free. The driver owns it inside a
//! single task, stamps every input with milliseconds since the driver
//! started, and wakes up for the next silence deadline and for frames while a
//! scroll transition is in flight. Nothing else touches the service, so no
//! locking is needed.

use std::time::Duration;

use prompter_scroll::{LayoutContext, Viewport};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::constants::{FRAME_INTERVAL_MS, INPUT_CHANNEL_CAPACITY};
use crate::service::AlignmentService;
use crate::speech::SpeechEvent;

/// Host input to the driver.
#[derive(Debug, Clone)]
pub enum DriverInput {
    /// Load a new script, discarding the current session.
    Load {
        text: String,
        layout: LayoutContext,
        viewport: Viewport,
    },
    Layout(LayoutContext),
    Viewport(Viewport),
    Speech(SpeechEvent),
    JumpTo(usize),
    Start,
    Stop,
    Toggle,
    Reset,
}

pub struct AlignmentDriver {
    service: AlignmentService,
    cancel: CancellationToken,
    frame_interval: Duration,
}

impl AlignmentDriver {
    pub fn new(service: AlignmentService) -> Self {
        Self {
            service,
            cancel: CancellationToken::new(),
            frame_interval: Duration::from_millis(FRAME_INTERVAL_MS),
        }
    }

    pub fn with_frame_interval(mut self, frame_interval: Duration) -> Self {
        self.frame_interval = frame_interval.max(Duration::from_millis(1));
        self
    }

    /// Cancelling stops tracking and ends `run`.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run on a new task. The service is handed back when the task ends.
    pub fn spawn(self) -> (mpsc::Sender<DriverInput>, JoinHandle<AlignmentService>) {
        let (tx, rx) = mpsc::channel(INPUT_CHANNEL_CAPACITY);
        let handle = tokio::spawn(self.run(rx));
        (tx, handle)
    }

    /// Process inputs until cancelled or every sender is dropped.
    pub async fn run(mut self, mut inputs: mpsc::Receiver<DriverInput>) -> AlignmentService {
        let origin = Instant::now();
        let cancel = self.cancel.clone();
        let mut frames = tokio::time::interval(self.frame_interval);
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(
            frame_interval_ms = self.frame_interval.as_millis() as u64,
            "alignment_driver_started"
        );

        loop {
            let silence_deadline = self
                .service
                .silence_deadline_ms()
                .map(|ms| origin + Duration::from_millis(ms));
            let animating = self.service.is_animating();

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!("alignment_driver_cancelled");
                    break;
                }
                input = inputs.recv() => {
                    let Some(input) = input else {
                        tracing::info!("alignment_driver_inputs_closed");
                        break;
                    };
                    self.handle(input, elapsed_ms(origin));
                }
                _ = tokio::time::sleep_until(silence_deadline.unwrap_or(origin)), if silence_deadline.is_some() => {
                    self.service.tick(elapsed_ms(origin));
                }
                _ = frames.tick(), if animating => {
                    self.service.tick(elapsed_ms(origin));
                }
            }
        }

        self.service.stop();
        tracing::info!(
            word_index = self.service.current_word_index(),
            "alignment_driver_stopped"
        );
        self.service
    }

    fn handle(&mut self, input: DriverInput, now_ms: u64) {
        match input {
            DriverInput::Load {
                text,
                layout,
                viewport,
            } => self.service.initialize(&text, layout, viewport),
            DriverInput::Layout(layout) => self.service.update_layout(layout),
            DriverInput::Viewport(viewport) => self.service.set_viewport(viewport),
            DriverInput::Speech(event) => {
                self.service.on_speech_event(event, now_ms);
            }
            DriverInput::JumpTo(word_index) => {
                self.service.jump_to_word(word_index, now_ms);
            }
            DriverInput::Start => {
                if let Err(e) = self.service.start() {
                    tracing::warn!(error = %e, "tracking_start_failed");
                }
            }
            DriverInput::Stop => self.service.stop(),
            DriverInput::Toggle => {
                if let Err(e) = self.service.toggle() {
                    tracing::warn!(error = %e, "tracking_toggle_failed");
                }
            }
            DriverInput::Reset => {
                self.service.reset(now_ms);
            }
        }
    }
}

fn elapsed_ms(origin: Instant) -> u64 {
    origin.elapsed().as_millis() as u64
}
