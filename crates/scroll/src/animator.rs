//! Scroll target computation and eased transitions.

use serde::{Deserialize, Serialize};

use crate::easing::ease_in_out_cubic;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollSettings {
    /// Fraction of the viewport height kept above the active word.
    pub scroll_position_percent: f64,
    /// Duration of every transition before the per-word term.
    pub base_duration_ms: u64,
    /// Extra duration per word jumped.
    pub per_word_ms: u64,
    /// Upper bound on a single transition.
    pub max_duration_ms: u64,
    /// Moves shorter than this are applied without animation.
    pub min_distance_px: f64,
}

impl Default for ScrollSettings {
    fn default() -> Self {
        Self {
            scroll_position_percent: 0.2,
            base_duration_ms: 300,
            per_word_ms: 40,
            max_duration_ms: 1500,
            min_distance_px: 2.0,
        }
    }
}

/// Scroll offset that puts `word_offset` at `percent` of the viewport height.
pub fn target_offset(word_offset: f64, viewport_height: f64, percent: f64) -> f64 {
    (word_offset - viewport_height * percent).max(0.0)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollAnimation {
    pub from: f64,
    pub to: f64,
    pub start_ms: u64,
    pub duration_ms: u64,
}

impl ScrollAnimation {
    pub fn offset_at(&self, now_ms: u64) -> f64 {
        if self.duration_ms == 0 {
            return self.to;
        }
        let elapsed = now_ms.saturating_sub(self.start_ms) as f64;
        let progress = ease_in_out_cubic(elapsed / self.duration_ms as f64);
        self.from + (self.to - self.from) * progress
    }

    pub fn is_finished(&self, now_ms: u64) -> bool {
        now_ms >= self.start_ms + self.duration_ms
    }
}

/// How a new target was applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrollCommand {
    /// Set directly; the distance was below the pixel threshold.
    Snap(f64),
    /// Transition started, replacing any in flight.
    Animate(ScrollAnimation),
}

impl ScrollCommand {
    pub fn target(&self) -> f64 {
        match self {
            ScrollCommand::Snap(offset) => *offset,
            ScrollCommand::Animate(animation) => animation.to,
        }
    }
}

/// Owns the current scroll offset and at most one in-flight transition.
#[derive(Debug, Clone, Default)]
pub struct ScrollAnimator {
    settings: ScrollSettings,
    current_offset: f64,
    animation: Option<ScrollAnimation>,
}

impl ScrollAnimator {
    pub fn new(settings: ScrollSettings) -> Self {
        Self {
            settings,
            current_offset: 0.0,
            animation: None,
        }
    }

    pub fn settings(&self) -> ScrollSettings {
        self.settings
    }

    pub fn set_settings(&mut self, settings: ScrollSettings) {
        self.settings = settings;
    }

    pub fn current_offset(&self) -> f64 {
        self.current_offset
    }

    pub fn animation(&self) -> Option<&ScrollAnimation> {
        self.animation.as_ref()
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Scroll offset for a word at `word_offset` in a viewport of `viewport_height`.
    pub fn target_for(&self, word_offset: f64, viewport_height: f64) -> f64 {
        target_offset(word_offset, viewport_height, self.settings.scroll_position_percent)
    }

    pub fn duration_for(&self, jump_words: usize) -> u64 {
        let scaled = self
            .settings
            .base_duration_ms
            .saturating_add(self.settings.per_word_ms.saturating_mul(jump_words as u64));
        scaled.min(self.settings.max_duration_ms)
    }

    /// Start moving toward `target`. An in-flight transition is replaced and
    /// the new one starts from wherever the old one had reached at `now_ms`.
    pub fn scroll_to(&mut self, target: f64, jump_words: usize, now_ms: u64) -> ScrollCommand {
        let from = self.offset_at(now_ms);
        self.current_offset = from;

        if (target - from).abs() < self.settings.min_distance_px {
            self.animation = None;
            self.current_offset = target;
            return ScrollCommand::Snap(target);
        }

        let animation = ScrollAnimation {
            from,
            to: target,
            start_ms: now_ms,
            duration_ms: self.duration_for(jump_words),
        };
        tracing::debug!(
            from,
            to = target,
            jump_words,
            duration_ms = animation.duration_ms,
            "scroll_animation_started"
        );
        self.animation = Some(animation);
        ScrollCommand::Animate(animation)
    }

    /// Advance the in-flight transition. Returns the new offset while one is
    /// running (including the final frame), `None` otherwise.
    pub fn tick(&mut self, now_ms: u64) -> Option<f64> {
        let animation = self.animation?;
        self.current_offset = animation.offset_at(now_ms);
        if animation.is_finished(now_ms) {
            self.current_offset = animation.to;
            self.animation = None;
        }
        Some(self.current_offset)
    }

    /// Host scrolled on its own; adopt the offset and drop any transition.
    pub fn set_current_offset(&mut self, offset: f64) {
        self.animation = None;
        self.current_offset = offset;
    }

    pub fn cancel(&mut self) {
        self.animation = None;
    }

    fn offset_at(&self, now_ms: u64) -> f64 {
        match &self.animation {
            Some(animation) => animation.offset_at(now_ms),
            None => self.current_offset,
        }
    }
}
