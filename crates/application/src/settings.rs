//! Engine configuration.
//!
//! Each component crate owns its tuning struct; this aggregates them so a
//! host can persist one JSON document. Missing fields fall back to defaults.

use std::path::Path;

use prompter_align::{GlobalSearchSettings, MatchSettings, MIN_GLOBAL_WORDS};
use prompter_scroll::ScrollSettings;
use prompter_turn::TurnSettings;
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_GLOBAL_SEARCH_AFTER_FAILURES;
use crate::error::{AlignmentError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentSettings {
    pub matching: MatchSettings,
    pub global_search: GlobalSearchSettings,
    pub turn: TurnSettings,
    pub scroll: ScrollSettings,
    /// Rejected local matches in a row before the next utterance searches globally.
    pub global_search_after_failures: u32,
}

impl Default for AlignmentSettings {
    fn default() -> Self {
        Self {
            matching: MatchSettings::default(),
            global_search: GlobalSearchSettings::default(),
            turn: TurnSettings::default(),
            scroll: ScrollSettings::default(),
            global_search_after_failures: DEFAULT_GLOBAL_SEARCH_AFTER_FAILURES,
        }
    }
}

impl AlignmentSettings {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| AlignmentError::SettingsIo {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_json_str(&json)?;
        tracing::info!(path = %path.display(), "alignment_settings_loaded");
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.matching.window_size == 0 {
            return Err(invalid("matching.window_size must be at least 1"));
        }
        check_unit("matching.confidence_threshold", self.matching.confidence_threshold)?;
        check_unit("global_search.confidence_threshold", self.global_search.confidence_threshold)?;
        if self.global_search.proximity_weight < 0.0 {
            return Err(invalid("global_search.proximity_weight must not be negative"));
        }
        if self.global_search.coarse_samples == 0 {
            return Err(invalid("global_search.coarse_samples must be at least 1"));
        }
        if self.global_search.max_utterance_words < MIN_GLOBAL_WORDS {
            return Err(invalid(format!(
                "global_search.max_utterance_words must be at least {MIN_GLOBAL_WORDS}"
            )));
        }
        if self.turn.accumulator_capacity == 0 {
            return Err(invalid("turn.accumulator_capacity must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.scroll.scroll_position_percent) {
            return Err(invalid("scroll.scroll_position_percent must be within [0, 1]"));
        }
        if self.scroll.min_distance_px < 0.0 {
            return Err(invalid("scroll.min_distance_px must not be negative"));
        }
        Ok(())
    }
}

fn check_unit(name: &str, value: f32) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(format!("{name} must be within [0, 1], got {value}")))
    }
}

fn invalid(message: impl Into<String>) -> AlignmentError {
    AlignmentError::InvalidSettings(message.into())
}
