//! Word index <-> vertical offset lookup.

use serde::{Deserialize, Serialize};

/// Rendered location of one reference word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordPosition {
    pub word_index: usize,
    /// Distance from the top of the scrollable content, in pixels.
    pub visual_offset: f64,
    pub text: String,
}

/// Host-reported scroll viewport.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Viewport {
    pub scroll_top: f64,
    pub height: f64,
}

/// Geometry supplied by the host when content or layout changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum LayoutContext {
    /// Per-word offsets queried from the rendered view.
    Measured { positions: Vec<WordPosition> },
    /// Only the total content height is known.
    Estimated { content_height: f64 },
}

impl LayoutContext {
    pub fn into_provider(self, word_count: usize) -> Box<dyn WordPositionProvider> {
        match self {
            LayoutContext::Measured { positions } => Box::new(MeasuredPositions::new(positions)),
            LayoutContext::Estimated { content_height } => {
                Box::new(EstimatedPositions::new(word_count, content_height))
            }
        }
    }
}

/// Maps between script words and rendered offsets.
pub trait WordPositionProvider: Send + Sync {
    fn word_count(&self) -> usize;

    /// Offset of `word_index`, or `None` when nothing is laid out.
    fn offset_of(&self, word_index: usize) -> Option<f64>;

    /// Word shown at `offset`; used to turn the viewport into a search hint.
    fn word_at_offset(&self, offset: f64) -> usize;
}

/// Offsets measured per word. Words missing from the map borrow the offset
/// of the nearest preceding measured word.
#[derive(Debug, Clone, Default)]
pub struct MeasuredPositions {
    positions: Vec<WordPosition>,
}

impl MeasuredPositions {
    pub fn new(mut positions: Vec<WordPosition>) -> Self {
        positions.sort_by_key(|p| p.word_index);
        positions.dedup_by_key(|p| p.word_index);
        Self { positions }
    }
}

impl WordPositionProvider for MeasuredPositions {
    fn word_count(&self) -> usize {
        self.positions.last().map(|p| p.word_index + 1).unwrap_or(0)
    }

    fn offset_of(&self, word_index: usize) -> Option<f64> {
        let after = self.positions.partition_point(|p| p.word_index <= word_index);
        self.positions.get(after.saturating_sub(1)).map(|p| p.visual_offset)
    }

    fn word_at_offset(&self, offset: f64) -> usize {
        let after = self.positions.partition_point(|p| p.visual_offset <= offset);
        after
            .checked_sub(1)
            .and_then(|slot| self.positions.get(slot))
            .map(|p| p.word_index)
            .unwrap_or(0)
    }
}

/// Linear interpolation over the content height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimatedPositions {
    word_count: usize,
    content_height: f64,
}

impl EstimatedPositions {
    pub fn new(word_count: usize, content_height: f64) -> Self {
        Self {
            word_count,
            content_height: content_height.max(0.0),
        }
    }
}

impl WordPositionProvider for EstimatedPositions {
    fn word_count(&self) -> usize {
        self.word_count
    }

    fn offset_of(&self, word_index: usize) -> Option<f64> {
        if self.word_count == 0 {
            return None;
        }
        let index = word_index.min(self.word_count - 1) as f64;
        Some(index * self.content_height / self.word_count as f64)
    }

    fn word_at_offset(&self, offset: f64) -> usize {
        if self.word_count == 0 || self.content_height <= 0.0 {
            return 0;
        }
        let fraction = (offset / self.content_height).clamp(0.0, 1.0);
        ((fraction * self.word_count as f64).floor() as usize).min(self.word_count - 1)
    }
}
