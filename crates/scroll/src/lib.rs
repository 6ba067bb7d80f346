//! Turning a word index into a scroll position.
//!
//! - `positions`: word index <-> vertical offset, measured or estimated
//! - `animator`: target offset computation and eased, duration-scaled transitions
//! - `easing`: interpolation curves

mod animator;
pub mod easing;
mod positions;

pub use animator::{target_offset, ScrollAnimation, ScrollAnimator, ScrollCommand, ScrollSettings};
pub use positions::{
    EstimatedPositions, LayoutContext, MeasuredPositions, Viewport, WordPosition, WordPositionProvider,
};
