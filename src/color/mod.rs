//! Color space conversion and color-range masking
//!
//! Every color heuristic in the detectors is expressed as an inclusive
//! HSV box ([`HsvRange`]) applied to an OpenCV HSV image, plus simple
//! per-rectangle statistics over the resulting masks.

pub mod conversion;
pub mod range;
pub mod stats;

pub use conversion::ColorConverter;
pub use range::{union_masks, HsvRange};
pub use stats::{coverage_in_rect, mean_in_rect};
