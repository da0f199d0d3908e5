//! # Tooth Scan
//!
//! Heuristic screening of intraoral photographs with classical computer
//! vision.
//!
//! This library flags visible dental conditions by:
//! - Segmenting individual teeth in the center of the frame
//! - Masking lesion colors (calculus, cavity, discoloration) inside the teeth region
//! - Falling back to whitish healthy-tooth regions when nothing is flagged
//! - Drawing labelled boxes onto a copy of the photo
//!
//! Scores are heuristic severities in `[0, 1]`, not calibrated probabilities.
//!
//! ## Example
//!
//! ```rust,no_run
//! use tooth_scan::{detect_lesions, render_detections, ImageSource, RenderStyle, Sensitivity};
//! use std::path::Path;
//!
//! let path = Path::new("mouth.jpg");
//! let detections = detect_lesions(&ImageSource::from_path(path), Sensitivity::Medium);
//! for d in &detections {
//!     println!("{} {:.2} at {:?}", d.class_name, d.confidence, d.bbox);
//! }
//! let annotated = render_detections(path, &detections, RenderStyle::lesion());
//! println!("annotated image: {}", annotated.display());
//! ```

use std::path::{Path, PathBuf};

pub mod cascade;
pub mod color;
pub mod config;
pub mod constants;
pub mod detection;
pub mod error;
pub mod image_loader;
pub mod render;

pub use cascade::{CascadeOutcome, DetectionCascade};
pub use config::{DetectorConfig, Sensitivity};
pub use detection::{
    BoundingBox, Detection, LesionDetector, LesionReport, ToothCondition, ToothDetector,
    ToothSegmenter,
};
pub use error::{AnalysisError, Result};
pub use image_loader::ImageSource;
pub use render::{DetectionRenderer, RenderStyle};

/// Find individual teeth in an image
///
/// Never fails: an unreadable image or an OpenCV error is logged and
/// yields an empty list. Use [`ToothSegmenter::segment`] to see the error.
pub fn segment_teeth(source: &ImageSource<'_>) -> Vec<Detection> {
    let segmenter = ToothSegmenter::new();
    let result = source
        .resolve()
        .and_then(|image| segmenter.segment(&image));
    collapse("tooth segmentation", result)
}

/// Find lesions inside the teeth region of an image
///
/// Never fails: an unreadable image or an OpenCV error is logged and
/// yields an empty list. Use [`LesionDetector::analyze`] to see the error.
pub fn detect_lesions(source: &ImageSource<'_>, sensitivity: Sensitivity) -> Vec<Detection> {
    let detector = LesionDetector::with_sensitivity(sensitivity);
    let result = source
        .resolve()
        .and_then(|image| detector.analyze(&image))
        .map(|report| report.detections);
    collapse("lesion detection", result)
}

/// Draw detections onto a copy of the image at `path` and write it
///
/// Returns the annotated image path, or `path` itself when the image
/// cannot be read or the output cannot be written.
pub fn render_detections(path: &Path, detections: &[Detection], style: RenderStyle) -> PathBuf {
    match DetectionRenderer::new(style).render(path, detections) {
        Ok(output) => output,
        Err(e) => {
            log::warn!("rendering {}: {}", path.display(), e);
            path.to_path_buf()
        }
    }
}

fn collapse(stage: &str, result: Result<Vec<Detection>>) -> Vec<Detection> {
    result.unwrap_or_else(|e| {
        log::warn!("{}: {}", stage, e);
        Vec::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreadable_image_yields_empty_results() {
        let source = ImageSource::from_path(Path::new("nonexistent_file.jpg"));
        assert!(segment_teeth(&source).is_empty());
        assert!(detect_lesions(&source, Sensitivity::High).is_empty());
    }

    #[test]
    fn test_render_unreadable_returns_same_path() {
        let path = Path::new("nonexistent_file.jpg");
        assert_eq!(render_detections(path, &[], RenderStyle::lesion()), path);
    }
}
