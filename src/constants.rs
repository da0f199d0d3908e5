//! Detection thresholds and reference values
//!
//! Compile-time defaults for both detectors and the renderer. The
//! serde configuration in [`crate::config`] is built from these values,
//! so changing a default here changes `DetectorConfig::default()`.
//!
//! All HSV bounds use OpenCV's 8-bit convention: hue in `[0, 180]`,
//! saturation and value in `[0, 255]`, both ends inclusive.

use crate::color::HsvRange;

/// Individual-tooth segmenter parameters
pub mod segmenter {
    use super::HsvRange;

    /// Bilateral filter neighbourhood diameter
    pub const BILATERAL_DIAMETER: i32 = 9;

    /// Bilateral filter sigma in color space
    pub const BILATERAL_SIGMA_COLOR: f64 = 75.0;

    /// Bilateral filter sigma in coordinate space
    pub const BILATERAL_SIGMA_SPACE: f64 = 75.0;

    /// Adaptive threshold neighbourhood (must be odd)
    pub const ADAPTIVE_BLOCK_SIZE: i32 = 11;

    /// Constant subtracted from the Gaussian-weighted mean
    pub const ADAPTIVE_C: f64 = 2.0;

    /// Contour area bounds as fraction of image area (exclusive)
    pub const MIN_AREA_RATIO: f64 = 0.0005;
    pub const MAX_AREA_RATIO: f64 = 0.03;

    /// Central window the box center must fall in, as fractions of
    /// width and height (exclusive)
    pub const CENTER_X_RANGE: (f64, f64) = (0.25, 0.75);
    pub const CENTER_Y_RANGE: (f64, f64) = (0.35, 0.65);

    /// Width / height bounds (exclusive)
    pub const ASPECT_RANGE: (f64, f64) = (0.5, 2.0);

    /// Mean grayscale brightness the box must exceed
    pub const MIN_BRIGHTNESS: f64 = 100.0;

    /// Yellow-brown stain range used to classify a tooth box
    pub const STAIN_RANGE: HsvRange = HsvRange::new([10, 30, 30], [30, 255, 200]);

    /// Stain coverage above which a tooth is labelled calculus
    pub const STAIN_RATIO_THRESHOLD: f64 = 0.15;

    /// Confidence multiplier and cap for stained teeth
    pub const STAIN_CONFIDENCE_SCALE: f64 = 2.0;
    pub const STAIN_CONFIDENCE_CAP: f64 = 0.95;

    /// Fixed confidence for healthy teeth
    pub const HEALTHY_CONFIDENCE: f64 = 0.85;

    /// Visible teeth in a standard intraoral photo
    pub const MAX_DETECTIONS: usize = 8;
}

/// Region-based lesion detector parameters
pub mod lesion {
    use super::HsvRange;

    /// Canny thresholds for the teeth-region edge map
    pub const CANNY_LOW_THRESHOLD: f64 = 50.0;
    pub const CANNY_HIGH_THRESHOLD: f64 = 150.0;

    /// Iterations of 3x3 dilation applied to the edge map
    pub const EDGE_DILATE_ITERATIONS: i32 = 2;

    /// Whitish range used to find the teeth region
    pub const TEETH_RANGE: HsvRange = HsvRange::new([0, 0, 140], [180, 40, 255]);

    /// Wide horizontal structuring element (width, height)
    pub const REGION_KERNEL_SIZE: (i32, i32) = (20, 10);

    /// Dilation iterations with the wide element after closing
    pub const REGION_DILATE_ITERATIONS: i32 = 2;

    /// Minimum teeth-region contour area as fraction of image area
    pub const MIN_TEETH_REGION_RATIO: f64 = 0.05;

    /// Pixel margin added on each side of the teeth region
    pub const TEETH_REGION_MARGIN: i32 = 20;

    /// Fallback teeth region as fractions of width and height
    pub const FALLBACK_X_RANGE: (f64, f64) = (0.15, 0.85);
    pub const FALLBACK_Y_RANGE: (f64, f64) = (0.30, 0.75);

    /// Calculus: yellow/brown, broad
    pub const CALCULUS_RANGE: HsvRange = HsvRange::new([15, 40, 60], [35, 255, 200]);

    /// Cavity: very dark, any hue
    pub const CAVITY_RANGE: HsvRange = HsvRange::new([0, 0, 0], [180, 255, 80]);

    /// Discoloration: brown/yellow, narrower and darker band
    pub const STAIN_RANGE: HsvRange = HsvRange::new([10, 30, 40], [30, 200, 180]);

    /// Gingival redness, two bands either side of the hue wrap-around
    pub const REDNESS_LOW_RANGE: HsvRange = HsvRange::new([0, 100, 100], [10, 255, 255]);
    pub const REDNESS_HIGH_RANGE: HsvRange = HsvRange::new([160, 100, 100], [180, 255, 255]);

    /// Healthy-tooth fallback range
    pub const HEALTHY_RANGE: HsvRange = HsvRange::new([0, 0, 150], [180, 30, 255]);

    /// Elliptical cleanup kernel size
    pub const CLEANUP_KERNEL_SIZE: i32 = 5;

    /// Candidate area bounds as fraction of image area (exclusive)
    pub const MIN_AREA_RATIO: f64 = 0.0003;
    pub const MAX_AREA_RATIO: f64 = 0.12;

    /// Width / height bounds (exclusive)
    pub const ASPECT_RANGE: (f64, f64) = (0.4, 2.5);

    /// Candidates darker than this are shadow or background
    pub const MIN_BRIGHTNESS: f64 = 40.0;

    /// Coverage thresholds, checked in this priority order
    pub const CAVITY_RATIO_THRESHOLD: f64 = 0.3;
    pub const CALCULUS_RATIO_THRESHOLD: f64 = 0.3;
    pub const STAIN_RATIO_THRESHOLD: f64 = 0.2;

    /// Severity multipliers (result capped at 1.0)
    pub const CAVITY_SEVERITY_SCALE: f64 = 1.5;
    pub const CALCULUS_SEVERITY_SCALE: f64 = 1.2;
    pub const STAIN_SEVERITY_SCALE: f64 = 1.3;

    /// Fixed confidence for fallback healthy teeth
    pub const HEALTHY_CONFIDENCE: f64 = 0.85;

    pub const MAX_DETECTIONS: usize = 5;
}

/// Annotation drawing parameters
pub mod render {
    /// Segmenter overlay: thinner boxes, black label text
    pub const SEGMENTER_BOX_THICKNESS: i32 = 3;
    pub const SEGMENTER_FONT_SCALE: f64 = 0.6;
    pub const SEGMENTER_LABEL_HEIGHT: i32 = 25;
    pub const SEGMENTER_SUFFIX: &str = "_simple_detected";

    /// Lesion overlay: thicker boxes, white label text
    pub const LESION_BOX_THICKNESS: i32 = 4;
    pub const LESION_FONT_SCALE: f64 = 0.7;
    pub const LESION_LABEL_HEIGHT: i32 = 30;
    pub const LESION_SUFFIX: &str = "_cv_detected";

    pub const TEXT_THICKNESS: i32 = 2;

    /// Horizontal padding added to the text width for the label background
    pub const LABEL_PADDING: i32 = 10;

    /// Text origin offset from the box corner (right, up)
    pub const TEXT_OFFSET: (i32, i32) = (5, 8);
}
