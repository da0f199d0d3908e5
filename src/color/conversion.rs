//! Color space conversion utilities
//!
//! Provides the conversions the detectors need:
//! - BGR to grayscale and to OpenCV 8-bit HSV
//! - sRGB display colors to OpenCV BGR scalars for drawing

use opencv::{
    core::{Mat, Scalar},
    imgproc::{cvt_color_def, COLOR_BGR2GRAY, COLOR_BGR2HSV},
};
use palette::Srgb;

use crate::{AnalysisError, Result};

/// Color converter bound to OpenCV's 8-bit conventions
///
/// OpenCV stores hue as degrees / 2 so that it fits a byte (`[0, 180]`),
/// with saturation and value scaled to `[0, 255]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColorConverter;

impl ColorConverter {
    /// Create a new color converter
    pub fn new() -> Self {
        Self
    }

    /// Convert a BGR image to single-channel grayscale
    pub fn to_gray(&self, image: &Mat) -> Result<Mat> {
        let mut gray = Mat::default();
        cvt_color_def(image, &mut gray, COLOR_BGR2GRAY)
            .map_err(|e| AnalysisError::opencv("grayscale conversion", e))?;
        Ok(gray)
    }

    /// Convert a BGR image to 8-bit HSV
    pub fn to_hsv(&self, image: &Mat) -> Result<Mat> {
        let mut hsv = Mat::default();
        cvt_color_def(image, &mut hsv, COLOR_BGR2HSV)
            .map_err(|e| AnalysisError::opencv("HSV conversion", e))?;
        Ok(hsv)
    }

    /// Convert an sRGB display color to an OpenCV BGR scalar
    pub fn srgb_to_scalar(&self, color: Srgb<u8>) -> Scalar {
        Scalar::new(color.blue as f64, color.green as f64, color.red as f64, 0.0)
    }
}
