//! Inclusive HSV color ranges and binary mask construction

use opencv::{
    core::{bitwise_or, in_range, Mat, Scalar},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use crate::{AnalysisError, Result};

/// Upper bound of OpenCV's 8-bit hue channel
pub const HUE_MAX: u8 = 180;

/// Inclusive HSV box in OpenCV 8-bit units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvRange {
    /// Lower bound (hue, saturation, value)
    pub lower: [u8; 3],
    /// Upper bound (hue, saturation, value)
    pub upper: [u8; 3],
}

impl HsvRange {
    pub const fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self { lower, upper }
    }

    /// Bounds are ordered and hue stays within `[0, 180]`
    pub fn is_valid(&self) -> bool {
        self.upper[0] <= HUE_MAX && (0..3).all(|i| self.lower[i] <= self.upper[i])
    }

    /// Threshold an HSV image into a `CV_8UC1` mask (255 inside the range)
    pub fn mask(&self, hsv: &Mat) -> Result<Mat> {
        let lower = to_scalar(self.lower);
        let upper = to_scalar(self.upper);

        let mut mask = Mat::default();
        in_range(hsv, &lower, &upper, &mut mask)
            .map_err(|e| AnalysisError::opencv("HSV range threshold", e))?;
        Ok(mask)
    }
}

fn to_scalar(hsv: [u8; 3]) -> Scalar {
    Scalar::new(hsv[0] as f64, hsv[1] as f64, hsv[2] as f64, 0.0)
}

/// Pixel-wise union of two masks of equal size
pub fn union_masks(a: &Mat, b: &Mat) -> Result<Mat> {
    let mut result = Mat::default();
    bitwise_or(a, b, &mut result, &Mat::default())
        .map_err(|e| AnalysisError::opencv("mask union", e))?;
    Ok(result)
}
