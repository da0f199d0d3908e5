//! Teeth-region localisation
//!
//! Finds the part of the frame that holds the tooth row, used by the
//! lesion detector as its spatial gate:
//! - Canny edges on grayscale, dilated
//! - intersected with a whitish HSV mask
//! - merged with a wide horizontal kernel (close, then dilate)
//! - largest merged blob above a minimum area, expanded by a margin
//!
//! When nothing qualifies, a fixed central box of the frame is used.

use opencv::{
    core::{bitwise_and, Mat, Rect},
    imgproc::{canny, MORPH_RECT},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use crate::config::LesionConfig;
use crate::constants::lesion::{
    EDGE_DILATE_ITERATIONS, REGION_DILATE_ITERATIONS, REGION_KERNEL_SIZE,
};
use crate::detection::contours::{close, dilate_n, external_candidates, structuring_element};
use crate::detection::RoiWindow;
use crate::{AnalysisError, Result};

/// How the teeth region was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionSource {
    /// Located from edges and whitish pixels
    Detected,
    /// Fixed fraction of the frame
    Fallback,
}

/// Located teeth region
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TeethRegion {
    pub window: RoiWindow,
    pub source: RegionSource,
}

/// Teeth-region locator
pub struct TeethRegionLocator<'a> {
    config: &'a LesionConfig,
}

impl<'a> TeethRegionLocator<'a> {
    pub fn new(config: &'a LesionConfig) -> Self {
        Self { config }
    }

    /// Locate the teeth region in an image given its gray and HSV forms
    pub fn locate(&self, gray: &Mat, hsv: &Mat) -> Result<TeethRegion> {
        let (width, height) = (gray.cols(), gray.rows());

        let merged = self.likely_teeth(gray, hsv)?;
        let image_area = (width as f64) * (height as f64);
        let min_area = image_area * self.config.min_teeth_region_ratio;

        // Largest blob; ties keep the first in scan order
        let mut best: Option<Rect> = None;
        let mut best_area = 0.0;
        for candidate in external_candidates(&merged)? {
            if candidate.area > best_area && candidate.area > min_area {
                best_area = candidate.area;
                best = Some(candidate.rect);
            }
        }

        let region = match best {
            Some(rect) => TeethRegion {
                window: expand_and_clamp(rect, self.config.teeth_region_margin, width, height),
                source: RegionSource::Detected,
            },
            None => TeethRegion {
                window: RoiWindow::from_fractions(
                    width,
                    height,
                    self.config.fallback_x,
                    self.config.fallback_y,
                )
                .truncated(),
                source: RegionSource::Fallback,
            },
        };

        log::debug!(
            "teeth region ({:?}): ({}, {})-({}, {})",
            region.source,
            region.window.x_min,
            region.window.y_min,
            region.window.x_max,
            region.window.y_max
        );
        Ok(region)
    }

    /// Sparse whitish-near-edges raster merged into connected blobs
    fn likely_teeth(&self, gray: &Mat, hsv: &Mat) -> Result<Mat> {
        let mut edges = Mat::default();
        canny(
            gray,
            &mut edges,
            self.config.canny_low_threshold,
            self.config.canny_high_threshold,
            3,
            false,
        )
        .map_err(|e| AnalysisError::opencv("Canny edge detection", e))?;

        let small = structuring_element(MORPH_RECT, (3, 3))?;
        let edge_zone = dilate_n(&edges, &small, EDGE_DILATE_ITERATIONS)?;

        let whitish = self.config.teeth_range.mask(hsv)?;
        let mut sparse = Mat::default();
        bitwise_and(&whitish, &whitish, &mut sparse, &edge_zone)
            .map_err(|e| AnalysisError::opencv("edge and whitish intersection", e))?;

        let wide = structuring_element(MORPH_RECT, REGION_KERNEL_SIZE)?;
        let closed = close(&sparse, &wide)?;
        dilate_n(&closed, &wide, REGION_DILATE_ITERATIONS)
    }
}

/// Grow a rectangle by `margin` on every side, clamped to the image
fn expand_and_clamp(rect: Rect, margin: i32, width: i32, height: i32) -> RoiWindow {
    let x1 = (rect.x - margin).max(0);
    let y1 = (rect.y - margin).max(0);
    let x2 = (rect.x + rect.width + margin).min(width);
    let y2 = (rect.y + rect.height + margin).min(height);
    RoiWindow::new(x1 as f64, y1 as f64, x2 as f64, y2 as f64)
}

impl RoiWindow {
    /// Snap the window to whole pixels (toward zero)
    fn truncated(self) -> Self {
        RoiWindow::new(
            self.x_min.trunc(),
            self.y_min.trunc(),
            self.x_max.trunc(),
            self.y_max.trunc(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ColorConverter;
    use opencv::core::{Scalar, CV_8UC3};
    use opencv::imgproc;

    fn analyse(image: &Mat) -> TeethRegion {
        let converter = ColorConverter::new();
        let gray = converter.to_gray(image).unwrap();
        let hsv = converter.to_hsv(image).unwrap();
        let config = LesionConfig::default();
        TeethRegionLocator::new(&config).locate(&gray, &hsv).unwrap()
    }

    #[test]
    fn test_expand_and_clamp() {
        let window = expand_and_clamp(Rect::new(10, 50, 100, 40), 20, 120, 200);
        assert_eq!(window, RoiWindow::new(0.0, 30.0, 120.0, 110.0));
    }

    #[test]
    fn test_flat_image_uses_fallback_region() {
        let image = Mat::new_rows_cols_with_default(300, 400, CV_8UC3, Scalar::all(100.0)).unwrap();
        let region = analyse(&image);

        assert_eq!(region.source, RegionSource::Fallback);
        assert_eq!(region.window, RoiWindow::new(60.0, 90.0, 340.0, 225.0));
    }

    #[test]
    fn test_striped_tooth_row_is_detected() {
        // Dark background with a row of white teeth separated by thin gaps
        let mut image =
            Mat::new_rows_cols_with_default(300, 400, CV_8UC3, Scalar::all(30.0)).unwrap();
        for i in 0..8 {
            let rect = Rect::new(60 + i * 36, 120, 30, 50);
            imgproc::rectangle(
                &mut image,
                rect,
                Scalar::all(235.0),
                imgproc::FILLED,
                imgproc::LINE_8,
                0,
            )
            .unwrap();
        }

        let region = analyse(&image);
        assert_eq!(region.source, RegionSource::Detected);
        // The row spans x 60..342, y 120..170; margin and merging only grow it
        assert!(region.window.x_min <= 60.0 && region.window.x_max >= 342.0);
        assert!(region.window.y_min <= 120.0 && region.window.y_max >= 170.0);
        assert!(region.window.x_min >= 0.0 && region.window.x_max <= 400.0);
    }
}
