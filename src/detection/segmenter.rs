//! Individual-tooth segmentation
//!
//! Isolates single teeth in the center of an intraoral photo:
//! - Edge-preserving bilateral smoothing of the grayscale image
//! - Gaussian adaptive threshold, inverted so tooth outlines are foreground
//! - External contours gated by area, central window, aspect and brightness
//! - Yellow-brown stain coverage inside each box decides healthy vs calculus
//!
//! Results are ordered left to right and capped at the visible-tooth count.

use opencv::{
    core::{bitwise_not, Mat, BORDER_DEFAULT},
    imgproc::{adaptive_threshold, bilateral_filter, ADAPTIVE_THRESH_GAUSSIAN_C, THRESH_BINARY},
    prelude::*,
};

use crate::color::{coverage_in_rect, mean_in_rect, ColorConverter};
use crate::config::SegmenterConfig;
use crate::detection::contours::{external_candidates, Candidate};
use crate::detection::{Detection, RoiWindow, ToothCondition, ToothDetector};
use crate::render::RenderStyle;
use crate::{AnalysisError, Result};

/// Individual-tooth segmenter
#[derive(Debug, Clone)]
pub struct ToothSegmenter {
    config: SegmenterConfig,
    converter: ColorConverter,
}

impl Default for ToothSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

impl ToothSegmenter {
    /// Create a segmenter with default parameters
    pub fn new() -> Self {
        Self::with_valid_config(SegmenterConfig::default())
    }

    /// Create a segmenter from a configuration section
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidParameter` if the section fails validation.
    pub fn from_config(config: &SegmenterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_valid_config(config.clone()))
    }

    fn with_valid_config(config: SegmenterConfig) -> Self {
        Self {
            config,
            converter: ColorConverter::new(),
        }
    }

    pub fn config(&self) -> &SegmenterConfig {
        &self.config
    }

    /// Central window a tooth center must fall in for an image of this size
    pub fn center_window(&self, width: i32, height: i32) -> RoiWindow {
        RoiWindow::from_fractions(width, height, self.config.center_x, self.config.center_y)
    }

    /// Find individual teeth in a BGR image
    ///
    /// # Returns
    ///
    /// Teeth sorted by left edge, at most `max_detections`. An image
    /// without qualifying regions yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError` only when an OpenCV operation fails.
    pub fn segment(&self, image: &Mat) -> Result<Vec<Detection>> {
        let (width, height) = (image.cols(), image.rows());
        let image_area = (width as f64) * (height as f64);
        let window = self.center_window(width, height);

        // Step 1: Grayscale + edge-preserving smoothing
        let gray = self.converter.to_gray(image)?;
        let smoothed = self.smooth(&gray)?;

        // Step 2: Inverted adaptive threshold
        let outlines = self.threshold_outlines(&smoothed)?;

        // Step 3: Geometric gates
        let candidates: Vec<Candidate> = external_candidates(&outlines)?
            .into_iter()
            .filter(|c| {
                c.passes_gates(
                image_area,
                self.config.area_ratio,
                &window,
                self.config.aspect_ratio,
            )
            })
            .collect();

        if candidates.is_empty() {
            log::debug!("segmenter: no contour passed the geometric gates");
            return Ok(Vec::new());
        }

        // Step 4: Brightness gate + stain classification
        let hsv = self.converter.to_hsv(image)?;
        let stain_mask = self.config.stain_range.mask(&hsv)?;

        let mut detections = Vec::with_capacity(candidates.len());
        for candidate in &candidates {
            let brightness = mean_in_rect(&gray, candidate.rect)?;
            if brightness <= self.config.min_brightness {
                continue;
            }

            let stain_ratio = coverage_in_rect(&stain_mask, candidate.rect)?;
            detections.push(self.classify(candidate, stain_ratio));
        }

        // Step 5: Left-to-right order, capped
        detections.sort_by_key(|d| d.bbox.x1);
        detections.truncate(self.config.max_detections);

        log::debug!(
            "segmenter: {} of {} gated contours kept",
            detections.len(),
            candidates.len()
        );
        Ok(detections)
    }

    fn smooth(&self, gray: &Mat) -> Result<Mat> {
        let mut smoothed = Mat::default();
        bilateral_filter(
            gray,
            &mut smoothed,
            self.config.bilateral_diameter,
            self.config.bilateral_sigma_color,
            self.config.bilateral_sigma_space,
            BORDER_DEFAULT,
        )
        .map_err(|e| AnalysisError::opencv("bilateral filter", e))?;
        Ok(smoothed)
    }

    /// Foreground = pixels darker than their neighbourhood, i.e. tooth outlines
    fn threshold_outlines(&self, smoothed: &Mat) -> Result<Mat> {
        let mut binary = Mat::default();
        adaptive_threshold(
            smoothed,
            &mut binary,
            255.0,
            ADAPTIVE_THRESH_GAUSSIAN_C,
            THRESH_BINARY,
            self.config.adaptive_block_size,
            self.config.adaptive_c,
        )
        .map_err(|e| AnalysisError::opencv("adaptive threshold", e))?;

        let mut inverted = Mat::default();
        bitwise_not(&binary, &mut inverted, &Mat::default())
            .map_err(|e| AnalysisError::opencv("threshold inversion", e))?;
        Ok(inverted)
    }

    fn classify(&self, candidate: &Candidate, stain_ratio: f64) -> Detection {
        let (class_name, confidence) = if stain_ratio > self.config.stain_ratio_threshold {
            (
                ToothCondition::Calculus,
                (stain_ratio * self.config.stain_confidence_scale)
                    .min(self.config.stain_confidence_cap),
            )
        } else {
            (ToothCondition::Healthy, self.config.healthy_confidence)
        };

        Detection {
            bbox: candidate.bbox(),
            class_name,
            confidence,
            area: candidate.area,
        }
    }
}

impl ToothDetector for ToothSegmenter {
    fn name(&self) -> &'static str {
        "tooth_segmenter"
    }

    fn detect(&self, image: &Mat) -> Result<Vec<Detection>> {
        self.segment(image)
    }

    fn render_style(&self) -> RenderStyle {
        RenderStyle::segmenter()
    }
}
