//! Region-based lesion detection
//!
//! Implements color-based lesion screening that:
//! - Locates the tooth-bearing region of the frame (see [`super::region`])
//! - Masks calculus, cavity and discoloration colors in HSV
//! - Cleans the union of those masks and gates its contours
//! - Labels each survivor by its dominant symptom mask
//! - Falls back to whitish healthy-tooth regions when nothing is flagged
//!
//! The gingival-redness mask is computed and reported through
//! [`LesionReport::gingival_redness`] but does not produce detections.

use std::cmp::Ordering;

use opencv::{
    core::{Mat, Rect},
    imgproc::MORPH_ELLIPSE,
    prelude::*,
};
use serde::Serialize;

use crate::color::{coverage_in_rect, mean_in_rect, union_masks, ColorConverter};
use crate::config::{LesionConfig, Sensitivity};
use crate::constants::lesion::CLEANUP_KERNEL_SIZE;
use crate::detection::contours::{
    close_then_open, external_candidates, structuring_element, Candidate,
};
use crate::detection::region::{TeethRegion, TeethRegionLocator};
use crate::detection::{Detection, ToothCondition, ToothDetector};
use crate::render::RenderStyle;
use crate::Result;

/// Full outcome of a lesion detection run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LesionReport {
    /// Detections, largest contour first, capped at `max_detections`
    pub detections: Vec<Detection>,
    /// Spatial gate that was active for every detection
    pub teeth_region: TeethRegion,
    /// True when no lesion survived and the healthy-tooth stage ran
    pub healthy_fallback: bool,
    /// Fraction of the teeth region covered by gingival-redness colors
    pub gingival_redness: f64,
}

/// Per-symptom HSV masks for one image
struct SymptomMasks {
    calculus: Mat,
    cavity: Mat,
    stain: Mat,
    redness: Mat,
}

impl SymptomMasks {
    fn compute(hsv: &Mat, config: &LesionConfig) -> Result<Self> {
        let red_low = config.redness_ranges[0].mask(hsv)?;
        let red_high = config.redness_ranges[1].mask(hsv)?;
        Ok(Self {
            calculus: config.calculus_range.mask(hsv)?,
            cavity: config.cavity_range.mask(hsv)?,
            stain: config.stain_range.mask(hsv)?,
            redness: union_masks(&red_low, &red_high)?,
        })
    }

    /// Union of the masks that produce detections
    fn combined(&self) -> Result<Mat> {
        let calculus_or_cavity = union_masks(&self.calculus, &self.cavity)?;
        union_masks(&calculus_or_cavity, &self.stain)
    }
}

/// Region-based lesion detector
#[derive(Debug, Clone)]
pub struct LesionDetector {
    config: LesionConfig,
    converter: ColorConverter,
}

impl Default for LesionDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl LesionDetector {
    /// Create a detector with default parameters
    pub fn new() -> Self {
        Self::with_valid_config(LesionConfig::default())
    }

    /// Create a detector with default parameters and the given sensitivity
    pub fn with_sensitivity(sensitivity: Sensitivity) -> Self {
        Self::with_valid_config(LesionConfig::with_sensitivity(sensitivity))
    }

    /// Create a detector from a configuration section
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidParameter` if the section fails validation.
    pub fn from_config(config: &LesionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_valid_config(config.clone()))
    }

    fn with_valid_config(config: LesionConfig) -> Self {
        Self {
            config,
            converter: ColorConverter::new(),
        }
    }

    pub fn config(&self) -> &LesionConfig {
        &self.config
    }

    /// Detect lesions in a BGR image
    ///
    /// # Returns
    ///
    /// `LesionReport` with detections and the region they were gated by
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError` only when an OpenCV operation fails.
    pub fn analyze(&self, image: &Mat) -> Result<LesionReport> {
        log::debug!(
            "lesion detector: sensitivity {} (thresholds are sensitivity-independent)",
            self.config.sensitivity
        );

        let (width, height) = (image.cols(), image.rows());
        let image_area = (width as f64) * (height as f64);

        let gray = self.converter.to_gray(image)?;
        let hsv = self.converter.to_hsv(image)?;

        // Stage A: teeth region
        let teeth_region = TeethRegionLocator::new(&self.config).locate(&gray, &hsv)?;

        // Stage B: symptom masks
        let masks = SymptomMasks::compute(&hsv, &self.config)?;
        let kernel =
            structuring_element(MORPH_ELLIPSE, (CLEANUP_KERNEL_SIZE, CLEANUP_KERNEL_SIZE))?;
        let combined = close_then_open(&masks.combined()?, &kernel)?;

        // Stage C: candidates
        let mut detections = Vec::new();
        for candidate in self.gated(&combined, image_area, &teeth_region)? {
            if mean_in_rect(&gray, candidate.rect)? < self.config.min_brightness {
                continue;
            }
            if let Some(detection) = self.classify(&candidate, &masks)? {
                detections.push(detection);
            }
        }
        sort_largest_first(&mut detections);

        // Stage D: healthy fallback
        let healthy_fallback = detections.is_empty();
        if healthy_fallback {
            log::info!("lesion detector: no lesions found, detecting healthy teeth");
            let whitish = self.config.healthy_range.mask(&hsv)?;
            let cleaned = close_then_open(&whitish, &kernel)?;
            detections = self
                .gated(&cleaned, image_area, &teeth_region)?
                .into_iter()
                .map(|candidate| Detection {
                    bbox: candidate.bbox(),
                    class_name: ToothCondition::Healthy,
                    confidence: self.config.healthy_confidence,
                    area: candidate.area,
                })
                .collect();
            sort_largest_first(&mut detections);
        }

        detections.truncate(self.config.max_detections);

        let gingival_redness = coverage_in_rect(&masks.redness, window_rect(&teeth_region))?;
        log::debug!(
            "lesion detector: {} detections (fallback: {}), gingival redness {:.3}",
            detections.len(),
            healthy_fallback,
            gingival_redness
        );

        Ok(LesionReport {
            detections,
            teeth_region,
            healthy_fallback,
            gingival_redness,
        })
    }

    /// Contours of `mask` passing the size, region and aspect gates
    fn gated(&self, mask: &Mat, image_area: f64, region: &TeethRegion) -> Result<Vec<Candidate>> {
        Ok(external_candidates(mask)?
            .into_iter()
            .filter(|c| {
                c.passes_gates(
                    image_area,
                    self.config.area_ratio,
                    &region.window,
                    self.config.aspect_ratio,
                )
            })
            .collect())
    }

    /// Label a candidate by its dominant symptom, or drop it
    fn classify(&self, candidate: &Candidate, masks: &SymptomMasks) -> Result<Option<Detection>> {
        let cavity_ratio = coverage_in_rect(&masks.cavity, candidate.rect)?;
        let calculus_ratio = coverage_in_rect(&masks.calculus, candidate.rect)?;
        let stain_ratio = coverage_in_rect(&masks.stain, candidate.rect)?;

        Ok(self
            .label(cavity_ratio, calculus_ratio, stain_ratio)
            .map(|(class_name, confidence)| Detection {
                bbox: candidate.bbox(),
                class_name,
                confidence,
                area: candidate.area,
            }))
    }

    /// Priority: cavity, then calculus, then discoloration
    fn label(
        &self,
        cavity_ratio: f64,
        calculus_ratio: f64,
        stain_ratio: f64,
    ) -> Option<(ToothCondition, f64)> {
        let config = &self.config;
        if cavity_ratio > config.cavity_ratio_threshold {
            let severity = cavity_ratio * config.cavity_severity_scale;
            Some((ToothCondition::Cavity, severity.min(1.0)))
        } else if calculus_ratio > config.calculus_ratio_threshold {
            let severity = calculus_ratio * config.calculus_severity_scale;
            Some((ToothCondition::Calculus, severity.min(1.0)))
        } else if stain_ratio > config.stain_ratio_threshold {
            let severity = stain_ratio * config.stain_severity_scale;
            Some((ToothCondition::Discoloration, severity.min(1.0)))
        } else {
            None
        }
    }
}

fn sort_largest_first(detections: &mut [Detection]) {
    detections.sort_by(|a, b| b.area.partial_cmp(&a.area).unwrap_or(Ordering::Equal));
}

fn window_rect(region: &TeethRegion) -> Rect {
    region.window.to_rect()
}

impl ToothDetector for LesionDetector {
    fn name(&self) -> &'static str {
        "lesion_detector"
    }

    fn detect(&self, image: &Mat) -> Result<Vec<Detection>> {
        self.analyze(image).map(|report| report.detections)
    }

    fn render_style(&self) -> RenderStyle {
        RenderStyle::lesion()
    }
}
