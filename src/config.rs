//! Configuration structures for the detection pipeline.
//!
//! This module defines the tunable parameters of both detectors,
//! organized into one section per detector. Defaults come from
//! [`crate::constants`].
//!
//! # Configuration Loading
//!
//! Configuration can be loaded from JSON files or constructed programmatically:
//!
//! ```no_run
//! use tooth_scan::DetectorConfig;
//! use std::path::Path;
//!
//! // Load from file
//! let config = DetectorConfig::from_json_file(Path::new("detector.json"))?;
//!
//! // Or use defaults
//! let config = DetectorConfig::default();
//! # Ok::<(), tooth_scan::AnalysisError>(())
//! ```
//!
//! A configuration is read once and handed to detectors by reference;
//! nothing here is mutated while a detection runs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::color::HsvRange;
use crate::constants::{lesion, segmenter};
use crate::{AnalysisError, Result};

/// Open interval `(min, max)` used for the geometric gates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Strict containment: `min < value < max`
    pub fn contains(&self, value: f64) -> bool {
        self.min < value && value < self.max
    }

    fn is_ordered(&self) -> bool {
        self.min < self.max
    }
}

impl From<(f64, f64)> for Bounds {
    fn from((min, max): (f64, f64)) -> Self {
        Self::new(min, max)
    }
}

/// Requested detection sensitivity for the lesion detector
///
/// Accepted and carried through the configuration, but the current
/// heuristics use the same thresholds at every level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sensitivity {
    Low,
    #[default]
    Medium,
    High,
}

impl fmt::Display for Sensitivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Sensitivity::Low => "low",
            Sensitivity::Medium => "medium",
            Sensitivity::High => "high",
        };
        f.write_str(name)
    }
}

impl FromStr for Sensitivity {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Sensitivity::Low),
            "medium" => Ok(Sensitivity::Medium),
            "high" => Ok(Sensitivity::High),
            _ => Err(AnalysisError::invalid_parameter("sensitivity", s)),
        }
    }
}

/// Complete detector configuration.
///
/// Can be serialized to/from JSON for reproducible runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DetectorConfig {
    /// Individual-tooth segmenter parameters
    #[serde(default)]
    pub segmenter: SegmenterConfig,

    /// Region-based lesion detector parameters
    #[serde(default)]
    pub lesion: LesionConfig,
}

/// Individual-tooth segmenter parameters.
///
/// Controls the edge-preserving smoothing, adaptive threshold and the
/// gates a contour must pass to count as a tooth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmenterConfig {
    /// Bilateral filter diameter
    pub bilateral_diameter: i32,

    /// Bilateral filter sigma in color space
    pub bilateral_sigma_color: f64,

    /// Bilateral filter sigma in coordinate space
    pub bilateral_sigma_space: f64,

    /// Adaptive threshold block size (odd, >= 3)
    pub adaptive_block_size: i32,

    /// Constant subtracted from the weighted local mean
    pub adaptive_c: f64,

    /// Contour area as fraction of image area
    pub area_ratio: Bounds,

    /// Horizontal window for the box center, as fraction of width
    pub center_x: Bounds,

    /// Vertical window for the box center, as fraction of height
    pub center_y: Bounds,

    /// Width / height
    pub aspect_ratio: Bounds,

    /// Mean grayscale brightness a tooth must exceed
    pub min_brightness: f64,

    /// Yellow-brown stain range
    pub stain_range: HsvRange,

    /// Stain coverage above which a tooth is labelled calculus
    pub stain_ratio_threshold: f64,

    /// Calculus confidence is `stain_ratio * scale`, capped
    pub stain_confidence_scale: f64,
    pub stain_confidence_cap: f64,

    /// Confidence reported for healthy teeth
    pub healthy_confidence: f64,

    /// Maximum number of teeth returned
    pub max_detections: usize,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            bilateral_diameter: segmenter::BILATERAL_DIAMETER,
            bilateral_sigma_color: segmenter::BILATERAL_SIGMA_COLOR,
            bilateral_sigma_space: segmenter::BILATERAL_SIGMA_SPACE,
            adaptive_block_size: segmenter::ADAPTIVE_BLOCK_SIZE,
            adaptive_c: segmenter::ADAPTIVE_C,
            area_ratio: Bounds::new(segmenter::MIN_AREA_RATIO, segmenter::MAX_AREA_RATIO),
            center_x: segmenter::CENTER_X_RANGE.into(),
            center_y: segmenter::CENTER_Y_RANGE.into(),
            aspect_ratio: segmenter::ASPECT_RANGE.into(),
            min_brightness: segmenter::MIN_BRIGHTNESS,
            stain_range: segmenter::STAIN_RANGE,
            stain_ratio_threshold: segmenter::STAIN_RATIO_THRESHOLD,
            stain_confidence_scale: segmenter::STAIN_CONFIDENCE_SCALE,
            stain_confidence_cap: segmenter::STAIN_CONFIDENCE_CAP,
            healthy_confidence: segmenter::HEALTHY_CONFIDENCE,
            max_detections: segmenter::MAX_DETECTIONS,
        }
    }
}

/// Region-based lesion detector parameters.
///
/// Covers teeth-region localisation, the symptom color ranges and the
/// candidate gates shared by the lesion and healthy-fallback stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LesionConfig {
    /// Requested sensitivity (does not change thresholds)
    #[serde(default)]
    pub sensitivity: Sensitivity,

    /// Canny edge detection low threshold
    pub canny_low_threshold: f64,

    /// Canny edge detection high threshold
    pub canny_high_threshold: f64,

    /// Whitish range used to find the teeth region
    pub teeth_range: HsvRange,

    /// Minimum teeth-region area as fraction of image area
    pub min_teeth_region_ratio: f64,

    /// Pixel margin added on each side of the teeth region
    pub teeth_region_margin: i32,

    /// Fallback teeth region, as fractions of width
    pub fallback_x: Bounds,

    /// Fallback teeth region, as fractions of height
    pub fallback_y: Bounds,

    pub calculus_range: HsvRange,
    pub cavity_range: HsvRange,
    pub stain_range: HsvRange,

    /// Gingival redness bands either side of the hue wrap-around
    pub redness_ranges: [HsvRange; 2],

    /// Whitish range for the healthy-tooth fallback
    pub healthy_range: HsvRange,

    /// Candidate area as fraction of image area
    pub area_ratio: Bounds,

    /// Width / height
    pub aspect_ratio: Bounds,

    /// Candidates at or above this mean brightness are kept
    pub min_brightness: f64,

    pub cavity_ratio_threshold: f64,
    pub calculus_ratio_threshold: f64,
    pub stain_ratio_threshold: f64,

    /// Severity is `coverage * scale`, capped at 1.0
    pub cavity_severity_scale: f64,
    pub calculus_severity_scale: f64,
    pub stain_severity_scale: f64,

    /// Confidence reported for fallback healthy teeth
    pub healthy_confidence: f64,

    /// Maximum number of detections returned
    pub max_detections: usize,
}

impl Default for LesionConfig {
    fn default() -> Self {
        Self {
            sensitivity: Sensitivity::default(),
            canny_low_threshold: lesion::CANNY_LOW_THRESHOLD,
            canny_high_threshold: lesion::CANNY_HIGH_THRESHOLD,
            teeth_range: lesion::TEETH_RANGE,
            min_teeth_region_ratio: lesion::MIN_TEETH_REGION_RATIO,
            teeth_region_margin: lesion::TEETH_REGION_MARGIN,
            fallback_x: lesion::FALLBACK_X_RANGE.into(),
            fallback_y: lesion::FALLBACK_Y_RANGE.into(),
            calculus_range: lesion::CALCULUS_RANGE,
            cavity_range: lesion::CAVITY_RANGE,
            stain_range: lesion::STAIN_RANGE,
            redness_ranges: [lesion::REDNESS_LOW_RANGE, lesion::REDNESS_HIGH_RANGE],
            healthy_range: lesion::HEALTHY_RANGE,
            area_ratio: Bounds::new(lesion::MIN_AREA_RATIO, lesion::MAX_AREA_RATIO),
            aspect_ratio: lesion::ASPECT_RANGE.into(),
            min_brightness: lesion::MIN_BRIGHTNESS,
            cavity_ratio_threshold: lesion::CAVITY_RATIO_THRESHOLD,
            calculus_ratio_threshold: lesion::CALCULUS_RATIO_THRESHOLD,
            stain_ratio_threshold: lesion::STAIN_RATIO_THRESHOLD,
            cavity_severity_scale: lesion::CAVITY_SEVERITY_SCALE,
            calculus_severity_scale: lesion::CALCULUS_SEVERITY_SCALE,
            stain_severity_scale: lesion::STAIN_SEVERITY_SCALE,
            healthy_confidence: lesion::HEALTHY_CONFIDENCE,
            max_detections: lesion::MAX_DETECTIONS,
        }
    }
}

impl LesionConfig {
    /// Default configuration carrying the requested sensitivity
    pub fn with_sensitivity(sensitivity: Sensitivity) -> Self {
        Self {
            sensitivity,
            ..Self::default()
        }
    }
}

fn check_bounds(name: &str, bounds: &Bounds) -> Result<()> {
    if !bounds.is_ordered() {
        return Err(AnalysisError::invalid_parameter(
            name,
            format!("({}, {})", bounds.min, bounds.max),
        ));
    }
    Ok(())
}

fn check_fraction_bounds(name: &str, bounds: &Bounds) -> Result<()> {
    check_bounds(name, bounds)?;
    if bounds.min < 0.0 || bounds.max > 1.0 {
        return Err(AnalysisError::invalid_parameter(
            name,
            format!("({}, {})", bounds.min, bounds.max),
        ));
    }
    Ok(())
}

fn check_range(name: &str, range: &HsvRange) -> Result<()> {
    if !range.is_valid() {
        return Err(AnalysisError::invalid_parameter(
            name,
            format!("{:?}..={:?}", range.lower, range.upper),
        ));
    }
    Ok(())
}

fn check_positive(name: &str, value: f64) -> Result<()> {
    if value.is_nan() || value <= 0.0 {
        return Err(AnalysisError::invalid_parameter(name, value));
    }
    Ok(())
}

fn check_confidence(name: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(AnalysisError::invalid_parameter(name, value));
    }
    Ok(())
}

impl SegmenterConfig {
    /// Reject parameter combinations OpenCV or the gates cannot use
    pub fn validate(&self) -> Result<()> {
        if self.adaptive_block_size < 3 || self.adaptive_block_size % 2 == 0 {
            return Err(AnalysisError::invalid_parameter(
                "segmenter.adaptive_block_size",
                self.adaptive_block_size,
            ));
        }
        if self.bilateral_diameter <= 0 {
            return Err(AnalysisError::invalid_parameter(
                "segmenter.bilateral_diameter",
                self.bilateral_diameter,
            ));
        }
        check_fraction_bounds("segmenter.area_ratio", &self.area_ratio)?;
        check_fraction_bounds("segmenter.center_x", &self.center_x)?;
        check_fraction_bounds("segmenter.center_y", &self.center_y)?;
        check_bounds("segmenter.aspect_ratio", &self.aspect_ratio)?;
        check_range("segmenter.stain_range", &self.stain_range)?;
        check_confidence("segmenter.stain_ratio_threshold", self.stain_ratio_threshold)?;
        check_positive("segmenter.stain_confidence_scale", self.stain_confidence_scale)?;
        check_confidence("segmenter.stain_confidence_cap", self.stain_confidence_cap)?;
        check_confidence("segmenter.healthy_confidence", self.healthy_confidence)?;
        Ok(())
    }
}

impl LesionConfig {
    /// Reject parameter combinations OpenCV or the gates cannot use
    pub fn validate(&self) -> Result<()> {
        if self.canny_low_threshold > self.canny_high_threshold {
            return Err(AnalysisError::invalid_parameter(
                "lesion.canny_low_threshold",
                self.canny_low_threshold,
            ));
        }
        if self.teeth_region_margin < 0 {
            return Err(AnalysisError::invalid_parameter(
                "lesion.teeth_region_margin",
                self.teeth_region_margin,
            ));
        }
        check_fraction_bounds("lesion.fallback_x", &self.fallback_x)?;
        check_fraction_bounds("lesion.fallback_y", &self.fallback_y)?;
        check_fraction_bounds("lesion.area_ratio", &self.area_ratio)?;
        check_bounds("lesion.aspect_ratio", &self.aspect_ratio)?;
        check_range("lesion.teeth_range", &self.teeth_range)?;
        check_range("lesion.calculus_range", &self.calculus_range)?;
        check_range("lesion.cavity_range", &self.cavity_range)?;
        check_range("lesion.stain_range", &self.stain_range)?;
        check_range("lesion.redness_ranges[0]", &self.redness_ranges[0])?;
        check_range("lesion.redness_ranges[1]", &self.redness_ranges[1])?;
        check_range("lesion.healthy_range", &self.healthy_range)?;
        check_confidence("lesion.cavity_ratio_threshold", self.cavity_ratio_threshold)?;
        check_confidence("lesion.calculus_ratio_threshold", self.calculus_ratio_threshold)?;
        check_confidence("lesion.stain_ratio_threshold", self.stain_ratio_threshold)?;
        check_positive("lesion.cavity_severity_scale", self.cavity_severity_scale)?;
        check_positive("lesion.calculus_severity_scale", self.calculus_severity_scale)?;
        check_positive("lesion.stain_severity_scale", self.stain_severity_scale)?;
        check_confidence("lesion.healthy_confidence", self.healthy_confidence)?;
        Ok(())
    }
}

impl DetectorConfig {
    /// Validate both detector sections
    pub fn validate(&self) -> Result<()> {
        self.segmenter.validate()?;
        self.lesion.validate()
    }

    /// Load configuration from JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AnalysisError::config(format!("cannot read {}", path.display()), e))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| AnalysisError::config(format!("cannot parse {}", path.display()), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to JSON file
    pub fn to_json_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| AnalysisError::config("cannot serialize configuration", e))?;
        std::fs::write(path, json)
            .map_err(|e| AnalysisError::config(format!("cannot write {}", path.display()), e))?;
        Ok(())
    }
}
