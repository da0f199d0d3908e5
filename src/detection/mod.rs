//! Tooth and lesion detection
//!
//! This module holds the detection output types, the capability trait
//! shared by both detectors, and the detectors themselves:
//! - [`ToothSegmenter`] isolates individual teeth in the center of the frame
//! - [`LesionDetector`] masks symptom colors inside the located teeth region

pub mod contours;
pub mod lesion;
pub mod region;
pub mod segmenter;

pub use lesion::{LesionDetector, LesionReport};
pub use region::{RegionSource, TeethRegion, TeethRegionLocator};
pub use segmenter::ToothSegmenter;

use std::fmt;

use opencv::core::{Mat, Rect};
use serde::{Deserialize, Serialize};

use crate::render::RenderStyle;
use crate::Result;

/// Visible condition a detection is labelled with
///
/// Serialized with the Vietnamese clinical labels used in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ToothCondition {
    #[serde(rename = "Răng khỏe mạnh")]
    Healthy,
    #[serde(rename = "Cao răng")]
    Calculus,
    #[serde(rename = "Sâu răng")]
    Cavity,
    #[serde(rename = "Răng đổi màu")]
    Discoloration,
    #[serde(rename = "Viêm lợi")]
    Gingivitis,
}

impl ToothCondition {
    pub const ALL: [ToothCondition; 5] = [
        ToothCondition::Healthy,
        ToothCondition::Calculus,
        ToothCondition::Cavity,
        ToothCondition::Discoloration,
        ToothCondition::Gingivitis,
    ];

    /// Report label
    pub fn label(&self) -> &'static str {
        match self {
            ToothCondition::Healthy => "Răng khỏe mạnh",
            ToothCondition::Calculus => "Cao răng",
            ToothCondition::Cavity => "Sâu răng",
            ToothCondition::Discoloration => "Răng đổi màu",
            ToothCondition::Gingivitis => "Viêm lợi",
        }
    }

    /// Label without diacritics, for fonts limited to ASCII
    pub fn ascii_label(&self) -> &'static str {
        match self {
            ToothCondition::Healthy => "Rang khoe manh",
            ToothCondition::Calculus => "Cao rang",
            ToothCondition::Cavity => "Sau rang",
            ToothCondition::Discoloration => "Rang doi mau",
            ToothCondition::Gingivitis => "Viem loi",
        }
    }
}

impl fmt::Display for ToothCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Axis-aligned box in image pixels, origin top-left, `x1 < x2`, `y1 < y2`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BoundingBox {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn from_rect(rect: Rect) -> Self {
        Self::new(rect.x, rect.y, rect.x + rect.width, rect.y + rect.height)
    }

    pub fn to_rect(&self) -> Rect {
        Rect::new(self.x1, self.y1, self.width(), self.height())
    }

    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    pub fn center(&self) -> (f64, f64) {
        (
            self.x1 as f64 + self.width() as f64 / 2.0,
            self.y1 as f64 + self.height() as f64 / 2.0,
        )
    }

    /// `0 <= x1 < x2 <= width` and `0 <= y1 < y2 <= height`
    pub fn is_within(&self, width: i32, height: i32) -> bool {
        0 <= self.x1
            && self.x1 < self.x2
            && self.x2 <= width
            && 0 <= self.y1
            && self.y1 < self.y2
            && self.y2 <= height
    }
}

/// One flagged region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub class_name: ToothCondition,
    /// Heuristic score in `[0, 1]`, not a calibrated probability
    pub confidence: f64,
    /// Area of the source contour in pixels
    pub area: f64,
}

/// Spatial gate a detection center must fall strictly inside
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoiWindow {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl RoiWindow {
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Self { x_min, y_min, x_max, y_max }
    }

    /// Window expressed as fractions of the image size
    pub fn from_fractions(
        width: i32,
        height: i32,
        x: crate::config::Bounds,
        y: crate::config::Bounds,
    ) -> Self {
        let (w, h) = (width as f64, height as f64);
        Self::new(w * x.min, h * y.min, w * x.max, h * y.max)
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.x_min < x && x < self.x_max && self.y_min < y && y < self.y_max
    }

    pub fn contains_center(&self, bbox: &BoundingBox) -> bool {
        let (cx, cy) = bbox.center();
        self.contains(cx, cy)
    }

    /// Integer rectangle covering the window, for sampling statistics
    pub fn to_rect(&self) -> Rect {
        let x = self.x_min.floor() as i32;
        let y = self.y_min.floor() as i32;
        Rect::new(
            x,
            y,
            (self.x_max.ceil() as i32 - x).max(0),
            (self.y_max.ceil() as i32 - y).max(0),
        )
    }
}

/// Common interface of the detection strategies
///
/// Implementations are stateless: the same image always produces the
/// same detections, and calls on different images may run concurrently.
pub trait ToothDetector {
    /// Short strategy name for logs and reports
    fn name(&self) -> &'static str;

    /// Run detection on a BGR image
    fn detect(&self, image: &Mat) -> Result<Vec<Detection>>;

    /// Overlay style used when drawing this strategy's output
    fn render_style(&self) -> RenderStyle;
}
