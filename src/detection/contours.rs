//! Contour extraction and morphology shared by both detectors

use opencv::{
    core::{Mat, Point, Rect, Size, Vector, BORDER_CONSTANT},
    imgproc::{
        bounding_rect, contour_area, dilate, find_contours, get_structuring_element,
        morphology_default_border_value, morphology_ex, CHAIN_APPROX_SIMPLE, MORPH_CLOSE,
        MORPH_OPEN, RETR_EXTERNAL,
    },
    prelude::*,
};

use crate::config::Bounds;
use crate::detection::{BoundingBox, RoiWindow};
use crate::{AnalysisError, Result};

type VectorOfPoint = Vector<Point>;

/// External contour reduced to what the gates look at
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub rect: Rect,
    pub area: f64,
}

impl Candidate {
    pub fn bbox(&self) -> BoundingBox {
        BoundingBox::from_rect(self.rect)
    }

    /// Width / height; `0.0` for a zero-height box so the aspect gate rejects it
    pub fn aspect_ratio(&self) -> f64 {
        if self.rect.height > 0 {
            self.rect.width as f64 / self.rect.height as f64
        } else {
            0.0
        }
    }

    /// Size, spatial and shape gates shared by every candidate stage
    pub fn passes_gates(
        &self,
        image_area: f64,
        area_ratio: Bounds,
        window: &RoiWindow,
        aspect_ratio: Bounds,
    ) -> bool {
        let area_bounds = Bounds::new(image_area * area_ratio.min, image_area * area_ratio.max);
        area_bounds.contains(self.area)
            && window.contains_center(&self.bbox())
            && aspect_ratio.contains(self.aspect_ratio())
    }
}

/// Outer contours of a binary mask, in OpenCV's scan order
pub fn external_candidates(binary: &Mat) -> Result<Vec<Candidate>> {
    let mut contours = Vector::<VectorOfPoint>::new();
    find_contours(
        binary,
        &mut contours,
        RETR_EXTERNAL,
        CHAIN_APPROX_SIMPLE,
        Point::new(0, 0),
    )
    .map_err(|e| AnalysisError::opencv("contour detection", e))?;

    let mut candidates = Vec::with_capacity(contours.len());
    for contour in contours.iter() {
        let area = contour_area(&contour, false)
            .map_err(|e| AnalysisError::opencv("contour area", e))?;
        let rect = bounding_rect(&contour)
            .map_err(|e| AnalysisError::opencv("bounding rect", e))?;
        candidates.push(Candidate { rect, area });
    }

    log::trace!("found {} external contours", candidates.len());
    Ok(candidates)
}

/// Structuring element of the given OpenCV shape and (width, height)
pub fn structuring_element(shape: i32, size: (i32, i32)) -> Result<Mat> {
    get_structuring_element(shape, Size::new(size.0, size.1), Point::new(-1, -1))
        .map_err(|e| AnalysisError::opencv("kernel creation", e))
}

fn morphology(src: &Mat, op: i32, kernel: &Mat, iterations: i32, name: &str) -> Result<Mat> {
    let border_value = morphology_default_border_value()
        .map_err(|e| AnalysisError::opencv("border value", e))?;
    let mut dst = Mat::default();
    morphology_ex(
        src,
        &mut dst,
        op,
        kernel,
        Point::new(-1, -1),
        iterations,
        BORDER_CONSTANT,
        border_value,
    )
    .map_err(|e| AnalysisError::opencv(name, e))?;
    Ok(dst)
}

/// Morphological closing
pub fn close(src: &Mat, kernel: &Mat) -> Result<Mat> {
    morphology(src, MORPH_CLOSE, kernel, 1, "closing")
}

/// Closing to fill small gaps, then opening to drop speckle
pub fn close_then_open(src: &Mat, kernel: &Mat) -> Result<Mat> {
    let closed = close(src, kernel)?;
    morphology(&closed, MORPH_OPEN, kernel, 1, "opening")
}

/// Dilation repeated `iterations` times
pub fn dilate_n(src: &Mat, kernel: &Mat, iterations: i32) -> Result<Mat> {
    let border_value = morphology_default_border_value()
        .map_err(|e| AnalysisError::opencv("border value", e))?;
    let mut dst = Mat::default();
    dilate(
        src,
        &mut dst,
        kernel,
        Point::new(-1, -1),
        iterations,
        BORDER_CONSTANT,
        border_value,
    )
    .map_err(|e| AnalysisError::opencv("dilation", e))?;
    Ok(dst)
}
