//! Per-rectangle statistics over single-channel images
//!
//! Rectangles are clipped to the image before sampling. An empty
//! intersection yields `0.0` rather than an error.

use opencv::{
    core::{Mat, Rect},
    prelude::*,
};

use crate::{AnalysisError, Result};

/// Clip a rectangle to the bounds of `image`
fn clip(image: &Mat, rect: Rect) -> Rect {
    let x1 = rect.x.clamp(0, image.cols());
    let y1 = rect.y.clamp(0, image.rows());
    let x2 = (rect.x + rect.width).min(image.cols());
    let y2 = (rect.y + rect.height).min(image.rows());
    Rect::new(x1, y1, (x2 - x1).max(0), (y2 - y1).max(0))
}

/// Walk the `CV_8UC1` pixels inside `rect`, returning (sum, nonzero count, total)
fn scan(image: &Mat, rect: Rect) -> Result<(u64, u64, u64)> {
    if image.channels() != 1 {
        return Err(AnalysisError::ProcessingError {
            message: format!("expected single-channel image, got {} channels", image.channels()),
        });
    }

    let rect = clip(image, rect);
    let mut sum = 0u64;
    let mut nonzero = 0u64;
    for row in rect.y..rect.y + rect.height {
        let pixels = image
            .at_row::<u8>(row)
            .map_err(|e| AnalysisError::opencv("row access", e))?;
        for &value in &pixels[rect.x as usize..(rect.x + rect.width) as usize] {
            sum += value as u64;
            if value > 0 {
                nonzero += 1;
            }
        }
    }

    Ok((sum, nonzero, (rect.width as u64) * (rect.height as u64)))
}

/// Mean intensity of a grayscale image inside `rect`
pub fn mean_in_rect(gray: &Mat, rect: Rect) -> Result<f64> {
    let (sum, _, total) = scan(gray, rect)?;
    if total == 0 {
        return Ok(0.0);
    }
    Ok(sum as f64 / total as f64)
}

/// Fraction of nonzero mask pixels inside `rect`
pub fn coverage_in_rect(mask: &Mat, rect: Rect) -> Result<f64> {
    let (_, nonzero, total) = scan(mask, rect)?;
    if total == 0 {
        return Ok(0.0);
    }
    Ok(nonzero as f64 / total as f64)
}
