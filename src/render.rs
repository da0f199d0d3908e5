//! Detection overlay rendering
//!
//! Draws each detection as a colored box with a filled label bar above
//! it, on a copy of the source image, and writes the result next to the
//! source with a style-specific filename suffix.

use std::path::{Path, PathBuf};

use opencv::{
    core::{Mat, Point, Rect, Vector},
    imgcodecs::imwrite,
    imgproc::{get_text_size, put_text, rectangle, FILLED, FONT_HERSHEY_SIMPLEX, LINE_8},
    prelude::*,
};
use palette::Srgb;

use crate::color::ColorConverter;
use crate::constants::render::{
    LABEL_PADDING, LESION_BOX_THICKNESS, LESION_FONT_SCALE, LESION_LABEL_HEIGHT, LESION_SUFFIX,
    SEGMENTER_BOX_THICKNESS, SEGMENTER_FONT_SCALE, SEGMENTER_LABEL_HEIGHT, SEGMENTER_SUFFIX,
    TEXT_OFFSET, TEXT_THICKNESS,
};
use crate::detection::{Detection, ToothCondition};
use crate::image_loader::load_image;
use crate::{AnalysisError, Result};

const WHITE: Srgb<u8> = Srgb::new(255, 255, 255);
const BLACK: Srgb<u8> = Srgb::new(0, 0, 0);
const GREEN: Srgb<u8> = Srgb::new(0, 255, 0);
const YELLOW: Srgb<u8> = Srgb::new(255, 255, 0);
const RED: Srgb<u8> = Srgb::new(255, 0, 0);
const ORANGE: Srgb<u8> = Srgb::new(255, 165, 0);
const MAGENTA: Srgb<u8> = Srgb::new(255, 0, 255);
const BLUE: Srgb<u8> = Srgb::new(0, 0, 255);

const SEGMENTER_COLORS: &[(ToothCondition, Srgb<u8>)] = &[(ToothCondition::Healthy, GREEN)];

const LESION_COLORS: &[(ToothCondition, Srgb<u8>)] = &[
    (ToothCondition::Cavity, RED),
    (ToothCondition::Calculus, YELLOW),
    (ToothCondition::Discoloration, ORANGE),
    (ToothCondition::Gingivitis, MAGENTA),
    (ToothCondition::Healthy, GREEN),
];

/// Overlay appearance for one detector's output
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderStyle {
    pub box_thickness: i32,
    pub font_scale: f64,
    /// Height of the filled bar behind the label
    pub label_height: i32,
    pub text_color: Srgb<u8>,
    pub colors: &'static [(ToothCondition, Srgb<u8>)],
    /// Color for conditions missing from `colors`
    pub default_color: Srgb<u8>,
    /// Token inserted before the file extension of the written image
    pub suffix: &'static str,
}

impl RenderStyle {
    /// Thin boxes, black text; green for healthy teeth, yellow otherwise
    pub fn segmenter() -> Self {
        Self {
            box_thickness: SEGMENTER_BOX_THICKNESS,
            font_scale: SEGMENTER_FONT_SCALE,
            label_height: SEGMENTER_LABEL_HEIGHT,
            text_color: BLACK,
            colors: SEGMENTER_COLORS,
            default_color: YELLOW,
            suffix: SEGMENTER_SUFFIX,
        }
    }

    /// Thick boxes, white text, one color per condition
    pub fn lesion() -> Self {
        Self {
            box_thickness: LESION_BOX_THICKNESS,
            font_scale: LESION_FONT_SCALE,
            label_height: LESION_LABEL_HEIGHT,
            text_color: WHITE,
            colors: LESION_COLORS,
            default_color: BLUE,
            suffix: LESION_SUFFIX,
        }
    }

    pub fn color_for(&self, condition: ToothCondition) -> Srgb<u8> {
        self.colors
            .iter()
            .find(|(c, _)| *c == condition)
            .map(|(_, color)| *color)
            .unwrap_or(self.default_color)
    }
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self::lesion()
    }
}

/// `"{label} {NN}%"` with the confidence rounded to a whole percent
pub fn label_text(detection: &Detection) -> String {
    format!(
        "{} {:.0}%",
        detection.class_name.ascii_label(),
        detection.confidence * 100.0
    )
}

/// Derive the output path: `<stem><suffix>.<ext>` in the same directory
///
/// A path without an extension gets `.png` so the encoder can pick a format.
pub fn annotated_path(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "png".to_string());
    path.with_file_name(format!("{stem}{suffix}.{extension}"))
}

/// Detection overlay renderer
#[derive(Debug, Clone, Default)]
pub struct DetectionRenderer {
    style: RenderStyle,
    converter: ColorConverter,
}

impl DetectionRenderer {
    pub fn new(style: RenderStyle) -> Self {
        Self {
            style,
            converter: ColorConverter::new(),
        }
    }

    pub fn style(&self) -> &RenderStyle {
        &self.style
    }

    /// Draw detections onto a copy of `image`
    pub fn draw(&self, image: &Mat, detections: &[Detection]) -> Result<Mat> {
        let mut canvas = image
            .try_clone()
            .map_err(|e| AnalysisError::opencv("image copy", e))?;

        for detection in detections {
            self.draw_one(&mut canvas, detection)?;
        }
        Ok(canvas)
    }

    fn draw_one(&self, canvas: &mut Mat, detection: &Detection) -> Result<()> {
        let color = self
            .converter
            .srgb_to_scalar(self.style.color_for(detection.class_name));
        let text_color = self.converter.srgb_to_scalar(self.style.text_color);
        let (x1, y1) = (detection.bbox.x1, detection.bbox.y1);

        rectangle(
            canvas,
            detection.bbox.to_rect(),
            color,
            self.style.box_thickness,
            LINE_8,
            0,
        )
        .map_err(|e| AnalysisError::opencv("box drawing", e))?;

        let label = label_text(detection);
        let mut baseline = 0;
        let text_size = get_text_size(
            &label,
            FONT_HERSHEY_SIMPLEX,
            self.style.font_scale,
            TEXT_THICKNESS,
            &mut baseline,
        )
        .map_err(|e| AnalysisError::opencv("text measurement", e))?;

        // Label bar sits on top of the box
        let bar = Rect::new(
            x1,
            y1 - self.style.label_height,
            text_size.width + LABEL_PADDING,
            self.style.label_height,
        );
        rectangle(canvas, bar, color, FILLED, LINE_8, 0)
            .map_err(|e| AnalysisError::opencv("label background", e))?;

        put_text(
            canvas,
            &label,
            Point::new(x1 + TEXT_OFFSET.0, y1 - TEXT_OFFSET.1),
            FONT_HERSHEY_SIMPLEX,
            self.style.font_scale,
            text_color,
            TEXT_THICKNESS,
            LINE_8,
            false,
        )
        .map_err(|e| AnalysisError::opencv("label text", e))?;

        Ok(())
    }

    /// Load `path`, draw `detections` and write the annotated copy
    ///
    /// An empty detection list produces a byte-for-byte copy of the source.
    ///
    /// # Returns
    ///
    /// Path of the written image, see [`annotated_path`]
    ///
    /// # Errors
    ///
    /// `ImageLoadError`/`InvalidImage` when the source cannot be decoded,
    /// `ImageWriteError` when the output cannot be encoded or written.
    pub fn render(&self, path: &Path, detections: &[Detection]) -> Result<PathBuf> {
        let image = load_image(path)?;
        let output = annotated_path(path, self.style.suffix);

        // Nothing to draw: copy the source so lossy formats are not re-encoded
        if detections.is_empty() && path.extension().is_some() {
            std::fs::copy(path, &output).map_err(|_| AnalysisError::ImageWriteError {
                path: output.display().to_string(),
            })?;
            log::debug!("no detections, copied source to {}", output.display());
            return Ok(output);
        }

        let annotated = self.draw(&image, detections)?;
        let output_str = output.to_str().ok_or_else(|| AnalysisError::ImageWriteError {
            path: output.display().to_string(),
        })?;

        let written = imwrite(output_str, &annotated, &Vector::new())
            .map_err(|e| AnalysisError::opencv("image write", e))?;
        if !written {
            return Err(AnalysisError::ImageWriteError {
                path: output_str.to_string(),
            });
        }

        log::debug!(
            "rendered {} detections to {}",
            detections.len(),
            output.display()
        );
        Ok(output)
    }
}
