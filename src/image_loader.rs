//! Image input handling
//!
//! Detectors accept either a file path or an already decoded OpenCV
//! buffer through [`ImageSource`]. The source is resolved once at the
//! start of a detection into a single BGR `Mat`.
//!
//! ## Design
//!
//! Files are decoded with the `image` crate, turned upright according to
//! their EXIF orientation tag, and copied into an OpenCV `Mat` in BGR
//! order, the standard OpenCV color layout. Decoded
//! buffers are checked for size and channel count; grayscale and BGRA
//! buffers are converted to BGR, anything else is rejected.

use std::borrow::Cow;
use std::path::Path;

use opencv::{
    core::{Mat, Scalar, CV_8UC1, CV_8UC3, CV_8UC4},
    imgproc::{cvt_color_def, COLOR_BGRA2BGR, COLOR_GRAY2BGR},
    prelude::*,
};

use crate::error::{AnalysisError, Result};

/// Where the pixels of an image come from
#[derive(Debug, Clone, Copy)]
pub enum ImageSource<'a> {
    /// Image file on disk
    Path(&'a Path),
    /// Pre-decoded interleaved buffer (BGR, BGRA or grayscale, 8-bit)
    Decoded(&'a Mat),
}

impl<'a> ImageSource<'a> {
    pub fn from_path(path: &'a Path) -> Self {
        ImageSource::Path(path)
    }

    pub fn from_mat(mat: &'a Mat) -> Self {
        ImageSource::Decoded(mat)
    }

    /// Resolve the source into a BGR `Mat`
    ///
    /// Files are decoded; BGR buffers are borrowed without copying.
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::ImageLoadError` if the file cannot be read
    /// or decoded, and `AnalysisError::InvalidImage` for empty buffers or
    /// unsupported pixel types.
    pub fn resolve(&self) -> Result<Cow<'a, Mat>> {
        match *self {
            ImageSource::Path(path) => load_image(path).map(Cow::Owned),
            ImageSource::Decoded(mat) => normalize_decoded(mat),
        }
    }
}

impl<'a> From<&'a Path> for ImageSource<'a> {
    fn from(path: &'a Path) -> Self {
        ImageSource::Path(path)
    }
}

impl<'a> From<&'a Mat> for ImageSource<'a> {
    fn from(mat: &'a Mat) -> Self {
        ImageSource::Decoded(mat)
    }
}

/// Load an image from disk and convert to OpenCV Mat (BGR format)
///
/// # Errors
///
/// Returns `AnalysisError::ImageLoadError` if:
/// - File cannot be opened
/// - Format is not recognised
/// - Decoding fails
///
/// # Example
///
/// ```rust,no_run
/// use tooth_scan::image_loader::load_image;
/// use opencv::prelude::*;
/// use std::path::Path;
///
/// let mat = load_image(Path::new("mouth.jpg"))?;
/// println!("Loaded image: {}x{}", mat.cols(), mat.rows());
/// # Ok::<(), tooth_scan::AnalysisError>(())
/// ```
pub fn load_image(path: &Path) -> Result<Mat> {
    use image::metadata::Orientation;
    use image::{DynamicImage, ImageDecoder, ImageReader};

    let reader = ImageReader::open(path)
        .map_err(|e| {
            AnalysisError::image_load(format!("Failed to open image file: {}", path.display()), e)
        })?
        .with_guessed_format()
        .map_err(|e| {
            AnalysisError::image_load(format!("Failed to read image header: {}", path.display()), e)
        })?;

    let mut decoder = reader.into_decoder().map_err(|e| {
        AnalysisError::image_load(format!("Failed to decode image: {}", path.display()), e)
    })?;
    let orientation = decoder.orientation().unwrap_or_else(|e| {
        log::debug!("ignoring unreadable orientation in {}: {}", path.display(), e);
        Orientation::NoTransforms
    });

    let mut img = DynamicImage::from_decoder(decoder).map_err(|e| {
        AnalysisError::image_load(format!("Failed to decode image: {}", path.display()), e)
    })?;
    // Camera photos store the upright orientation in EXIF
    img.apply_orientation(orientation);

    let rgb_img = img.to_rgb8();
    let (width, height) = rgb_img.dimensions();
    if width == 0 || height == 0 {
        return Err(AnalysisError::InvalidImage {
            reason: format!("{} has no pixels", path.display()),
        });
    }

    rgb_to_bgr_mat(rgb_img.as_raw(), width as i32, height as i32)
}

/// Check a caller-supplied buffer and bring it to 3-channel BGR
fn normalize_decoded(mat: &Mat) -> Result<Cow<'_, Mat>> {
    if mat.empty() || mat.rows() == 0 || mat.cols() == 0 {
        return Err(AnalysisError::InvalidImage {
            reason: "decoded buffer is empty".into(),
        });
    }

    let code = match mat.typ() {
        t if t == CV_8UC3 => return Ok(Cow::Borrowed(mat)),
        t if t == CV_8UC1 => COLOR_GRAY2BGR,
        t if t == CV_8UC4 => COLOR_BGRA2BGR,
        other => {
            return Err(AnalysisError::InvalidImage {
                reason: format!("unsupported pixel type {} ({} channels)", other, mat.channels()),
            })
        }
    };

    let mut bgr = Mat::default();
    cvt_color_def(mat, &mut bgr, code)
        .map_err(|e| AnalysisError::opencv("buffer conversion to BGR", e))?;
    Ok(Cow::Owned(bgr))
}

/// Convert RGB byte buffer to OpenCV BGR Mat
fn rgb_to_bgr_mat(rgb_data: &[u8], width: i32, height: i32) -> Result<Mat> {
    let expected = (width as usize) * (height as usize) * 3;
    if rgb_data.len() != expected {
        return Err(AnalysisError::InvalidImage {
            reason: format!("expected {} bytes, got {}", expected, rgb_data.len()),
        });
    }

    let mut mat = Mat::new_rows_cols_with_default(height, width, CV_8UC3, Scalar::all(0.0))
        .map_err(|e| AnalysisError::opencv("Mat allocation", e))?;

    let bgr = mat
        .data_bytes_mut()
        .map_err(|e| AnalysisError::opencv("Mat data access", e))?;

    // BGR order for OpenCV
    for (dst, src) in bgr.chunks_exact_mut(3).zip(rgb_data.chunks_exact(3)) {
        dst[0] = src[2];
        dst[1] = src[1];
        dst[2] = src[0];
    }

    Ok(mat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::Vec3b;

    #[test]
    fn test_rgb_to_bgr_conversion() {
        // Test 2x2 image: red, green, blue, white
        let rgb_data = vec![
            255, 0, 0,    // Red
            0, 255, 0,    // Green
            0, 0, 255,    // Blue
            255, 255, 255 // White
        ];

        let mat = rgb_to_bgr_mat(&rgb_data, 2, 2).unwrap();

        let pixel_0_0: &Vec3b = mat.at_2d(0, 0).unwrap();
        assert_eq!((pixel_0_0[0], pixel_0_0[1], pixel_0_0[2]), (0, 0, 255));

        let pixel_0_1: &Vec3b = mat.at_2d(0, 1).unwrap();
        assert_eq!((pixel_0_1[0], pixel_0_1[1], pixel_0_1[2]), (0, 255, 0));

        let pixel_1_0: &Vec3b = mat.at_2d(1, 0).unwrap();
        assert_eq!((pixel_1_0[0], pixel_1_0[1], pixel_1_0[2]), (255, 0, 0));

        let pixel_1_1: &Vec3b = mat.at_2d(1, 1).unwrap();
        assert_eq!((pixel_1_1[0], pixel_1_1[1], pixel_1_1[2]), (255, 255, 255));
    }

    #[test]
    fn test_rgb_buffer_size_mismatch() {
        let err = rgb_to_bgr_mat(&[0, 0, 0], 2, 2).unwrap_err();
        assert!(err.is_decode_failure());
    }

    #[test]
    fn test_missing_file_is_decode_failure() {
        let err = load_image(Path::new("no_such_mouth.jpg")).unwrap_err();
        assert!(err.is_decode_failure());
    }

    #[test]
    fn test_corrupt_file_is_decode_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"definitely not a png").unwrap();

        let err = load_image(&path).unwrap_err();
        assert!(err.is_decode_failure());
    }

    /// JPEG with an APP1 segment carrying only an orientation tag
    fn jpeg_with_orientation(image: image::RgbImage, orientation: u8) -> Vec<u8> {
        let mut encoded = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(image)
            .write_to(&mut encoded, image::ImageFormat::Jpeg)
            .unwrap();
        let encoded = encoded.into_inner();

        let mut app1 = vec![0xFF, 0xE1, 0x00, 0x22];
        app1.extend_from_slice(b"Exif\0\0");
        // Big-endian TIFF header, one IFD entry: 0x0112 SHORT = orientation
        app1.extend_from_slice(&[0x4D, 0x4D, 0x00, 0x2A, 0x00, 0x00, 0x00, 0x08]);
        app1.extend_from_slice(&[0x00, 0x01]);
        app1.extend_from_slice(&[0x01, 0x12, 0x00, 0x03, 0x00, 0x00, 0x00, 0x01]);
        app1.extend_from_slice(&[0x00, orientation, 0x00, 0x00]);
        app1.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);

        // Right after SOI
        let mut jpeg = encoded[..2].to_vec();
        jpeg.extend_from_slice(&app1);
        jpeg.extend_from_slice(&encoded[2..]);
        jpeg
    }

    #[test]
    fn test_exif_orientation_is_applied() {
        // Red left half, blue right half, 40 wide by 20 tall
        let photo = image::RgbImage::from_fn(40, 20, |x, _| {
            if x < 20 {
                image::Rgb([255, 0, 0])
            } else {
                image::Rgb([0, 0, 255])
            }
        });

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rotated.jpg");
        std::fs::write(&path, jpeg_with_orientation(photo, 6)).unwrap();

        // Orientation 6 turns the frame 90 degrees clockwise
        let mat = load_image(&path).unwrap();
        assert_eq!((mat.cols(), mat.rows()), (20, 40));

        // Left half ends up on top; BGR so red is channel 2
        let top: &Vec3b = mat.at_2d(5, 10).unwrap();
        assert!(top[2] > 200 && top[0] < 60);
        let bottom: &Vec3b = mat.at_2d(34, 10).unwrap();
        assert!(bottom[0] > 200 && bottom[2] < 60);
    }

    #[test]
    fn test_bgr_buffer_is_borrowed() {
        let mat = Mat::new_rows_cols_with_default(4, 4, CV_8UC3, Scalar::all(10.0)).unwrap();
        let resolved = ImageSource::from_mat(&mat).resolve().unwrap();
        assert!(matches!(resolved, Cow::Borrowed(_)));
    }

    #[test]
    fn test_gray_buffer_is_expanded() {
        let mat = Mat::new_rows_cols_with_default(4, 4, CV_8UC1, Scalar::all(10.0)).unwrap();
        let resolved = ImageSource::from_mat(&mat).resolve().unwrap();
        assert_eq!(resolved.typ(), CV_8UC3);
        assert_eq!(resolved.rows(), 4);
    }

    #[test]
    fn test_empty_buffer_rejected() {
        let mat = Mat::default();
        let err = ImageSource::from_mat(&mat).resolve().unwrap_err();
        assert!(err.is_decode_failure());
    }
}
