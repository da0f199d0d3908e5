//! Integration tests for the public detection and rendering API
//!
//! These tests exercise the boundary functions end to end on synthetic
//! images:
//! - Geometric invariants of every detection (bounds, region, caps, order)
//! - Determinism
//! - The canonical segmenter and lesion scenarios
//! - Rendering, including the no-op paths
//! - Error handling for unreadable input

use std::path::Path;

use opencv::{
    core::{Mat, Rect, Scalar, Vector, CV_8UC3},
    imgcodecs::imwrite,
    imgproc,
    prelude::*,
};
use tempfile::TempDir;

use tooth_scan::image_loader::load_image;
use tooth_scan::{
    detect_lesions, render_detections, segment_teeth, AnalysisError, DetectionCascade,
    DetectorConfig, ImageSource, LesionDetector, RenderStyle, Sensitivity, ToothCondition,
    ToothSegmenter,
};

// ============================================================================
// Helpers
// ============================================================================

fn canvas(width: i32, height: i32, gray: f64) -> Mat {
    Mat::new_rows_cols_with_default(height, width, CV_8UC3, Scalar::all(gray)).unwrap()
}

fn fill(image: &mut Mat, rect: Rect, bgr: [f64; 3]) {
    imgproc::rectangle(
        image,
        rect,
        Scalar::new(bgr[0], bgr[1], bgr[2], 0.0),
        imgproc::FILLED,
        imgproc::LINE_8,
        0,
    )
    .unwrap();
}

fn save(image: &Mat, dir: &TempDir, name: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    assert!(imwrite(path.to_str().unwrap(), image, &Vector::new()).unwrap());
    path
}

const CALCULUS_BGR: [f64; 3] = [40.0, 150.0, 190.0];
const STAIN_BGR: [f64; 3] = [30.0, 66.0, 120.0];

/// Centered white block on mid gray
fn single_tooth() -> Mat {
    let mut image = canvas(640, 480, 128.0);
    fill(&mut image, Rect::new(290, 220, 60, 40), [255.0, 255.0, 255.0]);
    image
}

/// 100x60 block centered at (200, 150): 60% calculus, 40% stain-only
fn calculus_block() -> Mat {
    let mut image = canvas(400, 300, 100.0);
    fill(&mut image, Rect::new(150, 120, 60, 60), CALCULUS_BGR);
    fill(&mut image, Rect::new(210, 120, 40, 60), STAIN_BGR);
    image
}

/// Eight stain blocks of increasing width across the teeth region
fn stained_row() -> Mat {
    let mut image = canvas(400, 300, 100.0);
    for i in 0..8 {
        fill(&mut image, Rect::new(66 + i * 36, 140, 16 + i * 2, 20), STAIN_BGR);
    }
    image
}

// ============================================================================
// Canonical scenarios
// ============================================================================

#[test]
fn test_uniform_gray_has_no_detections() {
    let image = canvas(224, 224, 128.0);
    let source = ImageSource::from_mat(&image);

    assert!(segment_teeth(&source).is_empty());
    assert!(detect_lesions(&source, Sensitivity::Medium).is_empty());
}

#[test]
fn test_single_white_block_is_one_healthy_tooth() {
    let image = single_tooth();
    let detections = segment_teeth(&ImageSource::from_mat(&image));

    assert_eq!(detections.len(), 1);
    assert_eq!(detections[0].class_name, ToothCondition::Healthy);
    assert_eq!(detections[0].confidence, 0.85);
    let (cx, cy) = detections[0].bbox.center();
    assert!((cx - 320.0).abs() <= 4.0 && (cy - 240.0).abs() <= 4.0);
}

#[test]
fn test_calculus_block_is_one_calculus_lesion() {
    let image = calculus_block();
    let detections = detect_lesions(&ImageSource::from_mat(&image), Sensitivity::Medium);

    assert_eq!(detections.len(), 1);
    assert_eq!(detections[0].class_name, ToothCondition::Calculus);
    assert!(detections[0].confidence > 0.0 && detections[0].confidence < 1.0);
    assert!((detections[0].confidence - 0.72).abs() < 1e-9);
}

#[test]
fn test_sensitivity_does_not_change_results() {
    let image = calculus_block();
    let source = ImageSource::from_mat(&image);

    let low = detect_lesions(&source, Sensitivity::Low);
    let high = detect_lesions(&source, Sensitivity::High);
    assert_eq!(low, high);
}

// ============================================================================
// Invariants
// ============================================================================

#[test]
fn test_detections_are_deterministic() {
    let image = stained_row();
    let source = ImageSource::from_mat(&image);

    assert_eq!(
        detect_lesions(&source, Sensitivity::Medium),
        detect_lesions(&source, Sensitivity::Medium)
    );

    let tooth = single_tooth();
    let source = ImageSource::from_mat(&tooth);
    assert_eq!(segment_teeth(&source), segment_teeth(&source));
}

#[test]
fn test_lesions_are_capped_and_largest_first() {
    let image = stained_row();
    let report = LesionDetector::new().analyze(&image).unwrap();

    assert_eq!(report.detections.len(), 5);
    assert!(report
        .detections
        .windows(2)
        .all(|w| w[0].area >= w[1].area));
    // Widest block comes first
    assert_eq!(report.detections[0].bbox.x1, 66 + 7 * 36);

    for detection in &report.detections {
        assert!(detection.bbox.is_within(400, 300));
        assert!(report.teeth_region.window.contains_center(&detection.bbox));
        assert!((0.0..=1.0).contains(&detection.confidence));
        assert_eq!(detection.class_name, ToothCondition::Discoloration);
    }
}

#[test]
fn test_teeth_are_ordered_within_center_window() {
    let mut image = canvas(640, 480, 128.0);
    for i in 0..10 {
        fill(&mut image, Rect::new(165 + i * 32, 230, 14, 20), [250.0, 250.0, 250.0]);
    }

    let segmenter = ToothSegmenter::new();
    let detections = segmenter.segment(&image).unwrap();
    let window = segmenter.center_window(640, 480);

    // Ten candidates, only the eight leftmost are kept
    assert_eq!(detections.len(), 8);
    assert!(detections.windows(2).all(|w| w[0].bbox.x1 <= w[1].bbox.x1));
    for (i, detection) in detections.iter().enumerate() {
        assert!((detection.bbox.x1 - (165 + i as i32 * 32)).abs() <= 6);
    }
    for detection in &detections {
        assert!(detection.bbox.is_within(640, 480));
        assert!(window.contains_center(&detection.bbox));
        assert!((0.0..=1.0).contains(&detection.confidence));
    }
}

// ============================================================================
// Input handling
// ============================================================================

#[test]
fn test_file_and_buffer_sources_agree() {
    let dir = TempDir::new().unwrap();
    let image = calculus_block();
    let path = save(&image, &dir, "calculus.png");

    let from_file = detect_lesions(&ImageSource::from_path(&path), Sensitivity::Medium);
    let from_buffer = detect_lesions(&ImageSource::from_mat(&image), Sensitivity::Medium);
    assert_eq!(from_file, from_buffer);
}

#[test]
fn test_corrupt_file_yields_empty_results() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.jpg");
    std::fs::write(&path, b"definitely not a jpeg").unwrap();

    let source = ImageSource::from_path(&path);
    assert!(segment_teeth(&source).is_empty());
    assert!(detect_lesions(&source, Sensitivity::Medium).is_empty());

    assert!(source.resolve().unwrap_err().is_decode_failure());
}

#[test]
fn test_empty_buffer_is_invalid() {
    let empty = Mat::default();
    match ImageSource::from_mat(&empty).resolve() {
        Err(AnalysisError::InvalidImage { .. }) => {}
        other => panic!("Expected InvalidImage, got: {:?}", other.map(|_| ())),
    }
    assert!(segment_teeth(&ImageSource::from_mat(&empty)).is_empty());
}

// ============================================================================
// Rendering
// ============================================================================

#[test]
fn test_render_empty_list_preserves_pixels() {
    let dir = TempDir::new().unwrap();
    let source = save(&calculus_block(), &dir, "mouth.png");

    let output = render_detections(&source, &[], RenderStyle::lesion());
    assert_eq!(output, dir.path().join("mouth_cv_detected.png"));

    let original = load_image(&source).unwrap();
    let rendered = load_image(&output).unwrap();
    assert_eq!(original.data_bytes().unwrap(), rendered.data_bytes().unwrap());
}

#[test]
fn test_render_empty_list_preserves_jpeg_pixels() {
    let dir = TempDir::new().unwrap();
    let source = save(&calculus_block(), &dir, "mouth.jpg");

    let output = render_detections(&source, &[], RenderStyle::segmenter());
    assert_eq!(output, dir.path().join("mouth_simple_detected.jpg"));

    let original = load_image(&source).unwrap();
    let rendered = load_image(&output).unwrap();
    assert_eq!(original.data_bytes().unwrap(), rendered.data_bytes().unwrap());
}

#[test]
fn test_render_detections_changes_pixels() {
    let dir = TempDir::new().unwrap();
    let image = single_tooth();
    let source = save(&image, &dir, "tooth.png");

    let detections = segment_teeth(&ImageSource::from_path(&source));
    let output = render_detections(&source, &detections, RenderStyle::segmenter());
    assert_eq!(output, dir.path().join("tooth_simple_detected.png"));

    let rendered = load_image(&output).unwrap();
    assert_eq!(rendered.size().unwrap(), image.size().unwrap());
    assert_ne!(rendered.data_bytes().unwrap(), image.data_bytes().unwrap());
}

#[test]
fn test_render_unreadable_path_is_noop() {
    let path = Path::new("/nonexistent/dir/photo.jpg");
    assert_eq!(render_detections(path, &[], RenderStyle::lesion()), path);
}

// ============================================================================
// Cascade and configuration
// ============================================================================

#[test]
fn test_cascade_prefers_segmenter() {
    let image = single_tooth();
    let outcome = DetectionCascade::default()
        .run(&ImageSource::from_mat(&image))
        .unwrap();

    assert_eq!(outcome.strategy, Some("tooth_segmenter"));
    assert_eq!(outcome.render_style, RenderStyle::segmenter());
}

#[test]
fn test_cascade_falls_back_to_lesion_detector() {
    // Dark stains never pass the segmenter's brightness gate
    let image = stained_row();
    let outcome = DetectionCascade::default().detect_any(&ImageSource::from_mat(&image));

    assert_eq!(outcome.strategy, Some("lesion_detector"));
    assert_eq!(outcome.render_style, RenderStyle::lesion());
    assert_eq!(outcome.detections.len(), 5);
    assert_eq!(outcome.detections[0].class_name, ToothCondition::Discoloration);
}

#[test]
fn test_config_file_drives_detectors() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");

    let mut config = DetectorConfig::default();
    config.lesion.max_detections = 2;
    config.to_json_file(&path).unwrap();

    let loaded = DetectorConfig::from_json_file(&path).unwrap();
    assert_eq!(loaded, config);

    let report = LesionDetector::from_config(&loaded.lesion)
        .unwrap()
        .analyze(&stained_row())
        .unwrap();
    assert_eq!(report.detections.len(), 2);
}
