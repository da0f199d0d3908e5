use criterion::{black_box, criterion_group, criterion_main, Criterion};
use opencv::{
    core::{Mat, Rect, Scalar, CV_8UC3},
    imgproc,
    prelude::*,
};
use tooth_scan::{DetectionCascade, DetectionRenderer, ImageSource, LesionDetector, ToothSegmenter};

/// 640x480 mouth-like frame: a row of whitish teeth, two of them stained
fn synthetic_mouth() -> Mat {
    let mut image =
        Mat::new_rows_cols_with_default(480, 640, CV_8UC3, Scalar::new(60.0, 60.0, 150.0, 0.0))
            .unwrap();
    for i in 0..8 {
        let rect = Rect::new(150 + i * 44, 200, 38, 70);
        imgproc::rectangle(
            &mut image,
            rect,
            Scalar::all(230.0),
            imgproc::FILLED,
            imgproc::LINE_8,
            0,
        )
        .unwrap();
    }
    for x in [194, 326] {
        let stain = Rect::new(x + 8, 220, 20, 24);
        imgproc::rectangle(
            &mut image,
            stain,
            Scalar::new(40.0, 150.0, 190.0, 0.0),
            imgproc::FILLED,
            imgproc::LINE_8,
            0,
        )
        .unwrap();
    }
    image
}

fn benchmark_detectors(c: &mut Criterion) {
    let image = synthetic_mouth();
    let segmenter = ToothSegmenter::new();
    let lesion = LesionDetector::new();
    let cascade = DetectionCascade::default();

    c.bench_function("segment_teeth_640x480", |b| {
        b.iter(|| segmenter.segment(black_box(&image)).unwrap())
    });

    c.bench_function("detect_lesions_640x480", |b| {
        b.iter(|| lesion.analyze(black_box(&image)).unwrap())
    });

    c.bench_function("cascade_640x480", |b| {
        b.iter(|| cascade.detect_any(&ImageSource::from_mat(black_box(&image))))
    });
}

fn benchmark_rendering(c: &mut Criterion) {
    let image = synthetic_mouth();
    let detections = LesionDetector::new().analyze(&image).unwrap().detections;
    let renderer = DetectionRenderer::default();

    c.bench_function("draw_detections_640x480", |b| {
        b.iter(|| renderer.draw(black_box(&image), black_box(&detections)).unwrap())
    });
}

criterion_group!(benches, benchmark_detectors, benchmark_rendering);
criterion_main!(benches);
