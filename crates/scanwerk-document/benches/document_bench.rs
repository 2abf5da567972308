// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the scanwerk-document crate: quad detection on a
// preview-sized frame and perspective correction of a still.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{DynamicImage, GrayImage, Luma, Rgba, RgbaImage};

use scanwerk_core::geometry::{Point, Quadrilateral};
use scanwerk_core::{DetectorConfig, Frame, FrameOrientation};
use scanwerk_document::{PerspectiveCorrector, QuadDetector, Rectifier};

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Detection runs once per live frame, so it has to stay well under a frame
/// interval at preview resolution.
fn bench_detection(c: &mut Criterion) {
    let (width, height) = (480u32, 270u32);
    let mut img = GrayImage::from_pixel(width, height, Luma([30u8]));
    for y in 30..240 {
        for x in 90..390 {
            img.put_pixel(x, y, Luma([240u8]));
        }
    }
    let frame = Frame::new(img, FrameOrientation::LandscapeSensor);
    let detector = QuadDetector::with_hough(DetectorConfig::default());

    c.bench_function("detect (480x270)", |b| {
        b.iter(|| black_box(detector.detect(black_box(&frame))));
    });
}

/// Rectify a skewed quad out of a 1200x1600 still.
fn bench_rectify(c: &mut Criterion) {
    let still = DynamicImage::ImageRgba8(RgbaImage::from_pixel(1200, 1600, Rgba([200, 200, 200, 255])));
    let quad = Quadrilateral::new(
        Point::new(150.0, 120.0),
        Point::new(1050.0, 180.0),
        Point::new(1100.0, 1480.0),
        Point::new(90.0, 1420.0),
    );
    let corrector = PerspectiveCorrector::new();

    c.bench_function("rectify (1200x1600)", |b| {
        b.iter(|| black_box(corrector.rectify(black_box(&still), black_box(&quad))));
    });
}

criterion_group!(benches, bench_detection, bench_rectify);
criterion_main!(benches);
