// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Quadrilateral detection: a low-level rectangle finder proposes shapes and
// the detector decides which of them, if any, looks like a document.

pub mod hough;

use scanwerk_core::geometry::{Point, Quadrilateral, Size};
use scanwerk_core::{DetectionResult, DetectorConfig, Frame};
use thiserror::Error;
use tracing::{debug, instrument, trace, warn};

pub use hough::HoughRectangleFinder;

/// Corners closer than this (in pixels) are merged before counting.
const CORNER_MERGE_DISTANCE: f64 = 1.0;

/// A raw shape proposed by a [`RectangleFinder`], in frame pixel space.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Corner points in any order. Anything other than four usable corners
    /// is rejected.
    pub corners: Vec<Point>,
    /// Finder-specific score in `[0, 1]`.
    pub confidence: f32,
}

impl Candidate {
    pub fn new(corners: Vec<Point>, confidence: f32) -> Self {
        Self {
            corners,
            confidence,
        }
    }
}

/// Low-level shape finder consulted once per frame.
///
/// Implementations may be wrong, noisy, or return nothing; the detector does
/// all validation. They must not panic on odd input.
pub trait RectangleFinder: Send + Sync {
    fn find_candidates(&self, frame: &Frame) -> Vec<Candidate>;
}

/// Why a candidate was discarded.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Rejection {
    #[error("only {0} usable corners")]
    TooFewCorners(usize),

    #[error("{0} corners do not form a quadrilateral")]
    TooManyCorners(usize),

    #[error("confidence {confidence} below {min}")]
    LowConfidence { confidence: f32, min: f32 },

    #[error("area {area:.1} below minimum {min:.1}")]
    TooSmall { area: f64, min: f64 },

    #[error("aspect ratio {0:.2} out of bounds")]
    BadAspect(f64),

    #[error("not convex")]
    NotConvex,

    #[error("degenerate: {0}")]
    Degenerate(String),
}

/// Finds the most likely document quadrilateral in a frame.
///
/// Detection is a pure function of the frame: no state is kept between calls.
pub struct QuadDetector {
    finder: Box<dyn RectangleFinder>,
    config: DetectorConfig,
}

impl QuadDetector {
    pub fn new(finder: Box<dyn RectangleFinder>, config: DetectorConfig) -> Self {
        Self { finder, config }
    }

    /// A detector backed by the Hough line finder.
    pub fn with_hough(config: DetectorConfig) -> Self {
        Self::new(Box::new(HoughRectangleFinder::default()), config)
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Analyse one frame. Never panics; anything unusable yields `quad: None`.
    #[instrument(skip_all, fields(width = frame.width(), height = frame.height()))]
    pub fn detect(&self, frame: &Frame) -> DetectionResult {
        let frame_size = frame.size();
        if frame_size.is_empty() {
            warn!("empty frame; skipping detection");
            return DetectionResult::none(frame_size);
        }

        let candidates = self.finder.find_candidates(frame);
        trace!(count = candidates.len(), "rectangle candidates");

        let best = candidates
            .iter()
            .filter_map(|candidate| match self.validate(candidate, frame_size) {
                Ok(quad) => Some(quad),
                Err(reason) => {
                    trace!(%reason, "candidate rejected");
                    None
                }
            })
            .max_by(|a, b| a.area().total_cmp(&b.area()));

        match best {
            Some(quad) => {
                debug!(area = quad.area(), "document quad detected");
                DetectionResult::found(quad, frame_size)
            }
            None => DetectionResult::none(frame_size),
        }
    }

    /// Turn a candidate into a canonical quad or explain why it cannot be one.
    pub fn validate(&self, candidate: &Candidate, frame_size: Size) -> Result<Quadrilateral, Rejection> {
        let corners = usable_corners(&candidate.corners);
        let corners: [Point; 4] = match corners.len() {
            4 => [corners[0], corners[1], corners[2], corners[3]],
            n if n < 4 => return Err(Rejection::TooFewCorners(n)),
            n => return Err(Rejection::TooManyCorners(n)),
        };

        if candidate.confidence < self.config.min_confidence {
            return Err(Rejection::LowConfidence {
                confidence: candidate.confidence,
                min: self.config.min_confidence,
            });
        }

        let quad = Quadrilateral::from_unordered(corners);
        quad.validate(self.config.collinearity_tolerance)
            .map_err(|e| Rejection::Degenerate(e.to_string()))?;
        if !quad.is_convex() {
            return Err(Rejection::NotConvex);
        }

        let min_area = frame_size.area() * self.config.min_area_fraction;
        let area = quad.area();
        if area < min_area {
            return Err(Rejection::TooSmall { area, min: min_area });
        }

        let aspect = quad.aspect_ratio();
        if aspect > self.config.max_aspect_ratio {
            return Err(Rejection::BadAspect(aspect));
        }

        Ok(quad)
    }
}

/// Drop non-finite points and merge near-duplicates.
fn usable_corners(points: &[Point]) -> Vec<Point> {
    let mut kept: Vec<Point> = Vec::with_capacity(points.len());
    for &p in points {
        if !(p.x.is_finite() && p.y.is_finite()) {
            continue;
        }
        if kept.iter().all(|k| k.distance(p) >= CORNER_MERGE_DISTANCE) {
            kept.push(p);
        }
    }
    kept
}
