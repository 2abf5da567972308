// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Hough rectangle finder — edge detection plus line voting to propose the
// dominant four-sided outline in a luma frame.

use image::GrayImage;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::hough::{LineDetectionOptions, PolarLine, detect_lines};
use scanwerk_core::Frame;
use scanwerk_core::geometry::{Point, Quadrilateral};
use tracing::{debug, instrument, trace};

use super::{Candidate, RectangleFinder};

/// Sample points per quad edge when scoring edge support.
const SUPPORT_SAMPLES_PER_EDGE: usize = 24;

/// Distance (pixels) within which an edge pixel supports a sample point.
const SUPPORT_RADIUS: i64 = 2;

/// Proposes the outermost rectangle formed by the dominant straight edges.
///
/// ## Pipeline
///
/// 1. Gaussian blur for noise reduction
/// 2. Canny edge detection
/// 3. Hough line detection to find dominant straight edges
/// 4. Classify lines as roughly horizontal or roughly vertical
/// 5. Select the outermost edge on each side
/// 6. Intersect neighbouring edges to get the corners
/// 7. Score the quad by how much of its outline lies on detected edges
#[derive(Debug, Clone)]
pub struct HoughRectangleFinder {
    pub blur_sigma: f32,
    pub canny_low: f32,
    pub canny_high: f32,
    /// Vote threshold as a fraction of the frame diagonal.
    pub vote_fraction: f64,
    /// Lower bound on the vote threshold for small frames.
    pub min_votes: u32,
    pub suppression_radius: u32,
}

impl Default for HoughRectangleFinder {
    fn default() -> Self {
        Self {
            blur_sigma: 2.0,
            canny_low: 50.0,
            canny_high: 150.0,
            vote_fraction: 0.25,
            min_votes: 80,
            suppression_radius: 8,
        }
    }
}

impl HoughRectangleFinder {
    fn vote_threshold(&self, width: u32, height: u32) -> u32 {
        let diagonal = f64::from(width).hypot(f64::from(height));
        ((diagonal * self.vote_fraction) as u32).max(self.min_votes)
    }
}

impl RectangleFinder for HoughRectangleFinder {
    #[instrument(skip_all, fields(width = frame.width(), height = frame.height()))]
    fn find_candidates(&self, frame: &Frame) -> Vec<Candidate> {
        let (width, height) = (frame.width(), frame.height());
        if width < 3 || height < 3 {
            return Vec::new();
        }

        let blurred = gaussian_blur_f32(&frame.luma, self.blur_sigma);
        let edges = canny(&blurred, self.canny_low, self.canny_high);

        let vote_threshold = self.vote_threshold(width, height);
        let options = LineDetectionOptions {
            vote_threshold,
            suppression_radius: self.suppression_radius,
        };
        let lines = detect_lines(&edges, options);
        trace!(line_count = lines.len(), vote_threshold, "Hough lines detected");

        if lines.len() < 4 {
            return Vec::new();
        }

        let (horizontal, vertical) = classify_lines(&lines);
        if horizontal.len() < 2 || vertical.len() < 2 {
            trace!(
                horizontal = horizontal.len(),
                vertical = vertical.len(),
                "Insufficient horizontal/vertical lines"
            );
            return Vec::new();
        }

        let centre = Point::new(f64::from(width) / 2.0, f64::from(height) / 2.0);
        let edges_found = (
            find_extreme_line(&horizontal, centre, EdgeKind::Top),
            find_extreme_line(&horizontal, centre, EdgeKind::Bottom),
            find_extreme_line(&vertical, centre, EdgeKind::Left),
            find_extreme_line(&vertical, centre, EdgeKind::Right),
        );
        let (Some(top), Some(bottom), Some(left), Some(right)) = edges_found else {
            return Vec::new();
        };

        let Some(corners) = compute_quad_corners(&top, &bottom, &left, &right) else {
            trace!("Could not compute all four corner intersections");
            return Vec::new();
        };

        let confidence = edge_support(&edges, &Quadrilateral::from_corners(corners));
        debug!(?corners, confidence, "Rectangle candidate");
        vec![Candidate::new(corners.to_vec(), confidence)]
    }
}

// -- Line helpers -------------------------------------------------------------

/// Which document edge a line corresponds to.
#[derive(Debug, Clone, Copy)]
enum EdgeKind {
    Top,
    Bottom,
    Left,
    Right,
}

/// Classify Hough lines as roughly horizontal or roughly vertical.
///
/// `angle_in_degrees` is the angle of the line's normal, so a value near 90
/// is a horizontal line and a value near 0 or 180 is a vertical one. Lines
/// more than 30 degrees off either axis are discarded.
fn classify_lines(lines: &[PolarLine]) -> (Vec<PolarLine>, Vec<PolarLine>) {
    let mut horizontal = Vec::new();
    let mut vertical = Vec::new();

    for line in lines {
        let angle = line.angle_in_degrees;
        if (60..=120).contains(&angle) {
            horizontal.push(*line);
        } else if angle <= 30 || angle >= 150 {
            vertical.push(*line);
        }
    }

    (horizontal, vertical)
}

/// Where a line crosses the horizontal (for vertical lines) or vertical (for
/// horizontal lines) axis through `centre`.
fn position_through(line: &PolarLine, centre: Point, kind: EdgeKind) -> Option<f64> {
    let theta = f64::from(line.angle_in_degrees).to_radians();
    let (sin, cos) = theta.sin_cos();
    let r = f64::from(line.r);
    match kind {
        // x·cosθ + y·sinθ = r solved for y at x = centre.x
        EdgeKind::Top | EdgeKind::Bottom if sin.abs() > 1e-6 => {
            Some((r - centre.x * cos) / sin)
        }
        EdgeKind::Left | EdgeKind::Right if cos.abs() > 1e-6 => {
            Some((r - centre.y * sin) / cos)
        }
        _ => None,
    }
}

/// Select the outermost line in a set for the requested edge, measured where
/// each line passes the frame centre.
fn find_extreme_line(lines: &[PolarLine], centre: Point, kind: EdgeKind) -> Option<PolarLine> {
    let positioned = lines
        .iter()
        .filter_map(|line| position_through(line, centre, kind).map(|pos| (pos, *line)));
    let pick = match kind {
        EdgeKind::Top | EdgeKind::Left => positioned.min_by(|a, b| a.0.total_cmp(&b.0)),
        EdgeKind::Bottom | EdgeKind::Right => positioned.max_by(|a, b| a.0.total_cmp(&b.0)),
    };
    pick.map(|(_, line)| line)
}

/// Intersect the four chosen edges.
///
/// Returns `[top_left, top_right, bottom_right, bottom_left]`, or `None` if
/// any pair is (nearly) parallel.
fn compute_quad_corners(
    top: &PolarLine,
    bottom: &PolarLine,
    left: &PolarLine,
    right: &PolarLine,
) -> Option<[Point; 4]> {
    Some([
        intersect_polar_lines(top, left)?,
        intersect_polar_lines(top, right)?,
        intersect_polar_lines(bottom, right)?,
        intersect_polar_lines(bottom, left)?,
    ])
}

/// Compute the intersection of two lines given in polar (Hough) form.
///
/// A `PolarLine` with parameters `(r, theta)` represents the line
///   `x * cos(theta) + y * sin(theta) = r`
fn intersect_polar_lines(a: &PolarLine, b: &PolarLine) -> Option<Point> {
    let (sin_a, cos_a) = f64::from(a.angle_in_degrees).to_radians().sin_cos();
    let (sin_b, cos_b) = f64::from(b.angle_in_degrees).to_radians().sin_cos();

    let denom = cos_a * sin_b - sin_a * cos_b;
    if denom.abs() < 1e-6 {
        return None;
    }

    let (r_a, r_b) = (f64::from(a.r), f64::from(b.r));
    Some(Point::new(
        (r_a * sin_b - r_b * sin_a) / denom,
        (r_b * cos_a - r_a * cos_b) / denom,
    ))
}

/// Fraction of points sampled along the quad outline that lie near an edge
/// pixel.
fn edge_support(edges: &GrayImage, quad: &Quadrilateral) -> f32 {
    let corners = quad.corners();
    let mut hits = 0usize;
    let mut total = 0usize;

    for i in 0..4 {
        let (from, to) = (corners[i], corners[(i + 1) % 4]);
        for s in 0..SUPPORT_SAMPLES_PER_EDGE {
            let t = (s as f64 + 0.5) / SUPPORT_SAMPLES_PER_EDGE as f64;
            total += 1;
            if near_edge(edges, from.lerp(to, t)) {
                hits += 1;
            }
        }
    }

    hits as f32 / total as f32
}

fn near_edge(edges: &GrayImage, p: Point) -> bool {
    if !(p.x.is_finite() && p.y.is_finite()) {
        return false;
    }
    let (w, h) = (i64::from(edges.width()), i64::from(edges.height()));
    let (cx, cy) = (p.x.round() as i64, p.y.round() as i64);
    for y in (cy - SUPPORT_RADIUS)..=(cy + SUPPORT_RADIUS) {
        for x in (cx - SUPPORT_RADIUS)..=(cx + SUPPORT_RADIUS) {
            if x < 0 || y < 0 || x >= w || y >= h {
                continue;
            }
            if edges.get_pixel(x as u32, y as u32).0[0] > 0 {
                return true;
            }
        }
    }
    false
}

// -- Tests --------------------------------------------------------------------
