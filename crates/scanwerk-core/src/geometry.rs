// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Geometry primitives — points, sizes, rects, affine transforms, and the
// document quadrilateral.
//
// Points never record which coordinate space they live in (sensor, display,
// image pixels, or Cartesian); that is decided by the pipeline stage holding
// them.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScanwerkError};

/// Two corners closer than this are considered the same point.
const MIN_CORNER_DISTANCE: f64 = 1e-6;

/// Determinants below this make an affine transform non-invertible.
const SINGULAR_EPSILON: f64 = 1e-12;

// ---------------------------------------------------------------------------
// Point / Size / Rect
// ---------------------------------------------------------------------------

/// A 2D point.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Apply an affine transform to this point.
    pub fn applying(self, transform: &AffineTransform) -> Self {
        transform.apply(self)
    }

    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Linear interpolation towards `other` (`t = 0` stays, `t = 1` arrives).
    pub fn lerp(self, other: Point, t: f64) -> Self {
        Self {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }

    fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// A width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Size of a pixel buffer.
    pub fn from_pixels(width: u32, height: u32) -> Self {
        Self::new(f64::from(width), f64::from(height))
    }

    /// True when either side is zero, negative, or not finite.
    pub fn is_empty(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite())
            || self.width <= 0.0
            || self.height <= 0.0
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn diagonal(&self) -> f64 {
        self.width.hypot(self.height)
    }

    /// Width and height swapped (a quarter-turned frame).
    pub fn transposed(&self) -> Self {
        Self::new(self.height, self.width)
    }

    pub fn is_landscape(&self) -> bool {
        self.width > self.height
    }

    /// Scale both sides by the given transform's linear part.
    pub fn applying(&self, transform: &AffineTransform) -> Self {
        Self::new(
            transform.a * self.width + transform.c * self.height,
            transform.b * self.width + transform.d * self.height,
        )
    }
}

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub const fn new(origin: Point, size: Size) -> Self {
        Self { origin, size }
    }

    /// A rect at the origin with the given size.
    pub fn from_size(size: Size) -> Self {
        Self::new(Point::ZERO, size)
    }

    pub fn mid(&self) -> Point {
        Point::new(
            self.origin.x + self.size.width / 2.0,
            self.origin.y + self.size.height / 2.0,
        )
    }

    /// The axis-aligned bounding box of this rect after `transform`.
    pub fn applying(&self, transform: &AffineTransform) -> Self {
        let Point { x, y } = self.origin;
        let (w, h) = (self.size.width, self.size.height);
        let corners = [
            transform.apply(Point::new(x, y)),
            transform.apply(Point::new(x + w, y)),
            transform.apply(Point::new(x + w, y + h)),
            transform.apply(Point::new(x, y + h)),
        ];
        let min_x = corners.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
        let max_x = corners.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
        let min_y = corners.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
        let max_y = corners.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
        Self::new(
            Point::new(min_x, min_y),
            Size::new(max_x - min_x, max_y - min_y),
        )
    }
}

// ---------------------------------------------------------------------------
// AffineTransform
// ---------------------------------------------------------------------------

/// A 2D affine map: `x' = a·x + c·y + tx`, `y' = b·x + d·y + ty`.
///
/// Transforms are plain values. Composition never mutates an existing
/// transform; [`concat`](Self::concat) returns a new one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffineTransform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub tx: f64,
    pub ty: f64,
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl AffineTransform {
    pub const IDENTITY: AffineTransform = AffineTransform {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    pub fn scale(sx: f64, sy: f64) -> Self {
        Self {
            a: sx,
            d: sy,
            ..Self::IDENTITY
        }
    }

    /// Rotation by `angle` radians (positive turns +x towards +y).
    pub fn rotation(angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            tx: 0.0,
            ty: 0.0,
        }
    }

    pub fn translation(tx: f64, ty: f64) -> Self {
        Self {
            tx,
            ty,
            ..Self::IDENTITY
        }
    }

    /// Uniform scale that makes `from` cover `into` completely (aspect fill).
    ///
    /// Returns the identity when `from` is empty.
    pub fn scale_aspect_fill(from: Size, into: Size) -> Self {
        if from.is_empty() {
            return Self::IDENTITY;
        }
        let factor = (into.width / from.width).max(into.height / from.height);
        Self::scale(factor, factor)
    }

    /// Translation moving the centre of `from` onto the centre of `to`.
    pub fn translate_centers(from: &Rect, to: &Rect) -> Self {
        let (a, b) = (from.mid(), to.mid());
        Self::translation(b.x - a.x, b.y - a.y)
    }

    /// The transform that applies `self` first and `then` second.
    pub fn concat(&self, then: &AffineTransform) -> Self {
        let s = self;
        let o = then;
        Self {
            a: o.a * s.a + o.c * s.b,
            b: o.b * s.a + o.d * s.b,
            c: o.a * s.c + o.c * s.d,
            d: o.b * s.c + o.d * s.d,
            tx: o.a * s.tx + o.c * s.ty + o.tx,
            ty: o.b * s.tx + o.d * s.ty + o.ty,
        }
    }

    /// Compose an ordered list; the first element is applied first.
    pub fn chain(transforms: &[AffineTransform]) -> Self {
        transforms
            .iter()
            .fold(Self::IDENTITY, |acc, next| acc.concat(next))
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    /// The inverse map, or `None` if the transform is singular.
    pub fn inverted(&self) -> Option<Self> {
        let det = self.determinant();
        if !det.is_finite() || det.abs() < SINGULAR_EPSILON {
            return None;
        }
        Some(Self {
            a: self.d / det,
            b: -self.b / det,
            c: -self.c / det,
            d: self.a / det,
            tx: (self.c * self.ty - self.d * self.tx) / det,
            ty: (self.b * self.tx - self.a * self.ty) / det,
        })
    }

    pub fn apply(&self, p: Point) -> Point {
        Point::new(
            self.a * p.x + self.c * p.y + self.tx,
            self.b * p.x + self.d * p.y + self.ty,
        )
    }
}

// ---------------------------------------------------------------------------
// Quadrilateral
// ---------------------------------------------------------------------------

/// Four-corner document boundary.
///
/// Corner roles are canonical only after [`reorganize`](Self::reorganize):
/// transforms such as a quarter-turn rotation or a Y flip move the physical
/// corners without renaming them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quadrilateral {
    pub top_left: Point,
    pub top_right: Point,
    pub bottom_right: Point,
    pub bottom_left: Point,
}

impl Quadrilateral {
    pub const fn new(
        top_left: Point,
        top_right: Point,
        bottom_right: Point,
        bottom_left: Point,
    ) -> Self {
        Self {
            top_left,
            top_right,
            bottom_right,
            bottom_left,
        }
    }

    /// Build from corners in `[top_left, top_right, bottom_right, bottom_left]`
    /// order.
    pub fn from_corners(corners: [Point; 4]) -> Self {
        let [top_left, top_right, bottom_right, bottom_left] = corners;
        Self::new(top_left, top_right, bottom_right, bottom_left)
    }

    /// Build from four corners in any order (y-down space).
    ///
    /// Corners are sorted clockwise around their centroid and the cycle is
    /// rotated so `top_left` is the corner with the smallest `x + y`.
    pub fn from_unordered(mut corners: [Point; 4]) -> Self {
        let cx = corners.iter().map(|p| p.x).sum::<f64>() / 4.0;
        let cy = corners.iter().map(|p| p.y).sum::<f64>() / 4.0;
        corners.sort_by(|p, q| {
            let pa = (p.y - cy).atan2(p.x - cx);
            let qa = (q.y - cy).atan2(q.x - cx);
            pa.total_cmp(&qa)
        });
        let start = (0..4)
            .min_by(|&i, &j| {
                let si = corners[i].x + corners[i].y;
                let sj = corners[j].x + corners[j].y;
                si.total_cmp(&sj)
            })
            .unwrap_or(0);
        corners.rotate_left(start);
        Self::from_corners(corners)
    }

    /// Axis-aligned rectangle as a quad.
    pub fn from_rect(rect: &Rect) -> Self {
        let Point { x, y } = rect.origin;
        let (w, h) = (rect.size.width, rect.size.height);
        Self::new(
            Point::new(x, y),
            Point::new(x + w, y),
            Point::new(x + w, y + h),
            Point::new(x, y + h),
        )
    }

    /// The centred quad covering 90% of `size`, used whenever no usable
    /// detection exists.
    pub fn default_for(size: Size) -> Self {
        let (w, h) = (size.width, size.height);
        Self::new(
            Point::new(w * 0.05, h * 0.05),
            Point::new(w * 0.95, h * 0.05),
            Point::new(w * 0.95, h * 0.95),
            Point::new(w * 0.05, h * 0.95),
        )
    }

    /// Corners in `[top_left, top_right, bottom_right, bottom_left]` order.
    pub fn corners(&self) -> [Point; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ]
    }

    pub fn top_edge(&self) -> f64 {
        self.top_left.distance(self.top_right)
    }

    pub fn bottom_edge(&self) -> f64 {
        self.bottom_left.distance(self.bottom_right)
    }

    pub fn left_edge(&self) -> f64 {
        self.top_left.distance(self.bottom_left)
    }

    pub fn right_edge(&self) -> f64 {
        self.top_right.distance(self.bottom_right)
    }

    pub fn perimeter(&self) -> f64 {
        self.top_edge() + self.right_edge() + self.bottom_edge() + self.left_edge()
    }

    /// Polygon area via the shoelace formula.
    pub fn area(&self) -> f64 {
        let c = self.corners();
        let mut twice = 0.0;
        for i in 0..4 {
            let j = (i + 1) % 4;
            twice += c[i].x * c[j].y - c[j].x * c[i].y;
        }
        twice.abs() / 2.0
    }

    pub fn centroid(&self) -> Point {
        let c = self.corners();
        Point::new(
            c.iter().map(|p| p.x).sum::<f64>() / 4.0,
            c.iter().map(|p| p.y).sum::<f64>() / 4.0,
        )
    }

    /// Ratio of the longer to the shorter mean opposing edge length.
    ///
    /// Infinite when one pair of edges has collapsed.
    pub fn aspect_ratio(&self) -> f64 {
        let horizontal = (self.top_edge() + self.bottom_edge()) / 2.0;
        let vertical = (self.left_edge() + self.right_edge()) / 2.0;
        let (long, short) = if horizontal >= vertical {
            (horizontal, vertical)
        } else {
            (vertical, horizontal)
        };
        if short <= 0.0 { f64::INFINITY } else { long / short }
    }

    /// Whether every turn along the corner cycle bends the same way.
    pub fn is_convex(&self) -> bool {
        let c = self.corners();
        let mut sign = 0.0f64;
        for i in 0..4 {
            let turn = cross(c[i], c[(i + 1) % 4], c[(i + 2) % 4]);
            if turn == 0.0 {
                return false;
            }
            if sign == 0.0 {
                sign = turn.signum();
            } else if turn.signum() != sign {
                return false;
            }
        }
        true
    }

    /// Reject quads with non-finite, coincident, or collinear corners.
    ///
    /// `tolerance` bounds `|sin θ|` at each corner: three consecutive corners
    /// bending by less than that are treated as collinear.
    pub fn validate(&self, tolerance: f64) -> Result<()> {
        let c = self.corners();
        if c.iter().any(|p| !p.is_finite()) {
            return Err(ScanwerkError::DegenerateQuad(
                "corner coordinates are not finite".into(),
            ));
        }
        for i in 0..4 {
            for j in (i + 1)..4 {
                if c[i].distance(c[j]) < MIN_CORNER_DISTANCE {
                    return Err(ScanwerkError::DegenerateQuad(format!(
                        "corners {i} and {j} coincide"
                    )));
                }
            }
        }
        for i in 0..4 {
            let (prev, at, next) = (c[(i + 3) % 4], c[i], c[(i + 1) % 4]);
            let lengths = prev.distance(at) * at.distance(next);
            if cross(prev, at, next).abs() <= tolerance * lengths {
                return Err(ScanwerkError::DegenerateQuad(format!(
                    "corner {i} is collinear with its neighbours"
                )));
            }
        }
        Ok(())
    }

    /// Apply one affine transform to all four corners (roles unchanged).
    pub fn applying(&self, transform: &AffineTransform) -> Self {
        Self::from_corners(self.corners().map(|p| transform.apply(p)))
    }

    /// Apply an ordered list of transforms; the first is applied first.
    pub fn apply_transforms(&self, transforms: &[AffineTransform]) -> Self {
        transforms.iter().fold(*self, |quad, t| quad.applying(t))
    }

    /// Scale every corner independently along each axis.
    pub fn scaled(&self, sx: f64, sy: f64) -> Self {
        self.applying(&AffineTransform::scale(sx, sy))
    }

    /// Flip into Cartesian space (Y up) for an image of the given height.
    ///
    /// Corner roles are kept, so after the flip the field named `top_left`
    /// holds the physically bottom-left corner until the quad is
    /// [`reorganize`](Self::reorganize)d.
    pub fn to_cartesian(&self, height: f64) -> Self {
        Self::from_corners(self.corners().map(|p| Point::new(p.x, height - p.y)))
    }

    /// Reassign corner roles: the two corners with the smallest `y` become the
    /// top pair, each pair ordered by `x`. Idempotent.
    pub fn reorganize(&self) -> Self {
        let mut by_y = self.corners();
        by_y.sort_by(|p, q| p.y.total_cmp(&q.y).then(p.x.total_cmp(&q.x)));

        let (mut top, mut bottom) = ([by_y[0], by_y[1]], [by_y[2], by_y[3]]);
        top.sort_by(|p, q| p.x.total_cmp(&q.x));
        bottom.sort_by(|p, q| p.x.total_cmp(&q.x));

        Self::new(top[0], top[1], bottom[1], bottom[0])
    }

    /// Corner-wise interpolation towards `other`.
    pub fn lerp(&self, other: &Quadrilateral, t: f64) -> Self {
        let a = self.corners();
        let b = other.corners();
        Self::from_corners([
            a[0].lerp(b[0], t),
            a[1].lerp(b[1], t),
            a[2].lerp(b[2], t),
            a[3].lerp(b[3], t),
        ])
    }

    /// Largest corner-to-corner distance between two quads with matching roles.
    pub fn max_corner_distance(&self, other: &Quadrilateral) -> f64 {
        self.corners()
            .iter()
            .zip(other.corners().iter())
            .map(|(p, q)| p.distance(*q))
            .fold(0.0, f64::max)
    }
}

/// Z component of `(b - a) × (c - b)`.
fn cross(a: Point, b: Point, c: Point) -> f64 {
    (b.x - a.x) * (c.y - b.y) - (b.y - a.y) * (c.x - b.x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    const EPS: f64 = 1e-9;

    fn assert_point_eq(p: Point, q: Point) {
        assert!(p.distance(q) < 1e-6, "expected {q:?}, got {p:?}");
    }

    fn rect_quad(x: f64, y: f64, w: f64, h: f64) -> Quadrilateral {
        Quadrilateral::from_rect(&Rect::new(Point::new(x, y), Size::new(w, h)))
    }

    #[test]
    fn concat_applies_left_then_right() {
        let scale = AffineTransform::scale(2.0, 3.0);
        let shift = AffineTransform::translation(10.0, -5.0);
        let p = Point::new(1.0, 1.0);

        assert_point_eq(scale.concat(&shift).apply(p), Point::new(12.0, -2.0));
        assert_point_eq(shift.concat(&scale).apply(p), Point::new(22.0, -12.0));
    }

    #[test]
    fn chain_matches_sequential_application() {
        let ts = [
            AffineTransform::scale(0.5, 0.5),
            AffineTransform::rotation(FRAC_PI_2),
            AffineTransform::translation(7.0, 3.0),
        ];
        let p = Point::new(4.0, 2.0);
        let sequential = ts.iter().fold(p, |acc, t| t.apply(acc));
        assert_point_eq(AffineTransform::chain(&ts).apply(p), sequential);
    }

    #[test]
    fn rotation_quarter_turn() {
        let p = AffineTransform::rotation(FRAC_PI_2).apply(Point::new(1.0, 0.0));
        assert_point_eq(p, Point::new(0.0, 1.0));
    }

    #[test]
    fn inverted_round_trips() {
        let t = AffineTransform::chain(&[
            AffineTransform::scale(1.7, 1.7),
            AffineTransform::rotation(0.3),
            AffineTransform::translation(-40.0, 12.5),
        ]);
        let inv = t.inverted().expect("invertible");
        let p = Point::new(123.0, -45.0);
        assert_point_eq(inv.apply(t.apply(p)), p);
    }

    #[test]
    fn singular_transform_has_no_inverse() {
        assert!(AffineTransform::scale(0.0, 1.0).inverted().is_none());
    }

    #[test]
    fn aspect_fill_covers_target() {
        let t = AffineTransform::scale_aspect_fill(Size::new(100.0, 200.0), Size::new(300.0, 300.0));
        let scaled = Size::new(100.0, 200.0).applying(&t);
        assert!((scaled.width - 300.0).abs() < EPS);
        assert!((scaled.height - 600.0).abs() < EPS);
    }

    #[test]
    fn rect_bounding_box_after_rotation() {
        let r = Rect::from_size(Size::new(40.0, 10.0)).applying(&AffineTransform::rotation(FRAC_PI_2));
        assert!((r.size.width - 10.0).abs() < 1e-9);
        assert!((r.size.height - 40.0).abs() < 1e-9);
        assert!((r.origin.x + 10.0).abs() < 1e-9);
    }

    #[test]
    fn area_and_perimeter_of_rectangle() {
        let q = rect_quad(0.0, 0.0, 10.0, 5.0);
        assert!((q.area() - 50.0).abs() < EPS);
        assert!((q.perimeter() - 30.0).abs() < EPS);
        assert_point_eq(q.centroid(), Point::new(5.0, 2.5));
        assert!((q.aspect_ratio() - 2.0).abs() < EPS);
    }

    #[test]
    fn default_quad_sits_at_five_and_ninety_five_percent() {
        let q = Quadrilateral::default_for(Size::new(200.0, 100.0));
        assert_point_eq(q.top_left, Point::new(10.0, 5.0));
        assert_point_eq(q.bottom_right, Point::new(190.0, 95.0));
        assert!(q.validate(0.02).is_ok());
    }

    #[test]
    fn reorganize_restores_roles_after_rotation() {
        let q = rect_quad(10.0, 20.0, 100.0, 50.0);
        let rotated = q.applying(&AffineTransform::rotation(FRAC_PI_2));
        // Rotation moves the physical corners but keeps the old names.
        assert!(rotated.top_left.x > rotated.bottom_left.x);

        let fixed = rotated.reorganize();
        assert!(fixed.top_left.x < fixed.top_right.x);
        assert!(fixed.top_left.y < fixed.bottom_left.y);
        assert!(fixed.bottom_left.x < fixed.bottom_right.x);
    }

    #[test]
    fn reorganize_is_idempotent() {
        let scrambled = Quadrilateral::new(
            Point::new(90.0, 95.0),
            Point::new(8.0, 12.0),
            Point::new(3.0, 88.0),
            Point::new(97.0, 6.0),
        );
        let once = scrambled.reorganize();
        assert_eq!(once.reorganize(), once);
        assert_point_eq(once.top_left, Point::new(8.0, 12.0));
        assert_point_eq(once.top_right, Point::new(97.0, 6.0));
        assert_point_eq(once.bottom_right, Point::new(90.0, 95.0));
        assert_point_eq(once.bottom_left, Point::new(3.0, 88.0));
    }

    #[test]
    fn from_unordered_yields_clockwise_cycle() {
        let q = Quadrilateral::from_unordered([
            Point::new(95.0, 90.0),
            Point::new(10.0, 8.0),
            Point::new(5.0, 85.0),
            Point::new(90.0, 12.0),
        ]);
        assert_point_eq(q.top_left, Point::new(10.0, 8.0));
        assert_point_eq(q.top_right, Point::new(90.0, 12.0));
        assert_point_eq(q.bottom_right, Point::new(95.0, 90.0));
        assert_point_eq(q.bottom_left, Point::new(5.0, 85.0));
        assert!(q.is_convex());
    }

    #[test]
    fn to_cartesian_flips_y_and_keeps_roles() {
        let q = rect_quad(0.0, 0.0, 10.0, 4.0).to_cartesian(100.0);
        assert_point_eq(q.top_left, Point::new(0.0, 100.0));
        assert_point_eq(q.bottom_left, Point::new(0.0, 96.0));
        // After reorganize the smallest-y pair holds the "top" roles.
        let r = q.reorganize();
        assert_point_eq(r.top_left, Point::new(0.0, 96.0));
    }

    #[test]
    fn validate_rejects_duplicate_corners() {
        let p = Point::new(1.0, 1.0);
        let q = Quadrilateral::new(p, p, Point::new(5.0, 5.0), Point::new(0.0, 5.0));
        assert!(matches!(q.validate(0.02), Err(ScanwerkError::DegenerateQuad(_))));
    }

    #[test]
    fn validate_rejects_collinear_corners() {
        let q = Quadrilateral::new(
            Point::new(0.0, 0.0),
            Point::new(5.0, 0.0),
            Point::new(10.0, 0.01),
            Point::new(0.0, 10.0),
        );
        assert!(q.validate(0.02).is_err());
    }

    #[test]
    fn validate_rejects_nan() {
        let mut q = rect_quad(0.0, 0.0, 10.0, 10.0);
        q.top_left.x = f64::NAN;
        assert!(q.validate(0.02).is_err());
    }

    #[test]
    fn convexity() {
        assert!(rect_quad(0.0, 0.0, 4.0, 3.0).is_convex());
        let dart = Quadrilateral::new(
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(3.0, 3.0),
            Point::new(0.0, 10.0),
        );
        assert!(!dart.is_convex());
        let bowtie = Quadrilateral::new(
            Point::new(0.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(10.0, 0.0),
            Point::new(0.0, 10.0),
        );
        assert!(!bowtie.is_convex());
    }

    #[test]
    fn lerp_halfway() {
        let a = rect_quad(0.0, 0.0, 10.0, 10.0);
        let b = rect_quad(10.0, 10.0, 10.0, 10.0);
        let mid = a.lerp(&b, 0.5);
        assert_point_eq(mid.top_left, Point::new(5.0, 5.0));
        assert!((a.max_corner_distance(&b) - 200f64.sqrt()).abs() < EPS);
    }
}
