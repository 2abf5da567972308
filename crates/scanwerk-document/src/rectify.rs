// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Perspective correction: warp the region inside a quadrilateral onto an
// axis-aligned rectangle.

use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use scanwerk_core::error::{Result, ScanwerkError};
use scanwerk_core::geometry::{Point, Quadrilateral};
use tracing::{debug, info, instrument};

use crate::transform::to_engine_space;

/// Anything that can de-skew a still given a pixel-space quad.
///
/// Implementations are called from the blocking pool, never from the frame
/// thread.
pub trait Rectifier: Send + Sync {
    /// `image` must already be orientation-normalised and `quad` expressed in
    /// its pixel space.
    fn rectify(&self, image: &DynamicImage, quad: &Quadrilateral) -> Result<DynamicImage>;
}

/// Projective warp with bilinear resampling.
#[derive(Debug, Clone)]
pub struct PerspectiveCorrector {
    /// Fill for output pixels that map outside the source.
    pub background: Rgba<u8>,
}

impl Default for PerspectiveCorrector {
    fn default() -> Self {
        Self {
            background: Rgba([255u8, 255, 255, 255]),
        }
    }
}

impl PerspectiveCorrector {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Output size for a Cartesian-space quad: the longer of each pair of
/// opposing edges.
pub fn output_size(engine_quad: &Quadrilateral) -> (u32, u32) {
    let width = engine_quad.top_edge().max(engine_quad.bottom_edge());
    let height = engine_quad.left_edge().max(engine_quad.right_edge());
    (to_pixels(width), to_pixels(height))
}

fn to_pixels(length: f64) -> u32 {
    if length.is_finite() && length >= 0.5 {
        length.round().min(f64::from(u32::MAX)) as u32
    } else {
        0
    }
}

/// Source control points in pixel space, `[top_left, top_right, bottom_right,
/// bottom_left]` of the physical page.
///
/// After the Y flip the canonical Cartesian "bottom" pair is the physical top
/// of the page, so bottom-left feeds the engine's top-left and so on.
fn engine_corners(engine_quad: &Quadrilateral, image_height: f64) -> [Point; 4] {
    let unflip = |p: Point| Point::new(p.x, image_height - p.y);
    [
        unflip(engine_quad.bottom_left),
        unflip(engine_quad.bottom_right),
        unflip(engine_quad.top_right),
        unflip(engine_quad.top_left),
    ]
}

impl Rectifier for PerspectiveCorrector {
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    fn rectify(&self, image: &DynamicImage, quad: &Quadrilateral) -> Result<DynamicImage> {
        if image.width() == 0 || image.height() == 0 {
            return Err(ScanwerkError::Rectification("source image is empty".into()));
        }
        quad.validate(0.0)
            .map_err(|e| ScanwerkError::Rectification(e.to_string()))?;

        let image_height = f64::from(image.height());
        let engine_quad = to_engine_space(quad, image_height);
        let (out_w, out_h) = output_size(&engine_quad);
        if out_w == 0 || out_h == 0 {
            return Err(ScanwerkError::Rectification(format!(
                "quad collapses to a {out_w}x{out_h} output"
            )));
        }
        // No edge of a quad inside the source can be longer than its diagonal.
        let limit = to_pixels(f64::from(image.width()).hypot(image_height).ceil());
        if out_w > limit || out_h > limit {
            return Err(ScanwerkError::Rectification(format!(
                "quad yields a {out_w}x{out_h} output from a {}x{} source",
                image.width(),
                image.height()
            )));
        }

        let src = engine_corners(&engine_quad, image_height).map(|p| (p.x as f32, p.y as f32));
        let dest: [(f32, f32); 4] = [
            (0.0, 0.0),
            (out_w as f32, 0.0),
            (out_w as f32, out_h as f32),
            (0.0, out_h as f32),
        ];
        debug!(?src, out_w, out_h, "projection control points");

        let projection = Projection::from_control_points(src, dest).ok_or_else(|| {
            ScanwerkError::Rectification("projective transform is singular".into())
        })?;

        let rgba = image.to_rgba8();
        let mut output = RgbaImage::new(out_w, out_h);
        warp_into(&rgba, &projection, Interpolation::Bilinear, self.background, &mut output);

        info!(out_w, out_h, "perspective correction applied");
        Ok(DynamicImage::ImageRgba8(output))
    }
}
