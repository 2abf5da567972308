// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — orientation normalisation, quarter-turn rotation, and
// redaction for captured pages, plus the page-level edits built on them
// (rotate, re-crop, redact). Operates on in-memory images using the `image`
// and `imageproc` crates.

use std::sync::Arc;

use image::{DynamicImage, GrayImage, Rgba};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect as PixelRect;
use scanwerk_core::error::{Result, ScanwerkError};
use scanwerk_core::geometry::{Quadrilateral, Rect, Size};
use scanwerk_core::{Frame, FrameOrientation, ImageOrientation, Page};
use tracing::{debug, info, instrument, warn};

use crate::rectify::Rectifier;
use crate::transform::{EditorViewport, usable_or_default};

/// Image processing pipeline operating on a single in-memory image.
///
/// Each method consumes `self` and returns a new `ImageProcessor` wrapping
/// the transformed image, enabling method chaining.
///
/// ```ignore
/// let page = ImageProcessor::from_dynamic(still)
///     .normalize(ImageOrientation::Right)
///     .rotate_quarter_ccw()
///     .into_dynamic();
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn size(&self) -> Size {
        Size::from_pixels(self.width(), self.height())
    }

    /// Borrow the underlying `DynamicImage`.
    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    /// Consume the processor and return the underlying `DynamicImage`.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    /// Luma plane of the image as a detector frame.
    pub fn to_frame(&self, orientation: FrameOrientation) -> Frame {
        let luma: GrayImage = self.image.to_luma8();
        Frame::new(luma, orientation)
    }

    // -- Transformations (consume self, return new Self) -----------------------

    /// Physically rotate the pixels so the image is upright.
    pub fn normalize(self, orientation: ImageOrientation) -> Self {
        Self {
            image: Self::normalize_orientation(self.image, orientation),
        }
    }

    /// Apply a still's rotation tag to its pixels. `Up` is a no-op.
    pub fn normalize_orientation(image: DynamicImage, orientation: ImageOrientation) -> DynamicImage {
        match orientation {
            ImageOrientation::Up => image,
            ImageOrientation::Down => image.rotate180(),
            ImageOrientation::Right => image.rotate90(),
            ImageOrientation::Left => image.rotate270(),
        }
    }

    /// Rotate a quarter turn counter-clockwise.
    #[instrument(skip(self), fields(width = self.image.width(), height = self.image.height()))]
    pub fn rotate_quarter_ccw(self) -> Self {
        debug!("Rotating image a quarter turn counter-clockwise");
        Self {
            image: self.image.rotate270(),
        }
    }

    /// Paint each rectangle (image pixels, clamped to the bounds) with `colour`.
    #[instrument(skip(self, rects), fields(count = rects.len()))]
    pub fn redact(self, rects: &[Rect], colour: Rgba<u8>) -> Self {
        let mut rgba = self.image.to_rgba8();
        let (w, h) = rgba.dimensions();
        let mut painted = 0usize;

        for rect in rects {
            if let Some(pixels) = clamp_to_image(rect, w, h) {
                draw_filled_rect_mut(&mut rgba, pixels, colour);
                painted += 1;
            }
        }

        info!(painted, "Redaction applied");
        Self {
            image: DynamicImage::ImageRgba8(rgba),
        }
    }
}

/// Integer pixel rectangle for `rect` clipped to a `w`×`h` image, or `None`
/// when nothing of it remains.
fn clamp_to_image(rect: &Rect, w: u32, h: u32) -> Option<PixelRect> {
    let x0 = rect.origin.x.floor().max(0.0);
    let y0 = rect.origin.y.floor().max(0.0);
    let x1 = (rect.origin.x + rect.size.width).ceil().min(f64::from(w));
    let y1 = (rect.origin.y + rect.size.height).ceil().min(f64::from(h));
    if !(x0.is_finite() && y0.is_finite() && x1.is_finite() && y1.is_finite()) {
        return None;
    }
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some(PixelRect::at(x0 as i32, y0 as i32).of_size((x1 - x0) as u32, (y1 - y0) as u32))
}

/// Page-level edits applied to a checked-out copy of a page.
///
/// Every edit sets `is_edited` and leaves `index` and `meta` alone.
#[derive(Clone)]
pub struct PageEditor {
    rectifier: Arc<dyn Rectifier>,
    collinearity_tolerance: f64,
}

impl PageEditor {
    pub fn new(rectifier: Arc<dyn Rectifier>, collinearity_tolerance: f64) -> Self {
        Self {
            rectifier,
            collinearity_tolerance,
        }
    }

    /// Rotate the page's visible image a quarter turn counter-clockwise.
    ///
    /// The rotated image becomes both the raw and the result image, so a
    /// later re-crop starts from the corrected page and the old quad is
    /// dropped.
    #[instrument(skip_all, fields(index = page.index))]
    pub fn rotate(&self, mut page: Page) -> Page {
        let source = page.result_image.take().unwrap_or(page.raw_image);
        let rotated = ImageProcessor::from_dynamic(source).rotate_quarter_ccw().into_dynamic();
        page.raw_image = rotated.clone();
        page.result_image = Some(rotated);
        page.quad = None;
        page.is_edited = true;
        page
    }

    /// Re-rectify the raw image with corners adjusted in the editor.
    ///
    /// Degenerate edits fall back to the default quad. A rectification
    /// failure is returned as an error and the caller keeps the old page.
    #[instrument(skip_all, fields(index = page.index))]
    pub fn recrop(&self, mut page: Page, view_quad: &Quadrilateral, viewport: &EditorViewport) -> Result<Page> {
        let raw_size = Size::from_pixels(page.raw_image.width(), page.raw_image.height());
        if raw_size != viewport.image_size() {
            return Err(ScanwerkError::InvalidFrame(format!(
                "viewport is for a {}x{} image but the page is {}x{}",
                viewport.image_size().width,
                viewport.image_size().height,
                raw_size.width,
                raw_size.height
            )));
        }

        let quad = usable_or_default(&viewport.to_image(view_quad), raw_size, self.collinearity_tolerance);
        let result = self.rectifier.rectify(&page.raw_image, &quad).inspect_err(|err| {
            warn!(%err, "re-crop failed");
        })?;

        page.result_image = Some(result);
        page.quad = Some(quad);
        page.is_edited = true;
        Ok(page)
    }

    /// Paint over regions of the page's visible image.
    ///
    /// The painted image becomes both the raw and the result image, so the
    /// old quad no longer applies.
    #[instrument(skip_all, fields(index = page.index, regions = rects.len()))]
    pub fn redact(&self, mut page: Page, rects: &[Rect], colour: Rgba<u8>) -> Page {
        let source = page.result_image.take().unwrap_or(page.raw_image);
        let painted = ImageProcessor::from_dynamic(source).redact(rects, colour).into_dynamic();
        page.raw_image = painted.clone();
        page.result_image = Some(painted);
        page.quad = None;
        page.is_edited = true;
        page
    }
}
