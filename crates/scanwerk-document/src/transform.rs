// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Coordinate transforms between the four spaces a quad passes through:
// sensor pixels (live frames), display points (the preview overlay),
// editor view points (the adjust-corners screen), and image pixels (the
// orientation-normalised still handed to the rectifier).

use std::f64::consts::FRAC_PI_2;

use scanwerk_core::error::{Result, ScanwerkError};
use scanwerk_core::geometry::{AffineTransform, Quadrilateral, Rect, Size};
use scanwerk_core::FrameOrientation;
use tracing::{debug, warn};

/// Maps sensor-space quads onto the preview and back.
///
/// For a landscape-mounted sensor the composition is, in order:
/// aspect-fill scale of the portrait sensor size into the display, a quarter
/// turn, then a translation centring the rotated, scaled sensor bounds on the
/// display. Upright frames skip the quarter turn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayMapping {
    sensor_size: Size,
    display_size: Size,
    rotated: bool,
    transforms: [AffineTransform; 3],
}

impl DisplayMapping {
    /// Mapping for the usual landscape-mounted sensor.
    pub fn new(sensor_size: Size, display_size: Size) -> Result<Self> {
        Self::build(sensor_size, display_size, true)
    }

    /// Mapping chosen by the frame's mounting.
    pub fn for_orientation(
        sensor_size: Size,
        display_size: Size,
        orientation: FrameOrientation,
    ) -> Result<Self> {
        Self::build(
            sensor_size,
            display_size,
            orientation == FrameOrientation::LandscapeSensor,
        )
    }

    fn build(sensor_size: Size, display_size: Size, rotated: bool) -> Result<Self> {
        if sensor_size.is_empty() || display_size.is_empty() {
            return Err(ScanwerkError::InvalidFrame(format!(
                "cannot map {}x{} sensor onto {}x{} display",
                sensor_size.width, sensor_size.height, display_size.width, display_size.height
            )));
        }

        let (fill_from, rotation) = if rotated {
            (sensor_size.transposed(), AffineTransform::rotation(FRAC_PI_2))
        } else {
            (sensor_size, AffineTransform::IDENTITY)
        };
        let scale = AffineTransform::scale_aspect_fill(fill_from, display_size);
        let scaled = sensor_size.applying(&scale);
        let bounds = Rect::from_size(scaled).applying(&rotation);
        let recentre = AffineTransform::translate_centers(&bounds, &Rect::from_size(display_size));

        debug!(
            sensor_w = sensor_size.width,
            sensor_h = sensor_size.height,
            display_w = display_size.width,
            display_h = display_size.height,
            rotated,
            "display mapping built"
        );

        Ok(Self {
            sensor_size,
            display_size,
            rotated,
            transforms: [scale, rotation, recentre],
        })
    }

    pub fn sensor_size(&self) -> Size {
        self.sensor_size
    }

    pub fn display_size(&self) -> Size {
        self.display_size
    }

    /// The elementary transforms in application order.
    pub fn transforms(&self) -> &[AffineTransform; 3] {
        &self.transforms
    }

    /// The composed sensor → display map.
    pub fn composed(&self) -> AffineTransform {
        AffineTransform::chain(&self.transforms)
    }

    /// Sensor quad → overlay quad, with canonical corner roles restored.
    pub fn sensor_to_display(&self, quad: &Quadrilateral) -> Quadrilateral {
        quad.apply_transforms(&self.transforms).reorganize()
    }

    /// Overlay quad → sensor quad.
    pub fn display_to_sensor(&self, quad: &Quadrilateral) -> Result<Quadrilateral> {
        let inverse = self.composed().inverted().ok_or_else(|| {
            ScanwerkError::DegenerateQuad("display mapping is not invertible".into())
        })?;
        Ok(quad.applying(&inverse).reorganize())
    }

    /// Overlay quad → pixel quad in the orientation-normalised still.
    pub fn display_to_image(&self, quad: &Quadrilateral, image_size: Size) -> Result<Quadrilateral> {
        let sensor = self.display_to_sensor(quad)?;
        Ok(sensor_quad_to_image(&sensor, self.sensor_size, image_size, self.rotated))
    }
}

/// Map a sensor-space quad straight into the orientation-normalised still.
///
/// The still is assumed to show the same field of view as the sensor frame.
/// When the two disagree on landscape vs portrait the quad is turned with the
/// same quarter turn the preview uses.
pub fn sensor_to_image(quad: &Quadrilateral, sensor_size: Size, image_size: Size) -> Result<Quadrilateral> {
    if sensor_size.is_empty() || image_size.is_empty() {
        return Err(ScanwerkError::InvalidFrame(
            "sensor and image sizes must be non-empty".into(),
        ));
    }
    let rotated = sensor_size.is_landscape() != image_size.is_landscape();
    Ok(sensor_quad_to_image(quad, sensor_size, image_size, rotated))
}

fn sensor_quad_to_image(
    quad: &Quadrilateral,
    sensor_size: Size,
    image_size: Size,
    rotated: bool,
) -> Quadrilateral {
    let (upright, upright_size) = if rotated {
        // Quarter turn clockwise: sensor (x, y) -> portrait (H - y, x).
        let turn = AffineTransform {
            a: 0.0,
            b: 1.0,
            c: -1.0,
            d: 0.0,
            tx: sensor_size.height,
            ty: 0.0,
        };
        (quad.applying(&turn), sensor_size.transposed())
    } else {
        (*quad, sensor_size)
    };
    upright
        .scaled(
            image_size.width / upright_size.width,
            image_size.height / upright_size.height,
        )
        .reorganize()
}

/// The adjust-corners editor shows the image scaled into `view_size`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EditorViewport {
    view_size: Size,
    image_size: Size,
}

impl EditorViewport {
    pub fn new(view_size: Size, image_size: Size) -> Result<Self> {
        if view_size.is_empty() || image_size.is_empty() {
            return Err(ScanwerkError::InvalidFrame(
                "editor view and image sizes must be non-empty".into(),
            ));
        }
        Ok(Self {
            view_size,
            image_size,
        })
    }

    pub fn image_size(&self) -> Size {
        self.image_size
    }

    /// Edited view quad → image pixels.
    pub fn to_image(&self, quad: &Quadrilateral) -> Quadrilateral {
        quad.scaled(
            self.image_size.width / self.view_size.width,
            self.image_size.height / self.view_size.height,
        )
    }

    /// Image pixels → view points, for seeding the editor.
    pub fn to_view(&self, quad: &Quadrilateral) -> Quadrilateral {
        quad.scaled(
            self.view_size.width / self.image_size.width,
            self.view_size.height / self.image_size.height,
        )
    }

    /// The starting quad for the editor: the stored quad or the default one.
    pub fn initial_view_quad(&self, stored: Option<&Quadrilateral>) -> Quadrilateral {
        let image_quad = stored
            .copied()
            .unwrap_or_else(|| default_quad(self.image_size));
        self.to_view(&image_quad)
    }
}

/// How far, as a fraction of the image's larger side, a corner may sit outside
/// the image before the quad is rejected.
const OUT_OF_BOUNDS_SLACK: f64 = 0.05;

/// The centred 90 % quad used when no detection exists.
pub fn default_quad(image_size: Size) -> Quadrilateral {
    Quadrilateral::default_for(image_size)
}

/// Keep `quad` if it is a usable, convex crop region inside the image;
/// otherwise fall back to the default quad for `image_size`.
pub fn usable_or_default(quad: &Quadrilateral, image_size: Size, tolerance: f64) -> Quadrilateral {
    let quad = quad.reorganize();
    match quad.validate(tolerance) {
        Ok(()) if !within_image(&quad, image_size) => {
            warn!("edited quad leaves the image; using default quad");
            default_quad(image_size)
        }
        Ok(()) if quad.is_convex() => quad,
        Ok(()) => {
            warn!("edited quad is not convex; using default quad");
            default_quad(image_size)
        }
        Err(err) => {
            warn!(%err, "edited quad rejected; using default quad");
            default_quad(image_size)
        }
    }
}

fn within_image(quad: &Quadrilateral, image_size: Size) -> bool {
    let slack = image_size.width.max(image_size.height) * OUT_OF_BOUNDS_SLACK;
    quad.corners().iter().all(|p| {
        (-slack..=image_size.width + slack).contains(&p.x)
            && (-slack..=image_size.height + slack).contains(&p.y)
    })
}

/// Pixel quad → the rectifier's Cartesian (Y-up) convention with canonical
/// corner roles.
pub fn to_engine_space(quad: &Quadrilateral, image_height: f64) -> Quadrilateral {
    quad.to_cartesian(image_height).reorganize()
}
