// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Scanwerk capture pipeline.

use chrono::{DateTime, Utc};
use image::{DynamicImage, GrayImage};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::{Quadrilateral, Size};

/// Unique identifier for a capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a camera sample is mounted relative to the portrait display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FrameOrientation {
    /// Sensor rows run along the long edge of a portrait device (the usual
    /// back-camera mounting); frames must be quarter-turned for display.
    #[default]
    LandscapeSensor,
    /// Frames already match the display orientation.
    Upright,
}

/// Rotation tag carried by a captured still (EXIF-style).
///
/// Raw sensor stills are usually stored unrotated with a tag; the pixels must
/// be physically rotated before any geometry is applied to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ImageOrientation {
    /// Pixels are already upright.
    #[default]
    Up,
    /// Upside down; needs a half turn.
    Down,
    /// Needs a quarter turn clockwise to be upright.
    Right,
    /// Needs a quarter turn counter-clockwise to be upright.
    Left,
}

/// One live camera sample: the luma plane plus its mounting.
///
/// Frames are ephemeral and owned by the pipeline tick that processes them.
#[derive(Debug, Clone)]
pub struct Frame {
    pub luma: GrayImage,
    pub orientation: FrameOrientation,
}

impl Frame {
    pub fn new(luma: GrayImage, orientation: FrameOrientation) -> Self {
        Self { luma, orientation }
    }

    pub fn width(&self) -> u32 {
        self.luma.width()
    }

    pub fn height(&self) -> u32 {
        self.luma.height()
    }

    pub fn size(&self) -> Size {
        Size::from_pixels(self.width(), self.height())
    }
}

/// Result of analysing one frame.
///
/// `quad == None` is the normal "nothing document-like here" answer, not an
/// error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionResult {
    /// The winning quad, in the frame's (sensor) pixel space.
    pub quad: Option<Quadrilateral>,
    /// Size of the frame the quad was detected against.
    pub frame_size: Size,
}

impl DetectionResult {
    pub fn none(frame_size: Size) -> Self {
        Self {
            quad: None,
            frame_size,
        }
    }

    pub fn found(quad: Quadrilateral, frame_size: Size) -> Self {
        Self {
            quad: Some(quad),
            frame_size,
        }
    }
}

/// A still photo as delivered by the capture collaborator.
#[derive(Debug, Clone)]
pub struct CapturedImage {
    pub image: DynamicImage,
    pub orientation: ImageOrientation,
}

impl CapturedImage {
    pub fn new(image: DynamicImage, orientation: ImageOrientation) -> Self {
        Self { image, orientation }
    }

    /// A still whose pixels are already upright.
    pub fn upright(image: DynamicImage) -> Self {
        Self::new(image, ImageOrientation::Up)
    }
}

/// One scanned page.
#[derive(Debug, Clone)]
pub struct Page {
    /// Ordinal position within its session.
    pub index: usize,
    /// The captured still, orientation-normalised.
    pub raw_image: DynamicImage,
    /// Quad used for the most recent crop, in `raw_image` pixel space.
    pub quad: Option<Quadrilateral>,
    /// The corrected image; `None` until correction has produced one.
    pub result_image: Option<DynamicImage>,
    /// Set by downstream edit/crop/rotate operations.
    pub is_edited: bool,
    /// Opaque host annotation carried through every edit.
    pub meta: serde_json::Value,
    pub captured_at: DateTime<Utc>,
}

impl Page {
    /// A freshly captured page with no correction applied yet.
    pub fn new(index: usize, raw_image: DynamicImage) -> Self {
        Self {
            index,
            raw_image,
            quad: None,
            result_image: None,
            is_edited: false,
            meta: serde_json::Value::Null,
            captured_at: Utc::now(),
        }
    }

    /// The best available image: the corrected result, else the raw still.
    pub fn display_image(&self) -> &DynamicImage {
        self.result_image.as_ref().unwrap_or(&self.raw_image)
    }
}

/// Which flow a capture session runs. Fixed for the session's lifetime.
#[derive(Debug, Clone)]
pub enum ScanMode {
    /// Accumulate pages until the user completes the session.
    Scan,
    /// Capture a single replacement for `page`, keeping its index and meta.
    Rescan { page: Page },
}

impl ScanMode {
    pub fn is_rescan(&self) -> bool {
        matches!(self, Self::Rescan { .. })
    }
}

/// Lifecycle states of a capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// Created, not yet started.
    Idle,
    /// Live overlay active, shutter enabled.
    Detecting,
    /// Still image being produced; shutter disabled, overlay frozen.
    Capturing,
    /// Perspective correction in flight.
    Correcting,
    /// Page appended; shown briefly before detection resumes.
    Reviewing,
    /// Terminal: pages delivered.
    Finished,
    /// Terminal: pages discarded.
    Cancelled,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Cancelled)
    }

    /// Whether the shutter control should be enabled.
    pub fn accepts_shutter(&self) -> bool {
        matches!(self, Self::Detecting)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}
