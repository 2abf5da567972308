// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// scanwerk-document — Image-side geometry for the Scanwerk capture pipeline.
//
// Provides quadrilateral detection on live frames, the coordinate transforms
// between sensor, display, editor, and image-pixel space, perspective
// correction of captured stills, and the page image edits (rotate, re-crop,
// redact) used after capture.

pub mod detect;
pub mod image;
pub mod rectify;
pub mod transform;

// Re-export the primary types so callers can use `scanwerk_document::QuadDetector` etc.
pub use detect::{Candidate, HoughRectangleFinder, QuadDetector, RectangleFinder};
pub use self::image::processor::{ImageProcessor, PageEditor};
pub use rectify::{PerspectiveCorrector, Rectifier};
pub use transform::{DisplayMapping, EditorViewport};
