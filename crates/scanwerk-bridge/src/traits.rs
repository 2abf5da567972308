// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for the capture collaborators.

use scanwerk_core::error::Result;
use scanwerk_core::geometry::Quadrilateral;
use scanwerk_core::{CapturedImage, Frame, Page};

/// Everything a camera platform provides in one object.
pub trait PlatformBridge: FrameSource + StillCapture + OverlayRenderer {
    /// Human-readable platform name (e.g. "iOS 17", "Android 14").
    fn platform_name(&self) -> &str;
}

/// Live camera frames, delivered at the sensor's cadence.
pub trait FrameSource: Send + Sync {
    /// The next frame, or `Ok(None)` once the stream has ended.
    fn next_frame(&self) -> Result<Option<Frame>>;
}

/// Draws the tracked quad over the preview.
///
/// Called once per processed frame from the frame thread; implementations
/// must hop to their UI thread themselves and must not block.
pub trait OverlayRenderer: Send + Sync {
    /// `quad` is in display coordinates; `None` clears the overlay.
    fn on_quad_update(&self, quad: Option<Quadrilateral>);
}

/// One-shot still photo capture.
pub trait StillCapture: Send + Sync {
    /// Take a still. Blocks until the photo is available; the controller
    /// calls it from the blocking pool.
    fn capture_still(&self) -> Result<CapturedImage>;
}

/// Receives the outcome of a capture session.
///
/// Exactly one of `on_session_finished` / `on_session_cancelled` is called per
/// session.
pub trait SessionSink: Send + Sync {
    /// Pages in capture order. In rescan mode this is the single replacement
    /// page, carrying the index of the page it replaces.
    fn on_session_finished(&self, pages: Vec<Page>);

    fn on_session_cancelled(&self);

    /// A page was appended (or, in rescan mode, produced).
    fn on_page_captured(&self, _page: &Page) {}
}
