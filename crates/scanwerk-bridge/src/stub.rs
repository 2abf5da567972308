// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub bridge for desktop/CI builds where no camera is available.
//
// Capture methods return `PlatformUnavailable`; overlay updates are logged
// and dropped.

use scanwerk_core::error::{Result, ScanwerkError};
use scanwerk_core::geometry::Quadrilateral;
use scanwerk_core::{CapturedImage, Frame};

use crate::traits::*;

/// No-op bridge returned on platforms without a camera.
pub struct StubBridge;

impl PlatformBridge for StubBridge {
    fn platform_name(&self) -> &str {
        "Desktop (stub)"
    }
}

impl FrameSource for StubBridge {
    fn next_frame(&self) -> Result<Option<Frame>> {
        tracing::warn!("FrameSource::next_frame called on stub bridge");
        Err(ScanwerkError::PlatformUnavailable)
    }
}

impl StillCapture for StubBridge {
    fn capture_still(&self) -> Result<CapturedImage> {
        tracing::warn!("StillCapture::capture_still called on stub bridge");
        Err(ScanwerkError::PlatformUnavailable)
    }
}

impl OverlayRenderer for StubBridge {
    fn on_quad_update(&self, quad: Option<Quadrilateral>) {
        tracing::trace!(visible = quad.is_some(), "overlay update dropped by stub bridge");
    }
}
