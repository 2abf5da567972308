// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// scanwerk-bridge — Collaborator contracts between the capture core and the
// host platform.
//
// The core never talks to a camera API or a UI toolkit directly. Frames,
// stills, overlay drawing, and session hand-off all cross this boundary
// through the traits in `traits`.

pub mod stub;
pub mod traits;

pub use traits::{FrameSource, OverlayRenderer, PlatformBridge, SessionSink, StillCapture};

/// Bridge implementation for the current target.
///
/// Desktop and CI builds have no camera, so they get the stub, whose capture
/// methods report `PlatformUnavailable`. Mobile hosts supply their own
/// `PlatformBridge` and pass it to the capture controller directly.
pub fn platform_bridge() -> Box<dyn PlatformBridge> {
    Box::new(stub::StubBridge)
}
