// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanwerk Capture — the live side of the scanner. Tracks detected quads
// across frames, drives the overlay, and runs the capture session (shutter,
// still capture, correction, review) as a Tokio task, plus the page edits
// applied to a finished session.

pub mod controller;
pub mod editing;
pub mod machine;
pub mod pipeline;
pub mod tracker;

pub use controller::{Collaborators, SessionHandle, SessionSnapshot, spawn};
pub use editing::SessionEditor;
pub use machine::{CaptureTicket, RectifyJob, ScanSession, ShutterOutcome, Step};
pub use pipeline::{FrameOutcome, FramePipeline};
pub use tracker::{CornerTracker, TrackedQuad, TrackerUpdate};
